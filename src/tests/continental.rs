use hifitime::Duration;

use super::toolkit::*;
use crate::{
    calibration::CELL_LENGTH_FACTORS, read_continental, Error, SampleDataSet, StorageType,
};

const VARIABLES: [&str; 12] = [
    "VCUR", "UCUR", "WCUR", "ABSI1", "ABSI2", "ABSI3", "TEMP", "PRES_REL", "VOLT", "PITCH",
    "ROLL", "HEADING",
];

fn decode(
    frequency_khz: u16,
    cell_count: u16,
    ensembles: &[Ensemble],
) -> Result<SampleDataSet, Error> {
    let file = write_temp_file(&continental_file(frequency_khz, cell_count, ensembles));
    read_continental(file.path())
}

/// A variable's values in row-major order.
fn values(ds: &SampleDataSet, name: &str) -> Vec<f64> {
    ds.variable(name)
        .unwrap_or_else(|| panic!("no variable {name}"))
        .data()
        .to_f64()
        .iter()
        .copied()
        .collect()
}

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

#[test]
fn end_to_end() {
    let ensembles = regular_ensembles(3, 2, Duration::from_seconds(60.0));
    let ds = decode(190, 2, &ensembles).unwrap();

    assert_eq!(ds.dimension("TIME").unwrap().len(), 3);
    assert_eq!(ds.dimension("HEIGHT_ABOVE_SENSOR").unwrap().len(), 2);
    assert_eq!(ds.dimension("LATITUDE").unwrap().len(), 1);
    assert_eq!(ds.dimension("LONGITUDE").unwrap().len(), 1);
    assert!(ds.dimension("LATITUDE").unwrap().values()[0].is_nan());
    assert!(ds.dimension("LONGITUDE").unwrap().values()[0].is_nan());

    let names: Vec<&str> = ds.variables().iter().map(|v| v.name()).collect();
    assert_eq!(names, VARIABLES);

    for name in &VARIABLES[..6] {
        let v = ds.variable(name).unwrap();
        assert_eq!(v.shape(), &[3, 2, 1, 1], "{name}");
        assert_eq!(
            v.dimensions(),
            &["TIME", "HEIGHT_ABOVE_SENSOR", "LATITUDE", "LONGITUDE"],
            "{name}"
        );
    }
    for name in &VARIABLES[6..] {
        let v = ds.variable(name).unwrap();
        assert_eq!(v.shape(), &[3, 1, 1], "{name}");
        assert_eq!(v.dimensions(), &["TIME", "LATITUDE", "LONGITUDE"], "{name}");
    }
}

#[test]
fn metadata() {
    let ensembles = regular_ensembles(3, 2, Duration::from_seconds(60.0));
    let file = write_temp_file(&continental_file(190, 2, &ensembles));
    let ds = read_continental(file.path()).unwrap();
    let m = &ds.meta;
    assert_eq!(m.instrument_make, "Nortek");
    assert_eq!(m.instrument_model, "Continental");
    assert_eq!(m.instrument_serial_no, "CNL 1234");
    assert_eq!(m.instrument_firmware, "3.37");
    assert_eq!(m.instrument_sample_interval, Some(Duration::from_seconds(60.0)));
    assert_eq!(m.beam_angle, 25.0);
    assert_eq!(m.feature_type, "timeSeriesProfile");
    assert_eq!(m.coordinate_system, "ENU");
    assert_eq!(
        m.original_file,
        file.path().file_name().unwrap().to_string_lossy()
    );

    let expected_bin = 10.0 * 0.2221 * 25.0_f64.to_radians().cos();
    assert!(close(m.bin_size, expected_bin, 1e-12));
}

#[test]
fn height_above_sensor_is_an_arithmetic_progression() {
    for (frequency, _) in CELL_LENGTH_FACTORS {
        let ensembles = regular_ensembles(2, 7, Duration::from_seconds(60.0));
        let ds = decode(*frequency, 7, &ensembles).unwrap();
        let height = ds.dimension("HEIGHT_ABOVE_SENSOR").unwrap();
        assert_eq!(height.storage_type(), StorageType::Float32);
        let h = height.values();
        assert_eq!(h.len(), 7);

        let bin = ds.meta.bin_size;
        assert!(bin > 0.0);
        let cos25 = 25.0_f64.to_radians().cos();
        // The first centre sits at the blanking distance.
        assert!(close(h[0], 100.0 * 0.0229 * cos25, 1e-5));
        for w in h.windows(2) {
            assert!(w[1] > w[0]);
            assert!(close(w[1] - w[0], bin, 1e-5));
        }
    }
}

#[test]
fn velocity_components_are_relabelled() {
    let mut ensembles = regular_ensembles(1, 2, Duration::from_seconds(60.0));
    ensembles[0].velocity = [vec![1000, 1000], vec![2000, 2000], vec![3000, 3000]];
    let ds = decode(190, 2, &ensembles).unwrap();
    assert_eq!(values(&ds, "VCUR"), [2.0, 2.0]);
    assert_eq!(values(&ds, "UCUR"), [1.0, 1.0]);
    assert_eq!(values(&ds, "WCUR"), [3.0, 3.0]);
}

#[test]
fn profiles_are_time_major() {
    let mut ensembles = regular_ensembles(2, 3, Duration::from_seconds(60.0));
    ensembles[0].amplitude[0] = vec![10, 20, 30];
    ensembles[1].amplitude[0] = vec![40, 50, 60];
    let ds = decode(190, 3, &ensembles).unwrap();
    let absi1 = values(&ds, "ABSI1");
    let expected = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0].map(|c| c * 0.45);
    for (a, e) in absi1.iter().zip(expected) {
        assert!(close(*a, e, 1e-5), "{absi1:?}");
    }
}

#[test]
fn pressure_is_reconstructed_from_both_fields() {
    let mut ensembles = regular_ensembles(1, 2, Duration::from_seconds(60.0));
    ensembles[0].pressure_msb = 1;
    ensembles[0].pressure_lsw = 500;
    let ds = decode(190, 2, &ensembles).unwrap();
    let pres = values(&ds, "PRES_REL");
    assert!(close(pres[0], 66.036, 1e-4), "{pres:?}");
}

#[test]
fn units_are_converted_exactly_once() {
    let mut ensembles = regular_ensembles(1, 1, Duration::from_seconds(60.0));
    let e = &mut ensembles[0];
    e.battery = 125;
    e.heading = 2705;
    e.pitch = -32;
    e.roll = 41;
    e.temperature = 1875;
    e.velocity = [vec![-500], vec![250], vec![10]];
    e.amplitude = [vec![100], vec![0], vec![255]];
    let ds = decode(470, 1, &ensembles).unwrap();

    for (name, expected) in [
        ("VOLT", 12.5),
        ("HEADING", 270.5),
        ("PITCH", -3.2),
        ("ROLL", 4.1),
        ("TEMP", 18.75),
        ("PRES_REL", 10.0),
        ("UCUR", -0.5),
        ("VCUR", 0.25),
        ("WCUR", 0.01),
        ("ABSI1", 45.0),
        ("ABSI2", 0.0),
        ("ABSI3", 114.75),
    ] {
        let v = values(&ds, name);
        assert!(close(v[0], expected, 1e-4), "{name}: {v:?} != {expected}");
    }
}

#[test]
fn storage_types_and_attributes() {
    let ds = decode(190, 2, &regular_ensembles(2, 2, Duration::from_seconds(60.0))).unwrap();
    assert_eq!(ds.dimension("TIME").unwrap().storage_type(), StorageType::Float64);
    assert_eq!(ds.variable("VCUR").unwrap().storage_type(), StorageType::Float32);
    assert_eq!(ds.variable("TEMP").unwrap().units.as_deref(), Some("degrees_Celsius"));

    let height = ds.dimension("HEIGHT_ABOVE_SENSOR").unwrap();
    assert!(height.comment.as_deref().unwrap().contains("centre of each cell"));
    let pres = ds.variable("PRES_REL").unwrap();
    assert_eq!(pres.units.as_deref(), Some("dbar"));
    assert!(pres.comment.as_deref().unwrap().contains("decibars"));
}

#[test]
fn time_axis() {
    let ds = decode(190, 2, &regular_ensembles(3, 2, Duration::from_seconds(3600.0))).unwrap();
    let time = ds.dimension("TIME").unwrap().values();
    // 2012-03-04 05:06:00 UTC.
    let first = 22708.0 + (5.0 * 3600.0 + 6.0 * 60.0) / 86400.0;
    assert!(close(time[0], first, 1e-9), "{time:?}");
    assert!(close(time[1] - time[0], 1.0 / 24.0, 1e-9));
    assert!(close(time[2] - time[1], 1.0 / 24.0, 1e-9));
}

#[test]
fn sample_interval_is_the_median() {
    // 10 minute sampling, one duplicated ensemble and one dropped.
    let mut ensembles = regular_ensembles(8, 2, Duration::from_seconds(600.0));
    let duplicate = ensembles[2].clone();
    ensembles.insert(3, duplicate);
    ensembles.remove(6);
    let ds = decode(190, 2, &ensembles).unwrap();
    assert_eq!(
        ds.meta.instrument_sample_interval,
        Some(Duration::from_seconds(600.0))
    );
    assert_eq!(ds.dimension("TIME").unwrap().len(), 8);
}

#[test]
fn single_ensemble_has_no_sample_interval() {
    let ds = decode(190, 2, &regular_ensembles(1, 2, Duration::from_seconds(60.0))).unwrap();
    assert_eq!(ds.meta.instrument_sample_interval, None);
    assert_eq!(ds.dimension("TIME").unwrap().len(), 1);
}

#[test]
fn unsupported_frequency() {
    let ensembles = regular_ensembles(2, 2, Duration::from_seconds(60.0));
    assert!(matches!(
        decode(1000, 2, &ensembles),
        Err(Error::UnsupportedFrequency(1000))
    ));
}

#[test]
fn zero_cells() {
    let ensembles = regular_ensembles(2, 0, Duration::from_seconds(60.0));
    assert!(matches!(
        decode(190, 0, &ensembles),
        Err(Error::ConfigurationInvariant(_))
    ));
}

#[test]
fn data_records_shorter_than_the_cell_count() {
    // The user configuration claims 4 cells, the record only holds 2.
    let ensembles = regular_ensembles(1, 2, Duration::from_seconds(60.0));
    match decode(190, 4, &ensembles) {
        Err(Error::Format { offset, .. }) => assert_eq!(offset, 784),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn truncated_file() {
    let ensembles = regular_ensembles(3, 2, Duration::from_seconds(60.0));
    let mut buf = continental_file(190, 2, &ensembles);
    buf.truncate(buf.len() - 10);
    let file = write_temp_file(&buf);
    match read_continental(file.path()) {
        Err(Error::Format { offset, .. }) => assert_eq!(offset, 884),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn aquadopp_profiler_records_share_the_layout() {
    let mut ensembles = regular_ensembles(2, 2, Duration::from_seconds(60.0));
    for e in ensembles.iter_mut() {
        e.id = 0x21;
        e.velocity[2] = vec![-1500, 1500];
    }
    let ds = decode(190, 2, &ensembles).unwrap();
    assert_eq!(values(&ds, "WCUR"), [-1.5, 1.5, -1.5, 1.5]);
}
