//! Packaging normalised arrays into a [`SampleDataSet`].

use hifitime::{Duration, Epoch, SECONDS_PER_DAY};
use itertools::Itertools;
use log::debug;
use ndarray::prelude::*;

use crate::{
    calibration::{Calibration, InstrumentModel},
    config::InstrumentConfig,
    error::Result,
    model::{
        params::{self, Parameter},
        Dimension, Metadata, SampleDataSet, TypedArray, Variable,
    },
    normalize::PhysicalSeries,
};

pub const FEATURE_TYPE: &str = "timeSeriesProfile";

/// Dimensions of per-cell variables.
pub const PROFILE_DIMENSIONS: [&str; 4] = ["TIME", "HEIGHT_ABOVE_SENSOR", "LATITUDE", "LONGITUDE"];

/// Dimensions of once-per-ensemble variables.
pub const SCALAR_DIMENSIONS: [&str; 3] = ["TIME", "LATITUDE", "LONGITUDE"];

/// Output velocity components and the raw channel each is read from. The
/// first two channels are swapped for this instrument family.
pub const VELOCITY_CHANNELS: [(Parameter, usize); 3] =
    [(params::VCUR, 1), (params::UCUR, 0), (params::WCUR, 2)];

pub const AMPLITUDE_CHANNELS: [(Parameter, usize); 3] =
    [(params::ABSI1, 0), (params::ABSI2, 1), (params::ABSI3, 2)];

/// The instrument doesn't know where it is.
pub const UNKNOWN_POSITION: f64 = f64::NAN;

const HEIGHT_ABOVE_SENSOR_COMMENT: &str = "Values correspond to the distance between the \
    instrument's transducers and the centre of each cell. Data is not vertically bin-mapped \
    (no tilt correction applied). Cells are lying parallel to the beams, at heights above \
    sensor that vary with tilt.";

const PRES_REL_COMMENT: &str = "Pressure reported in millimetres, divided by 1000 and \
    assumed equivalent to decibars. Not a verified physical identity.";

/// Days since 1950-01-01 00:00:00 UTC, the TIME axis convention. Leap
/// seconds are not counted.
pub fn days_since_1950(epoch: Epoch) -> f64 {
    let reference = Epoch::from_gregorian_utc_at_midnight(1950, 1, 1);
    (epoch.to_utc_seconds() - reference.to_utc_seconds()) / SECONDS_PER_DAY
}

/// The median of consecutive timestamp differences. Dropped or duplicated
/// ensembles barely move it, unlike the mean. `None` for fewer than two
/// timestamps.
pub fn median_sample_interval(times: &[Epoch]) -> Option<Duration> {
    let diffs = times
        .windows(2)
        .map(|w| (w[1] - w[0]).to_seconds())
        .sorted_by(|a, b| a.total_cmp(b))
        .collect_vec();
    let mid = diffs.len() / 2;
    let median = match diffs.len() {
        0 => return None,
        n if n % 2 == 1 => diffs[mid],
        _ => (diffs[mid - 1] + diffs[mid]) / 2.0,
    };
    Some(Duration::from_seconds(median))
}

fn dimension(param: &Parameter, values: Array1<f64>) -> Result<Dimension> {
    let mut d = Dimension::new(
        param.name,
        TypedArray::from_f64(param.storage, values.into_dyn()),
    )?;
    d.long_name = Some(param.long_name.to_string());
    d.units = Some(param.units.to_string());
    Ok(d)
}

fn variable(param: &Parameter, dimensions: &[&str], values: ArrayD<f64>) -> Variable {
    let mut v = Variable::new(
        param.name,
        dimensions,
        TypedArray::from_f64(param.storage, values),
    );
    v.long_name = Some(param.long_name.to_string());
    v.units = Some(param.units.to_string());
    v
}

/// `[time][cell]` to `[time][cell][lat][lon]`.
fn profile(values: Array2<f64>) -> ArrayD<f64> {
    values
        .insert_axis(Axis(2))
        .insert_axis(Axis(3))
        .into_dyn()
}

/// `[time]` to `[time][lat][lon]`.
fn scalar(values: Array1<f64>) -> ArrayD<f64> {
    values
        .insert_axis(Axis(1))
        .insert_axis(Axis(2))
        .into_dyn()
}

/// Build the data set for one decoded file.
pub fn assemble(
    series: PhysicalSeries,
    config: &InstrumentConfig,
    model: &InstrumentModel,
    calibration: &Calibration,
    original_file: &str,
) -> Result<SampleDataSet> {
    let instrument_sample_interval = median_sample_interval(&series.time);
    match instrument_sample_interval {
        Some(i) => debug!("Sample interval: {i}"),
        None => debug!("Only one ensemble; no sample interval"),
    }

    let mut data_set = SampleDataSet::new(Metadata {
        instrument_make: model.make.to_string(),
        instrument_model: model.model.to_string(),
        instrument_serial_no: config.serial_no.clone(),
        instrument_firmware: config.firmware.clone(),
        instrument_sample_interval,
        beam_angle: calibration.beam_angle_deg,
        bin_size: calibration.cell_length,
        feature_type: FEATURE_TYPE.to_string(),
        coordinate_system: config.coordinate_system.to_string(),
        original_file: original_file.to_string(),
    });

    let time: Array1<f64> = series.time.iter().map(|&t| days_since_1950(t)).collect();
    data_set.add_dimension(dimension(&params::TIME, time)?)?;

    let mut height = dimension(
        &params::HEIGHT_ABOVE_SENSOR,
        calibration.cell_distances(series.cell_count()),
    )?;
    height.comment = Some(HEIGHT_ABOVE_SENSOR_COMMENT.to_string());
    data_set.add_dimension(height)?;

    data_set.add_dimension(dimension(&params::LATITUDE, arr1(&[UNKNOWN_POSITION]))?)?;
    data_set.add_dimension(dimension(&params::LONGITUDE, arr1(&[UNKNOWN_POSITION]))?)?;

    let PhysicalSeries {
        battery,
        heading,
        pitch,
        roll,
        pressure,
        temperature,
        velocity,
        amplitude,
        ..
    } = series;

    for (param, channel) in VELOCITY_CHANNELS {
        let mut v = variable(&param, &PROFILE_DIMENSIONS, profile(velocity[channel].clone()));
        v.comment = Some(format!("From raw velocity channel {}.", channel + 1));
        data_set.add_variable(v)?;
    }
    for (param, channel) in AMPLITUDE_CHANNELS {
        data_set.add_variable(variable(
            &param,
            &PROFILE_DIMENSIONS,
            profile(amplitude[channel].clone()),
        ))?;
    }

    data_set.add_variable(variable(&params::TEMP, &SCALAR_DIMENSIONS, scalar(temperature)))?;
    let mut pres_rel = variable(&params::PRES_REL, &SCALAR_DIMENSIONS, scalar(pressure));
    pres_rel.comment = Some(PRES_REL_COMMENT.to_string());
    data_set.add_variable(pres_rel)?;
    data_set.add_variable(variable(&params::VOLT, &SCALAR_DIMENSIONS, scalar(battery)))?;
    data_set.add_variable(variable(&params::PITCH, &SCALAR_DIMENSIONS, scalar(pitch)))?;
    data_set.add_variable(variable(&params::ROLL, &SCALAR_DIMENSIONS, scalar(roll)))?;
    data_set.add_variable(variable(&params::HEADING, &SCALAR_DIMENSIONS, scalar(heading)))?;

    debug!(
        "Assembled {} dimensions and {} variables",
        data_set.dimensions().len(),
        data_set.variables().len()
    );
    Ok(data_set)
}
