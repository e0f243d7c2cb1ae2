//! Per-ensemble decoding of data records.

use hifitime::Epoch;
use log::{debug, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use vec1::Vec1;

use crate::{
    config::NUM_BEAMS,
    error::{Error, Result},
    read::{bytes::Fields, RawRecord},
};

/// Byte offset of the first velocity value in a data record.
const PROFILE_OFFSET: usize = 30;

/// Weight of the pressure MSB byte; pressure is a 24-bit count split into an
/// 8-bit high part and a 16-bit low word.
pub const PRESSURE_MSB_WEIGHT: u32 = 65536;

/// The number of bytes a data record needs to hold `cell_count` cells: the
/// fixed leader, 3 velocity (i16) and 3 amplitude (u8) profiles, a fill byte
/// to keep the size even, and the checksum.
pub fn data_record_len(cell_count: usize) -> usize {
    let profiles = NUM_BEAMS * cell_count * 3;
    PROFILE_OFFSET + profiles + profiles % 2 + 2
}

/// Pressure in millimetres from its two sub-fields.
pub fn compose_pressure(msb: u8, lsw: u16) -> u32 {
    u32::from(msb) * PRESSURE_MSB_WEIGHT + u32::from(lsw)
}

/// One decoded ensemble, still in instrument units.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub time: Epoch,
    pub error: i16,
    pub analog_in1: u16,
    /// 0.1 V.
    pub battery: u16,
    /// Sound speed or the second analog input, depending on configuration.
    pub analog_in2: u16,
    /// 0.1 degrees.
    pub heading: i16,
    pub pitch: i16,
    pub roll: i16,
    /// Millimetres.
    pub pressure: u32,
    pub status: u8,
    /// 0.01 degrees Celsius.
    pub temperature: i16,
    /// mm/s, one profile per velocity channel.
    pub velocity: [Vec<i16>; NUM_BEAMS],
    /// Counts, one profile per beam.
    pub amplitude: [Vec<u8>; NUM_BEAMS],
}

impl SampleRecord {
    pub fn decode(record: &RawRecord, cell_count: usize) -> Result<SampleRecord> {
        let expected = data_record_len(cell_count);
        if record.len() < expected {
            return Err(Error::format(
                record.offset,
                format!(
                    "{:?} record is {} bytes, {cell_count} cells need {expected}",
                    record.kind,
                    record.len()
                ),
            ));
        }

        let f = Fields::new(record);
        let velocity_at = |beam: usize| PROFILE_OFFSET + beam * cell_count * 2;
        let amplitude_at =
            |beam: usize| PROFILE_OFFSET + NUM_BEAMS * cell_count * 2 + beam * cell_count;

        Ok(SampleRecord {
            time: f.clock(4)?,
            error: f.i16(10)?,
            analog_in1: f.u16(12)?,
            battery: f.u16(14)?,
            analog_in2: f.u16(16)?,
            heading: f.i16(18)?,
            pitch: f.i16(20)?,
            roll: f.i16(22)?,
            pressure: compose_pressure(f.u8(24)?, f.u16(26)?),
            status: f.u8(25)?,
            temperature: f.i16(28)?,
            velocity: [
                f.i16_array(velocity_at(0), cell_count)?,
                f.i16_array(velocity_at(1), cell_count)?,
                f.i16_array(velocity_at(2), cell_count)?,
            ],
            amplitude: [
                f.u8_array(amplitude_at(0), cell_count)?,
                f.u8_array(amplitude_at(1), cell_count)?,
                f.u8_array(amplitude_at(2), cell_count)?,
            ],
        })
    }
}

/// Per-sample arrays gathered from every ensemble, in instrument units.
/// Profiles are `[time][cell]`.
#[derive(Debug, Clone)]
pub struct RawSeries {
    pub time: Vec1<Epoch>,
    pub battery: Array1<f64>,
    pub heading: Array1<f64>,
    pub pitch: Array1<f64>,
    pub roll: Array1<f64>,
    pub pressure: Array1<f64>,
    pub temperature: Array1<f64>,
    pub velocity: [Array2<f64>; NUM_BEAMS],
    pub amplitude: [Array2<f64>; NUM_BEAMS],
}

impl RawSeries {
    pub fn num_samples(&self) -> usize {
        self.time.len()
    }

    pub fn cell_count(&self) -> usize {
        self.velocity[0].len_of(Axis(1))
    }

    fn from_samples(samples: Vec1<SampleRecord>, cell_count: usize) -> RawSeries {
        let n = samples.len();
        let scalar = |get: fn(&SampleRecord) -> f64| -> Array1<f64> {
            samples.iter().map(get).collect()
        };
        let mut velocity = [(); NUM_BEAMS].map(|_| Array2::zeros((n, cell_count)));
        let mut amplitude = [(); NUM_BEAMS].map(|_| Array2::zeros((n, cell_count)));
        for (i_sample, s) in samples.iter().enumerate() {
            for beam in 0..NUM_BEAMS {
                velocity[beam]
                    .row_mut(i_sample)
                    .iter_mut()
                    .zip(&s.velocity[beam])
                    .for_each(|(out, &v)| *out = f64::from(v));
                amplitude[beam]
                    .row_mut(i_sample)
                    .iter_mut()
                    .zip(&s.amplitude[beam])
                    .for_each(|(out, &a)| *out = f64::from(a));
            }
        }

        RawSeries {
            battery: scalar(|s| f64::from(s.battery)),
            heading: scalar(|s| f64::from(s.heading)),
            pitch: scalar(|s| f64::from(s.pitch)),
            roll: scalar(|s| f64::from(s.roll)),
            pressure: scalar(|s| f64::from(s.pressure)),
            temperature: scalar(|s| f64::from(s.temperature)),
            velocity,
            amplitude,
            time: samples.mapped(|s| s.time),
        }
    }
}

/// Decode every data record, keeping file order. If several records are bad,
/// the error is the one for the record nearest the start of the file.
pub fn extract(records: &Vec1<RawRecord>, cell_count: usize) -> Result<RawSeries> {
    let mut samples = Vec1::with_capacity(
        SampleRecord::decode(records.first(), cell_count)?,
        records.len(),
    );
    // Collecting straight into a `Result` would return whichever error a
    // worker hit first.
    let rest: Vec<Result<SampleRecord>> = records.as_slice()[1..]
        .par_iter()
        .map(|r| SampleRecord::decode(r, cell_count))
        .collect();
    for sample in rest {
        samples.push(sample?);
    }

    let mut num_out_of_order = 0;
    for (i, w) in samples.windows(2).enumerate() {
        if w[1].time <= w[0].time {
            num_out_of_order += 1;
            debug!(
                "Ensemble {} ({}) does not follow ensemble {i} ({})",
                i + 1,
                w[1].time,
                w[0].time
            );
        }
    }
    if num_out_of_order > 0 {
        warn!("{num_out_of_order} ensembles are duplicated or out of order; keeping file order");
    }

    debug!("Extracted {} ensembles of {cell_count} cells", samples.len());
    Ok(RawSeries::from_samples(samples, cell_count))
}
