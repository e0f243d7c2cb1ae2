//! Instrument counts to physical units.

use hifitime::Epoch;
use ndarray::prelude::*;
use vec1::Vec1;

use crate::{config::NUM_BEAMS, extract::RawSeries};

/// Battery is reported in 0.1 V; heading, pitch and roll in 0.1 degrees.
pub const TENTHS_PER_UNIT: f64 = 10.0;

/// Pressure is reported in millimetres. Dividing gives metres, which are
/// taken to be equivalent to decibars. This is an approximation, not a
/// physical identity.
pub const PRESSURE_MM_PER_M: f64 = 1000.0;

/// Temperature is reported in 0.01 degrees Celsius.
pub const TEMPERATURE_HUNDREDTHS_PER_DEGREE: f64 = 100.0;

/// Velocities are reported in mm/s.
pub const VELOCITY_MM_PER_M: f64 = 1000.0;

/// Amplitude counts to decibels.
pub const AMPLITUDE_DB_PER_COUNT: f64 = 0.45;

/// [`RawSeries`] after unit conversion. Only [`normalize`] builds one, so
/// every array in here has been scaled exactly once.
#[derive(Debug, Clone)]
pub struct PhysicalSeries {
    pub time: Vec1<Epoch>,
    /// \[V\]
    pub battery: Array1<f64>,
    /// \[degrees\]
    pub heading: Array1<f64>,
    pub pitch: Array1<f64>,
    pub roll: Array1<f64>,
    /// \[m\], treated as dbar.
    pub pressure: Array1<f64>,
    /// \[degrees Celsius\]
    pub temperature: Array1<f64>,
    /// \[m/s\], `[time][cell]`, in raw channel order.
    pub velocity: [Array2<f64>; NUM_BEAMS],
    /// \[dB\], `[time][cell]`.
    pub amplitude: [Array2<f64>; NUM_BEAMS],

    _normalized: (),
}

impl PhysicalSeries {
    pub fn num_samples(&self) -> usize {
        self.time.len()
    }

    pub fn cell_count(&self) -> usize {
        self.velocity[0].len_of(Axis(1))
    }
}

/// Apply the fixed conversion factors element-wise. NaN stays NaN; nothing
/// is clamped or rounded.
pub fn normalize(raw: RawSeries) -> PhysicalSeries {
    let RawSeries {
        time,
        battery,
        heading,
        pitch,
        roll,
        pressure,
        temperature,
        mut velocity,
        mut amplitude,
    } = raw;

    for v in velocity.iter_mut() {
        v.par_mapv_inplace(|x| x / VELOCITY_MM_PER_M);
    }
    for a in amplitude.iter_mut() {
        a.par_mapv_inplace(|x| x * AMPLITUDE_DB_PER_COUNT);
    }

    PhysicalSeries {
        time,
        battery: battery.mapv_into(|x| x / TENTHS_PER_UNIT),
        heading: heading.mapv_into(|x| x / TENTHS_PER_UNIT),
        pitch: pitch.mapv_into(|x| x / TENTHS_PER_UNIT),
        roll: roll.mapv_into(|x| x / TENTHS_PER_UNIT),
        pressure: pressure.mapv_into(|x| x / PRESSURE_MM_PER_M),
        temperature: temperature.mapv_into(|x| x / TEMPERATURE_HUNDREDTHS_PER_DEGREE),
        velocity,
        amplitude,
        _normalized: (),
    }
}
