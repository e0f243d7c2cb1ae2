//! Cell geometry for the instrument.
//!
//! The numbers here come from the vendor's instrument documentation and have
//! no derivation; add a variant by adding a table row.

use log::debug;
use ndarray::Array1;

use crate::{
    config::InstrumentConfig,
    error::{Error, Result},
};

/// Per-model constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentModel {
    pub make: &'static str,
    pub model: &'static str,

    /// Angle between each beam and the vertical \[degrees\].
    pub beam_angle_deg: f64,
}

pub const CONTINENTAL: InstrumentModel = InstrumentModel {
    make: "Nortek",
    model: "Continental",
    beam_angle_deg: 25.0,
};

/// Head frequency \[kHz\] to the factor turning scaled cell-length counts into
/// metres along the beam.
pub const CELL_LENGTH_FACTORS: &[(u16, f64)] = &[(190, 0.2221), (470, 0.0945)];

/// Raw cell lengths are in 1/256ths of a count.
pub const CELL_LENGTH_DIVISOR: f64 = 256.0;

/// Metres along the beam per blanking-distance count.
pub const BLANKING_FACTOR: f64 = 0.0229;

/// Look up the cell-length factor for a head frequency. An unknown frequency
/// is an error; a zero factor would collapse the distance axis.
pub fn cell_length_factor(frequency_khz: u16) -> Result<f64> {
    CELL_LENGTH_FACTORS
        .iter()
        .find(|(f, _)| *f == frequency_khz)
        .map(|(_, factor)| *factor)
        .ok_or(Error::UnsupportedFrequency(frequency_khz))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// The factor picked from [`CELL_LENGTH_FACTORS`].
    pub frequency_factor: f64,

    /// Vertical cell size \[metres\].
    pub cell_length: f64,

    /// Vertical distance to the near edge of the first cell, less one cell
    /// \[metres\].
    pub cell_start: f64,

    pub beam_angle_deg: f64,
}

impl Calibration {
    pub fn resolve(model: &InstrumentModel, config: &InstrumentConfig) -> Result<Calibration> {
        Calibration::from_raw(
            model,
            config.frequency_khz,
            config.raw_cell_length,
            config.raw_blanking_distance,
        )
    }

    pub fn from_raw(
        model: &InstrumentModel,
        frequency_khz: u16,
        raw_cell_length: u16,
        raw_blanking_distance: u16,
    ) -> Result<Calibration> {
        let frequency_factor = cell_length_factor(frequency_khz)?;
        let cos_beam = model.beam_angle_deg.to_radians().cos();

        let cell_length =
            (f64::from(raw_cell_length) / CELL_LENGTH_DIVISOR) * frequency_factor * cos_beam;
        if cell_length <= 0.0 {
            return Err(Error::ConfigurationInvariant(format!(
                "cell length must be positive (raw value {raw_cell_length})"
            )));
        }
        let cell_start = f64::from(raw_blanking_distance) * BLANKING_FACTOR * cos_beam - cell_length;

        debug!("Cell length factor: {frequency_factor} ({frequency_khz} kHz)");
        debug!("Cell length:        {cell_length:.4} m");
        debug!("Cell start:         {cell_start:.4} m");

        Ok(Calibration {
            frequency_factor,
            cell_length,
            cell_start,
            beam_angle_deg: model.beam_angle_deg,
        })
    }

    /// The distance from the transducers to the middle of each cell
    /// \[metres\].
    pub fn cell_distances(&self, cell_count: usize) -> Array1<f64> {
        Array1::from_shape_fn(cell_count, |i| {
            self.cell_start + i as f64 * self.cell_length + self.cell_length
        })
    }
}
