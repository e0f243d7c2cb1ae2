//! Instrument configuration decoded from the hardware, head and user
//! configuration records.

use std::fmt;

use hifitime::{Duration, Epoch};
use log::{debug, warn};

use crate::{
    error::{Error, Result},
    read::{bytes::Fields, RawRecord, RecordKind},
};

/// Beams on a Continental head. The data record layout assumes exactly this
/// many velocity and amplitude channels.
pub const NUM_BEAMS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// East, north, up.
    Enu,
    Xyz,
    Beam,
    Unknown(u16),
}

impl From<u16> for CoordinateSystem {
    fn from(v: u16) -> Self {
        match v {
            0 => CoordinateSystem::Enu,
            1 => CoordinateSystem::Xyz,
            2 => CoordinateSystem::Beam,
            v => CoordinateSystem::Unknown(v),
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateSystem::Enu => write!(f, "ENU"),
            CoordinateSystem::Xyz => write!(f, "XYZ"),
            CoordinateSystem::Beam => write!(f, "BEAM"),
            CoordinateSystem::Unknown(v) => write!(f, "unknown ({v})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentConfig {
    // Hardware configuration.
    pub serial_no: String,
    pub firmware: String,
    pub hardware_frequency_khz: u16,
    pub hardware_revision: u16,

    // Head configuration.
    /// The acoustic frequency \[kHz\]. This keys the calibration tables.
    pub frequency_khz: u16,
    pub head_serial_no: String,
    pub head_type: u16,

    // User configuration.
    pub num_beams: usize,
    pub coordinate_system: CoordinateSystem,

    /// The number of depth cells in every data record.
    pub cell_count: usize,

    /// The cell length in instrument counts; see
    /// [`crate::calibration::Calibration::resolve`].
    pub raw_cell_length: u16,

    /// The blanking distance (T2) in instrument counts.
    pub raw_blanking_distance: u16,

    pub transmit_pulse_length: u16,
    pub pings_per_ensemble: u16,
    pub average_interval: Duration,

    /// The configured time between ensembles.
    pub measurement_interval: Duration,

    pub deployment_name: String,

    /// `None` when the instrument clock field was left zeroed.
    pub deployment_start: Option<Epoch>,
}

impl InstrumentConfig {
    pub fn from_records(
        hardware: &RawRecord,
        head: &RawRecord,
        user: &RawRecord,
    ) -> Result<InstrumentConfig> {
        for (record, kind) in [
            (hardware, RecordKind::HardwareConfiguration),
            (head, RecordKind::HeadConfiguration),
            (user, RecordKind::UserConfiguration),
        ] {
            if record.kind != kind {
                return Err(Error::format(
                    record.offset,
                    format!("expected {kind:?} record, found {:?}", record.kind),
                ));
            }
        }

        let hw = Fields::new(hardware);
        let hd = Fields::new(head);
        let us = Fields::new(user);

        let deployment_start = if user.bytes().get(48..54) == Some(&[0; 6][..]) {
            None
        } else {
            Some(us.clock(48)?)
        };

        let config = InstrumentConfig {
            serial_no: hw.ascii(4, 14)?,
            hardware_frequency_khz: hw.u16(20)?,
            hardware_revision: hw.u16(24)?,
            firmware: hw.ascii(42, 4)?,

            frequency_khz: hd.u16(6)?,
            head_type: hd.u16(8)?,
            head_serial_no: hd.ascii(10, 12)?,

            transmit_pulse_length: us.u16(4)?,
            raw_blanking_distance: us.u16(6)?,
            pings_per_ensemble: us.u16(14)?,
            average_interval: Duration::from_seconds(f64::from(us.u16(16)?)),
            num_beams: usize::from(us.u16(18)?),
            coordinate_system: us.u16(32)?.into(),
            cell_count: usize::from(us.u16(34)?),
            raw_cell_length: us.u16(36)?,
            measurement_interval: Duration::from_seconds(f64::from(us.u16(38)?)),
            deployment_name: us.ascii(40, 6)?,
            deployment_start,
        };
        config.validate()?;

        debug!("Serial number:        {}", config.serial_no);
        debug!("Firmware:             {}", config.firmware);
        debug!("Head frequency:       {} kHz", config.frequency_khz);
        debug!("Cells:                {}", config.cell_count);
        debug!("Cell length:          {} counts", config.raw_cell_length);
        debug!("Blanking distance:    {} counts", config.raw_blanking_distance);
        debug!("Measurement interval: {}", config.measurement_interval);
        if config.coordinate_system != CoordinateSystem::Enu {
            warn!(
                "Velocities are in {} coordinates but will be labelled as earth-frame components",
                config.coordinate_system
            );
        }

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cell_count == 0 {
            return Err(Error::ConfigurationInvariant(
                "cell count must be positive".to_string(),
            ));
        }
        if self.num_beams != NUM_BEAMS {
            return Err(Error::ConfigurationInvariant(format!(
                "expected {NUM_BEAMS} beams, the user configuration has {}",
                self.num_beams
            )));
        }
        Ok(())
    }
}
