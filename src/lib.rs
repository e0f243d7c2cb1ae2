//! Decode Nortek Continental ADCP binary files into a [`SampleDataSet`].
//!
//! The pipeline is: frame the file into records ([`read`]), decode the
//! configuration ([`config`]), resolve cell geometry ([`calibration`]),
//! decode each ensemble ([`extract`]), convert to physical units
//! ([`normalize`]) and package everything into the generic model
//! ([`assemble`], [`model`]). Each stage is pure; the file is closed before
//! any decoding happens.

pub mod assemble;
pub mod calibration;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod read;

#[cfg(test)]
mod tests;

use std::path::Path;

use log::info;

pub use calibration::{Calibration, InstrumentModel, CONTINENTAL};
pub use config::InstrumentConfig;
pub use error::{Error, Result};
pub use model::{Dimension, SampleDataSet, StorageType, TypedArray, Variable};
pub use read::{read_records, RawRecord, RecordKind, RecordSet};

/// Decode one Continental file. Any structural problem aborts the whole
/// decode; there is no partial result.
pub fn read_continental<P: AsRef<Path>>(file: P) -> Result<SampleDataSet> {
    let file = file.as_ref();
    let records = read_records(file)?;
    let original_file = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    decode(records, &CONTINENTAL, &original_file)
}

/// Decode already-framed records.
pub fn decode(
    records: RecordSet,
    model: &InstrumentModel,
    original_file: &str,
) -> Result<SampleDataSet> {
    let config = InstrumentConfig::from_records(&records.hardware, &records.head, &records.user)?;
    let calibration = Calibration::resolve(model, &config)?;

    let raw = extract::extract(&records.data, config.cell_count)?;
    let physical = normalize::normalize(raw);
    let data_set = assemble::assemble(physical, &config, model, &calibration, original_file)?;

    info!(
        "Decoded {} ensembles of {} cells from {} ({} {}, serial {})",
        records.data.len(),
        config.cell_count,
        if original_file.is_empty() {
            "<unnamed>"
        } else {
            original_file
        },
        model.make,
        model.model,
        config.serial_no
    );
    Ok(data_set)
}
