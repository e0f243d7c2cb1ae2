//! Errors surfaced by the decoder.
//!
//! Decoding is all-or-nothing: every stage bails on the first problem and the
//! error travels to the caller untouched.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::ModelError;

#[derive(Error, Debug)]
pub enum Error {
    /// Structural violation of the vendor binary layout.
    #[error("format error at byte {offset}: {reason}")]
    Format { offset: usize, reason: String },

    /// The head frequency has no entry in the calibration tables.
    #[error("unsupported instrument frequency {0} kHz; no calibration factor is known")]
    UnsupportedFrequency(u16),

    #[error("invalid instrument configuration: {0}")]
    ConfigurationInvariant(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("couldn't read {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn format<S: Into<String>>(offset: usize, reason: S) -> Self {
        Error::Format {
            offset,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
