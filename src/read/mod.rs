pub(crate) mod bytes;
pub mod paradopp;

use std::path::Path;

use log::debug;
use vec1::Vec1;

pub use paradopp::{split_records, Records};

use crate::error::{Error, Result};

/// The record types found in a Paradopp binary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    HardwareConfiguration,
    HeadConfiguration,
    UserConfiguration,
    ContinentalData,
    /// Shares the Continental layout byte for byte.
    AquadoppProfilerData,
}

impl RecordKind {
    pub fn from_id(id: u8) -> Option<RecordKind> {
        match id {
            0x05 => Some(RecordKind::HardwareConfiguration),
            0x04 => Some(RecordKind::HeadConfiguration),
            0x00 => Some(RecordKind::UserConfiguration),
            0x24 => Some(RecordKind::ContinentalData),
            0x21 => Some(RecordKind::AquadoppProfilerData),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            RecordKind::HardwareConfiguration => 0x05,
            RecordKind::HeadConfiguration => 0x04,
            RecordKind::UserConfiguration => 0x00,
            RecordKind::ContinentalData => 0x24,
            RecordKind::AquadoppProfilerData => 0x21,
        }
    }

    pub fn is_header(self) -> bool {
        matches!(
            self,
            RecordKind::HardwareConfiguration
                | RecordKind::HeadConfiguration
                | RecordKind::UserConfiguration
        )
    }

    /// The size in bytes mandated for configuration records. Data records
    /// scale with the cell count, so have no fixed size.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            RecordKind::HardwareConfiguration => Some(48),
            RecordKind::HeadConfiguration => Some(224),
            RecordKind::UserConfiguration => Some(512),
            RecordKind::ContinentalData | RecordKind::AquadoppProfilerData => None,
        }
    }
}

/// One framed block of the file. Checksum and sync have already been
/// verified; the payload is otherwise uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub kind: RecordKind,

    /// Where the record starts in the file \[bytes\].
    pub offset: usize,

    bytes: Vec<u8>,
}

impl RawRecord {
    pub(crate) fn new(kind: RecordKind, offset: usize, bytes: Vec<u8>) -> RawRecord {
        RawRecord {
            kind,
            offset,
            bytes,
        }
    }

    /// The whole record, sync byte and checksum included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// The records of a file, sorted into the roles the vendor layout gives them.
#[derive(Debug, Clone)]
pub struct RecordSet {
    pub hardware: RawRecord,
    pub head: RawRecord,
    pub user: RawRecord,

    /// Per-ensemble records in file order. All share one [`RecordKind`].
    pub data: Vec1<RawRecord>,
}

impl RecordSet {
    /// Check the ordering rules: hardware, head and user configuration come
    /// first (in that order), then at least one data record, all of a single
    /// kind.
    pub fn from_records(records: Vec<RawRecord>) -> Result<RecordSet> {
        let num_headers = records.iter().take_while(|r| r.kind.is_header()).count();
        if num_headers < 3 {
            return Err(Error::format(
                records.get(num_headers).map(|r| r.offset).unwrap_or(0),
                format!("expected 3 configuration records, found {num_headers}"),
            ));
        }

        let mut records = records.into_iter();
        let mut expect = |kind: RecordKind| -> Result<RawRecord> {
            match records.next() {
                Some(r) if r.kind == kind => Ok(r),
                Some(r) => Err(Error::format(
                    r.offset,
                    format!("expected {kind:?} record, found {:?}", r.kind),
                )),
                None => Err(Error::format(0, format!("missing {kind:?} record"))),
            }
        };
        let hardware = expect(RecordKind::HardwareConfiguration)?;
        let head = expect(RecordKind::HeadConfiguration)?;
        let user = expect(RecordKind::UserConfiguration)?;

        let data = Vec1::try_from_vec(records.collect()).map_err(|_| {
            Error::format(user.offset + user.len(), "file contains no data records")
        })?;
        let data_kind = data.first().kind;
        if data_kind.is_header() {
            return Err(Error::format(
                data.first().offset,
                format!("unexpected {data_kind:?} record after the configuration block"),
            ));
        }
        for r in data.iter() {
            if r.kind != data_kind {
                return Err(Error::format(
                    r.offset,
                    format!("expected {data_kind:?} record, found {:?}", r.kind),
                ));
            }
        }
        debug!("{} {data_kind:?} records", data.len());

        Ok(RecordSet {
            hardware,
            head,
            user,
            data,
        })
    }
}

/// Read a whole file into a [`RecordSet`]. The file is closed before this
/// returns, whether or not framing succeeded.
pub fn read_records<P: AsRef<Path>>(file: P) -> Result<RecordSet> {
    let file = file.as_ref();
    debug!("Reading Paradopp records from {}", file.display());
    let buf = std::fs::read(file).map_err(|source| Error::Io {
        path: file.to_path_buf(),
        source,
    })?;
    RecordSet::from_records(split_records(&buf)?)
}
