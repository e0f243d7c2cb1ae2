//! Little-endian field access within a record.

use hifitime::Epoch;

use super::RawRecord;
use crate::error::{Error, Result};

/// Reads fields at fixed byte offsets of one record, reporting failures with
/// the absolute file offset of the field.
#[derive(Clone, Copy)]
pub(crate) struct Fields<'a> {
    buf: &'a [u8],
    record_offset: usize,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(record: &'a RawRecord) -> Fields<'a> {
        Fields {
            buf: record.bytes(),
            record_offset: record.offset,
        }
    }

    fn slice(&self, at: usize, len: usize) -> Result<&'a [u8]> {
        self.buf.get(at..at + len).ok_or_else(|| {
            Error::format(
                self.record_offset + at,
                format!(
                    "field of {len} bytes runs past the end of a {} byte record",
                    self.buf.len()
                ),
            )
        })
    }

    pub(crate) fn u8(&self, at: usize) -> Result<u8> {
        Ok(self.slice(at, 1)?[0])
    }

    pub(crate) fn u16(&self, at: usize) -> Result<u16> {
        let b = self.slice(at, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn i16(&self, at: usize) -> Result<i16> {
        let b = self.slice(at, 2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub(crate) fn i16_array(&self, at: usize, n: usize) -> Result<Vec<i16>> {
        Ok(self
            .slice(at, n * 2)?
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect())
    }

    pub(crate) fn u8_array(&self, at: usize, n: usize) -> Result<Vec<u8>> {
        Ok(self.slice(at, n)?.to_vec())
    }

    /// A fixed-width ASCII field, stripped of NUL padding and whitespace.
    pub(crate) fn ascii(&self, at: usize, len: usize) -> Result<String> {
        let b = self.slice(at, len)?;
        Ok(String::from_utf8_lossy(b)
            .trim_end_matches('\0')
            .trim()
            .to_string())
    }

    /// The 6-byte instrument clock: BCD minute, second, day, hour, year,
    /// month.
    pub(crate) fn clock(&self, at: usize) -> Result<Epoch> {
        let b = self.slice(at, 6)?;
        let mut digits = [0u8; 6];
        for (i, (&byte, digit)) in b.iter().zip(digits.iter_mut()).enumerate() {
            *digit = bcd(byte).ok_or_else(|| {
                Error::format(
                    self.record_offset + at + i,
                    format!("invalid BCD byte {byte:#04x} in clock"),
                )
            })?;
        }
        let [minute, second, day, hour, year, month] = digits;
        let year = if year >= 90 {
            1900 + i32::from(year)
        } else {
            2000 + i32::from(year)
        };

        Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, second, 0).map_err(|e| {
            Error::format(
                self.record_offset + at,
                format!(
                    "invalid clock {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}: {e}"
                ),
            )
        })
    }
}

fn bcd(byte: u8) -> Option<u8> {
    let (hi, lo) = (byte >> 4, byte & 0x0F);
    if hi > 9 || lo > 9 {
        None
    } else {
        Some(hi * 10 + lo)
    }
}
