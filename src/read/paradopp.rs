//! Paradopp record framing.
//!
//! Every record starts with the sync byte `0xA5`, then a one byte id and the
//! record size in 16-bit words. The last word is a checksum: `0xB58C` plus the
//! wrapping sum of every preceding little-endian word.

use log::trace;

use super::{RawRecord, RecordKind};
use crate::error::{Error, Result};

pub const SYNC: u8 = 0xA5;

pub const CHECKSUM_SEED: u16 = 0xB58C;

/// Sync, id and size.
const FRAME_HEADER_LEN: usize = 4;

/// Compute the checksum of a whole record. The trailing checksum word itself
/// is not included.
pub fn checksum(record: &[u8]) -> u16 {
    let body = &record[..record.len().saturating_sub(2)];
    body.chunks_exact(2)
        .map(|w| u16::from_le_bytes([w[0], w[1]]))
        .fold(CHECKSUM_SEED, |acc, w| acc.wrapping_add(w))
}

/// Iterate over the framed records of a buffer. After the first error, the
/// iterator is exhausted.
pub struct Records<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Records<'a> {
    pub fn new(buf: &'a [u8]) -> Records<'a> {
        Records {
            buf,
            offset: 0,
            failed: false,
        }
    }

    fn next_record(&mut self) -> Result<RawRecord> {
        let offset = self.offset;
        let rest = &self.buf[offset..];
        if rest.len() < FRAME_HEADER_LEN {
            return Err(Error::format(
                offset,
                format!("truncated record header ({} bytes left)", rest.len()),
            ));
        }
        if rest[0] != SYNC {
            return Err(Error::format(
                offset,
                format!("expected sync byte {SYNC:#04x}, found {:#04x}", rest[0]),
            ));
        }

        let id = rest[1];
        let kind = RecordKind::from_id(id)
            .ok_or_else(|| Error::format(offset, format!("unknown record id {id:#04x}")))?;

        let len = usize::from(u16::from_le_bytes([rest[2], rest[3]])) * 2;
        if len < FRAME_HEADER_LEN + 2 {
            return Err(Error::format(
                offset,
                format!("record size {len} bytes is smaller than the frame"),
            ));
        }
        if len > rest.len() {
            return Err(Error::format(
                offset,
                format!(
                    "{kind:?} record claims {len} bytes but only {} remain",
                    rest.len()
                ),
            ));
        }
        if let Some(fixed) = kind.fixed_len() {
            if len != fixed {
                return Err(Error::format(
                    offset,
                    format!("{kind:?} record must be {fixed} bytes, found {len}"),
                ));
            }
        }

        let bytes = &rest[..len];
        let expected = checksum(bytes);
        let found = u16::from_le_bytes([bytes[len - 2], bytes[len - 1]]);
        if expected != found {
            return Err(Error::format(
                offset,
                format!("{kind:?} checksum mismatch: computed {expected:#06x}, stored {found:#06x}"),
            ));
        }

        trace!("{kind:?} record at byte {offset}, {len} bytes");
        self.offset += len;
        Ok(RawRecord::new(kind, offset, bytes.to_vec()))
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }
        let result = self.next_record();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Frame a whole buffer, preserving file order.
pub fn split_records(buf: &[u8]) -> Result<Vec<RawRecord>> {
    Records::new(buf).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::toolkit::{frame, hardware_record, user_record};

    #[test]
    fn checksum_of_empty_body_is_the_seed() {
        assert_eq!(checksum(&[0, 0]), CHECKSUM_SEED);
    }

    #[test]
    fn checksum_wraps() {
        // 0xB58C + 0xFFFF wraps to 0xB58B.
        assert_eq!(checksum(&[0xFF, 0xFF, 0x00, 0x00]), 0xB58B);
    }

    #[test]
    fn frames_consecutive_records() {
        let mut buf = hardware_record("SN1234", "3.37", 190);
        buf.extend(user_record(2, 0x2000, 100, 60, 0));
        let records = split_records(&buf).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, RecordKind::HardwareConfiguration);
        assert_eq!(records[0].offset, 0);
        assert_eq!(records[1].kind, RecordKind::UserConfiguration);
        assert_eq!(records[1].offset, 48);
        assert_eq!(records[1].len(), 512);
    }

    #[test]
    fn bad_sync_is_a_format_error() {
        let mut buf = hardware_record("SN1234", "3.37", 190);
        buf[0] = 0xA4;
        match split_records(&buf) {
            Err(Error::Format { offset: 0, reason }) => assert!(reason.contains("sync")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn bad_checksum_is_a_format_error() {
        let mut buf = hardware_record("SN1234", "3.37", 190);
        buf[10] ^= 0xFF;
        match split_records(&buf) {
            Err(Error::Format { reason, .. }) => assert!(reason.contains("checksum")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn truncated_record_is_a_format_error() {
        let mut buf = hardware_record("SN1234", "3.37", 190);
        buf.extend(user_record(2, 0x2000, 100, 60, 0));
        buf.truncate(48 + 300);
        match split_records(&buf) {
            Err(Error::Format { offset, reason }) => {
                assert_eq!(offset, 48);
                assert!(reason.contains("remain"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn trailing_partial_header_is_a_format_error() {
        let mut buf = hardware_record("SN1234", "3.37", 190);
        buf.extend([SYNC, 0x24]);
        assert!(matches!(
            split_records(&buf),
            Err(Error::Format { offset: 48, .. })
        ));
    }

    #[test]
    fn unknown_id_is_a_format_error() {
        let buf = frame(0x7F, &[0; 8]);
        match split_records(&buf) {
            Err(Error::Format { reason, .. }) => assert!(reason.contains("0x7f")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn size_below_the_frame_is_a_format_error() {
        for words in 0..=2u16 {
            let mut buf = vec![SYNC, 0x24];
            buf.extend(words.to_le_bytes());
            buf.extend([0; 8]);
            match split_records(&buf) {
                Err(Error::Format { offset, reason }) => {
                    assert_eq!(offset, 0);
                    assert!(reason.contains("frame"), "{reason}");
                }
                other => panic!("unexpected result for {words} words: {other:?}"),
            }
        }
    }

    #[test]
    fn wrong_configuration_size_is_a_format_error() {
        let buf = frame(0x05, &[0; 20]);
        assert!(matches!(split_records(&buf), Err(Error::Format { .. })));
    }

    #[test]
    fn iterator_stops_after_an_error() {
        let mut buf = vec![0u8; 6];
        buf.extend(hardware_record("SN1234", "3.37", 190));
        let mut records = Records::new(&buf);
        assert!(matches!(records.next(), Some(Err(_))));
        assert!(records.next().is_none());
    }
}
