//! # Page and Record Headers
//!
//! ```text
//! Page:   [record_count: u32][record]*
//! Record: [record_size: u32][null bitmap][column slots]
//! ```
//!
//! Both headers are little-endian zerocopy structs so they can be read from
//! and written to any offset of a buffer without alignment concerns.

use eyre::{ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{PAGE_HEADER_SIZE, RECORD_SIZE_FIELD};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct PageHeader {
    record_count: U32,
}

const _: () = assert!(std::mem::size_of::<PageHeader>() == PAGE_HEADER_SIZE);

impl PageHeader {
    pub fn new(record_count: u32) -> Self {
        Self {
            record_count: U32::new(record_count),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= PAGE_HEADER_SIZE,
            "buffer too small for page header: {} < {}",
            bytes.len(),
            PAGE_HEADER_SIZE
        );
        Self::ref_from_bytes(&bytes[..PAGE_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse page header: {:?}", e))
    }

    header_accessors! {
        record_count,
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RecordHeader {
    record_size: U32,
}

const _: () = assert!(std::mem::size_of::<RecordHeader>() == RECORD_SIZE_FIELD);

impl RecordHeader {
    pub fn new(record_size: u32) -> Self {
        Self {
            record_size: U32::new(record_size),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= RECORD_SIZE_FIELD,
            "buffer too small for record header: {} < {}",
            bytes.len(),
            RECORD_SIZE_FIELD
        );
        Self::ref_from_bytes(&bytes[..RECORD_SIZE_FIELD])
            .map_err(|e| eyre::eyre!("failed to parse record header: {:?}", e))
    }

    header_accessors! {
        record_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_header_is_little_endian() {
        let header = PageHeader::new(0x0102_0304);
        assert_eq!(header.as_bytes(), &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(PageHeader::from_bytes(header.as_bytes()).unwrap().record_count(), 0x0102_0304);
    }

    #[test]
    fn record_header_setter_round_trips() {
        let mut header = RecordHeader::new(0);
        header.set_record_size(27);
        assert_eq!(RecordHeader::from_bytes(header.as_bytes()).unwrap().record_size(), 27);
    }

    #[test]
    fn short_slice_is_rejected() {
        assert!(PageHeader::from_bytes(&[1, 2]).is_err());
        assert!(RecordHeader::from_bytes(&[]).is_err());
    }
}
