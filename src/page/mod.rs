//! # Pages
//!
//! A `Page` is one immutable batch of encoded records: a filled `Buffer` plus
//! two page-scoped reference lists holding the String and JSON values that
//! records point at by index.
//!
//! ## Page Binary Layout
//!
//! ```text
//! +----------------+---------------------------------------------------------+
//! | Record Count   | Records                                                 |
//! | (u32)          | [record_size u32][null bitmap][column slots] ...        |
//! +----------------+---------------------------------------------------------+
//!
//! strings: ["hi", "there", ...]   <- String slots hold an index into this list
//! jsons:   [{"a":1}, [1,2], ...]  <- Json slots hold an index into this list
//! ```
//!
//! The layout is in-process only: little-endian, unversioned and never meant
//! to be persisted or sent across machines.
//!
//! ## Lifecycle
//!
//! 1. `PageBuilder` fills a buffer and seals it into a `Page` on flush
//! 2. The `Page` moves to a `PageOutput` (possibly on another thread)
//! 3. A `PageReader` takes it with `set_page` and decodes records
//! 4. Dropping the page, or the reader moving on, releases the buffer once
//!
//! ## Module Structure
//!
//! - `row`: per-column staging slots for the record being assembled
//! - `builder`: `PageBuilder`, encoding and flush policy
//! - `reader`: `PageReader`, cursor and typed accessors
//! - `bulk`: `build_pages` / `read_values` helpers over `Value` rows

mod builder;
mod bulk;
mod reader;
mod row;


pub use builder::PageBuilder;
pub use bulk::{build_pages, read_values};
pub use reader::PageReader;

use std::fmt;

use eyre::Result;

use crate::buffer::Buffer;
use crate::layout::PageHeader;

pub struct Page {
    buffer: Buffer,
    strings: Vec<String>,
    jsons: Vec<serde_json::Value>,
}

impl Page {
    pub(crate) fn new(buffer: Buffer, strings: Vec<String>, jsons: Vec<serde_json::Value>) -> Self {
        Self {
            buffer,
            strings,
            jsons,
        }
    }

    /// Reads the record count from a page buffer's header without building
    /// a reader.
    pub fn record_count_of(buffer: &Buffer) -> Result<u32> {
        Ok(PageHeader::from_bytes(buffer.as_slice())?.record_count())
    }

    pub fn record_count(&self) -> Result<u32> {
        Self::record_count_of(&self.buffer)
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Encoded size in bytes, header included.
    pub fn byte_len(&self) -> usize {
        self.buffer.limit()
    }

    pub fn string_reference(&self, idx: usize) -> Option<&str> {
        self.strings.get(idx).map(String::as_str)
    }

    pub fn json_reference(&self, idx: usize) -> Option<&serde_json::Value> {
        self.jsons.get(idx)
    }

    pub fn string_references(&self) -> &[String] {
        &self.strings
    }

    pub fn json_references(&self) -> &[serde_json::Value] {
        &self.jsons
    }

    /// Releases the page buffer now instead of at drop.
    pub fn release(mut self) {
        self.buffer.release();
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("record_count", &self.record_count().ok())
            .field("bytes", &self.byte_len())
            .field("strings", &self.strings.len())
            .field("jsons", &self.jsons.len())
            .finish()
    }
}
