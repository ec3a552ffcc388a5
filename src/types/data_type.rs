//! # Column Types
//!
//! `Type` is the closed set of value kinds a page column can hold. Every kind
//! has a fixed inline width inside a record; String and Json store a 4-byte
//! index into a page-scoped reference list instead of their bytes.
//!
//! | Type      | Inline width | Encoding                                   |
//! |-----------|--------------|--------------------------------------------|
//! | Boolean   | 1            | `0` / `1`                                  |
//! | Long      | 8            | `i64` little-endian                        |
//! | Double    | 8            | `f64` little-endian                        |
//! | String    | 4            | `u32` index into the string reference list |
//! | Timestamp | 12           | `i64` seconds + `u32` nanoseconds          |
//! | Json      | 4            | `u32` index into the JSON reference list   |
//!
//! ## Metadata
//!
//! `Type` carries no metadata. The optional
//! timestamp display format lives on the `Column`, so two Timestamp columns
//! with different formats still share the same `Type`.

use std::fmt;
use std::str::FromStr;

use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::config::REFERENCE_INDEX_SIZE;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Boolean = 0,
    Long = 1,
    Double = 2,
    String = 3,
    Timestamp = 4,
    Json = 5,
}

impl Type {
    pub const ALL: [Type; 6] = [
        Type::Boolean,
        Type::Long,
        Type::Double,
        Type::String,
        Type::Timestamp,
        Type::Json,
    ];

    /// Bytes this type occupies inside a record's fixed region.
    pub fn fixed_width(&self) -> usize {
        match self {
            Type::Boolean => 1,
            Type::Long => 8,
            Type::Double => 8,
            Type::Timestamp => 12,
            Type::String | Type::Json => REFERENCE_INDEX_SIZE,
        }
    }

    /// Returns true if values of this type are stored out-of-band in a
    /// page reference list.
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::String | Type::Json)
    }

    /// Name used by the schema wire form.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Boolean => "boolean",
            Type::Long => "long",
            Type::Double => "double",
            Type::String => "string",
            Type::Timestamp => "timestamp",
            Type::Json => "json",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Type {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Type::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| eyre::eyre!("unknown column type '{}'", s))
    }
}
