//! # Column Definitions
//!
//! A `Column` is an `(index, name, type)` triple plus an optional display
//! format for Timestamp columns. The format is carried for downstream
//! formatters only; the page engine never interprets it.

use serde::{Deserialize, Serialize};

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    index: usize,
    name: String,
    #[serde(rename = "type")]
    column_type: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
}

impl Column {
    pub fn new(index: usize, name: impl Into<String>, column_type: Type) -> Self {
        Self {
            index,
            name: name.into(),
            column_type,
            format: None,
        }
    }

    pub fn new_timestamp(index: usize, name: impl Into<String>, format: Option<String>) -> Self {
        Self {
            index,
            name: name.into(),
            column_type: Type::Timestamp,
            format,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> Type {
        self.column_type
    }

    /// Timestamp display format, if one was configured.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }
}
