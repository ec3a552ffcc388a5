//! # Schema
//!
//! A `Schema` is the ordered, index-stable list of columns every page of a
//! pipeline run is encoded against. It is built once when the run is set up
//! and shared read-only by every builder and reader afterwards.
//!
//! ## Invariants
//!
//! - `schema.column(i).index() == i` for every column (dense, no duplicates)
//! - Column names are used for lookup only; the first column with a given name
//!   wins when names repeat
//!
//! Both are checked by `Schema::new`, so an invalid schema is rejected before
//! any buffer is allocated for it.
//!
//! ## Wire Form
//!
//! For configuration and debugging interchange a schema serializes as a JSON
//! array:
//!
//! ```text
//! [
//!   {"index": 0, "name": "ok",   "type": "boolean"},
//!   {"index": 1, "name": "at",   "type": "timestamp", "format": "%Y-%m-%d"},
//!   {"index": 2, "name": "body", "type": "json"}
//! ]
//! ```
//!
//! Decoding fails on a missing `index`/`name`, an unknown `type`, or indices
//! that break the invariants above.

mod column;

pub use column::Column;

use std::fmt;

use eyre::{bail, Result, WrapErr};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Column>", into = "Vec<Column>")]
pub struct Schema {
    columns: Vec<Column>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
    #[serde(skip)]
    fixed_storage_size: usize,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = vec![false; columns.len()];
        for (position, column) in columns.iter().enumerate() {
            if column.index() < seen.len() && seen[column.index()] {
                bail!(
                    "duplicate column index {} for column '{}'",
                    column.index(),
                    column.name()
                );
            }
            if column.index() != position {
                bail!(
                    "column '{}' has index {} but is at position {}; indices must be dense and ordered",
                    column.name(),
                    column.index(),
                    position
                );
            }
            seen[position] = true;
        }

        let mut by_name = HashMap::with_capacity(columns.len());
        for column in &columns {
            by_name
                .entry(column.name().to_string())
                .or_insert(column.index());
        }

        let fixed_storage_size = columns.iter().map(|c| c.column_type().fixed_width()).sum();

        Ok(Self {
            columns,
            by_name,
            fixed_storage_size,
        })
    }

    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("failed to decode schema wire form")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).wrap_err("failed to encode schema wire form")
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_type(&self, idx: usize) -> Option<Type> {
        self.columns.get(idx).map(Column::column_type)
    }

    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&idx| &self.columns[idx])
    }

    pub fn lookup_column(&self, name: &str) -> Result<&Column> {
        self.find_column(name)
            .ok_or_else(|| eyre::eyre!("column '{}' not found in schema", name))
    }

    /// Sum of the inline widths of every column.
    pub fn fixed_storage_size(&self) -> usize {
        self.fixed_storage_size
    }

    /// Calls `f` for every column in index order.
    pub fn for_each_column<F>(&self, mut f: F)
    where
        F: FnMut(&Column),
    {
        for column in &self.columns {
            f(column);
        }
    }
}

impl TryFrom<Vec<Column>> for Schema {
    type Error = eyre::Report;

    fn try_from(columns: Vec<Column>) -> Result<Self> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<Column> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Schema{")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", column.name(), column.column_type())?;
        }
        f.write_str("}")
    }
}

/// Assigns dense indices in insertion order.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    columns: Vec<Column>,
}

impl SchemaBuilder {
    pub fn add(mut self, name: impl Into<String>, column_type: Type) -> Self {
        let index = self.columns.len();
        self.columns.push(Column::new(index, name, column_type));
        self
    }

    pub fn add_timestamp(mut self, name: impl Into<String>, format: Option<&str>) -> Self {
        let index = self.columns.len();
        self.columns
            .push(Column::new_timestamp(index, name, format.map(str::to_string)));
        self
    }

    pub fn build(self) -> Result<Schema> {
        Schema::new(self.columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::builder()
            .add("ok", Type::Boolean)
            .add("n", Type::Long)
            .add("name", Type::String)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_assigns_dense_indices() {
        let schema = sample();
        assert_eq!(schema.column_count(), 3);
        for (i, column) in schema.columns().iter().enumerate() {
            assert_eq!(column.index(), i);
        }
        assert_eq!(schema.column(2).unwrap().name(), "name");
        assert!(schema.column(3).is_none());
    }

    #[test]
    fn fixed_storage_size_sums_widths() {
        assert_eq!(sample().fixed_storage_size(), 1 + 8 + 4);
    }

    #[test]
    fn lookup_by_name() {
        let schema = sample();
        assert_eq!(schema.lookup_column("n").unwrap().index(), 1);
        let err = schema.lookup_column("missing").unwrap_err();
        assert!(err.to_string().contains("'missing' not found"));
    }

    #[test]
    fn repeated_name_resolves_to_first_column() {
        let schema = Schema::builder()
            .add("a", Type::Long)
            .add("a", Type::String)
            .build()
            .unwrap();
        assert_eq!(schema.lookup_column("a").unwrap().index(), 0);
    }

    #[test]
    fn rejects_duplicate_index() {
        let err = Schema::new(vec![
            Column::new(0, "a", Type::Long),
            Column::new(0, "b", Type::Long),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate column index 0"));
    }

    #[test]
    fn rejects_sparse_index() {
        let err = Schema::new(vec![
            Column::new(0, "a", Type::Long),
            Column::new(2, "b", Type::Long),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("dense"));
    }

    #[test]
    fn for_each_column_visits_in_order() {
        let mut widths = Vec::new();
        sample().for_each_column(|c| match c.column_type() {
            Type::Boolean => widths.push(("bool", c.index())),
            Type::Long | Type::Double => widths.push(("num", c.index())),
            Type::String | Type::Json => widths.push(("ref", c.index())),
            Type::Timestamp => widths.push(("ts", c.index())),
        });
        assert_eq!(widths, vec![("bool", 0), ("num", 1), ("ref", 2)]);
    }

    #[test]
    fn display_lists_columns() {
        assert_eq!(sample().to_string(), "Schema{ok:boolean, n:long, name:string}");
    }
}
