//! Whole-batch helpers over `Value` rows.
//!
//! These trade the allocation-free typed API for convenience. They are used
//! by tests, debugging dumps and small fixed inputs, not on the hot path.

use eyre::{ensure, Result, WrapErr};

use super::{Page, PageBuilder, PageReader};
use crate::buffer::BufferAllocator;
use crate::pipeline::PageCollector;
use crate::schema::Schema;
use crate::types::Value;

/// Encodes `rows` into as many pages as the allocator's page size requires.
pub fn build_pages(
    schema: &Schema,
    allocator: &dyn BufferAllocator,
    rows: &[Vec<Value>],
) -> Result<Vec<Page>> {
    let mut builder = PageBuilder::new(schema, allocator, PageCollector::new());
    for (row_idx, row) in rows.iter().enumerate() {
        ensure!(
            row.len() == schema.column_count(),
            "row {} has {} values but schema has {} columns",
            row_idx,
            row.len(),
            schema.column_count()
        );
        for (col_idx, value) in row.iter().enumerate() {
            builder
                .set_value(col_idx, value)
                .wrap_err_with(|| format!("row {}", row_idx))?;
        }
        builder.add_record()?;
    }
    Ok(builder.finish()?.into_pages())
}

/// Decodes every record of `pages` in order, releasing each page when done.
pub fn read_values<I>(schema: &Schema, pages: I) -> Result<Vec<Vec<Value>>>
where
    I: IntoIterator<Item = Page>,
{
    let mut reader = PageReader::new(schema);
    let mut rows = Vec::new();
    for page in pages {
        reader.set_page(page)?;
        while reader.next_record()? {
            rows.push(reader.get_values()?);
        }
    }
    reader.close();
    Ok(rows)
}
