//! # PageReader - Record Cursor
//!
//! `PageReader` walks the records of one page at a time and decodes column
//! values straight from the page buffer.
//!
//! ## Usage
//!
//! ```ignore
//! let mut reader = PageReader::new(&schema);
//! while let Some(page) = input.next_page()? {
//!     reader.set_page(page)?;
//!     while reader.next_record()? {
//!         let ok = reader.get_boolean(0)?;       // Option<bool>
//!         let name = reader.get_string(2)?;      // Option<&str>, borrowed from the page
//!     }
//! }
//! reader.close();
//! ```
//!
//! ## Cursor
//!
//! After `set_page` the cursor sits before the first record. Each
//! `next_record` advances by the span stored in the previous record's header
//! and copies the new record's null bitmap into scratch. Accessors are valid
//! only after a `next_record` that returned `true`; calling one earlier is a
//! contract violation and returns an error.
//!
//! Accessors consult the null bitmap first and return `None` for null
//! columns. String and Json accessors dereference the stored index into the
//! page's reference lists.
//!
//! ## Ownership
//!
//! The reader owns the page it is reading. `set_page` drops (and so releases)
//! the previous one; `close` releases the current one and is idempotent.

use eyre::{bail, ensure, Result};

use super::Page;
use crate::config::{PAGE_HEADER_SIZE, RECORD_SIZE_FIELD};
use crate::layout::{is_null_bit, new_null_bitmap, NullBitmap, PageLayout, RecordHeader};
use crate::schema::Schema;
use crate::types::{Timestamp, Type, Value};

#[derive(Debug)]
pub struct PageReader<'a> {
    schema: &'a Schema,
    layout: PageLayout,
    page: Option<Page>,
    record_count: u32,
    read_count: u32,
    position: usize,
    null_bitmap: NullBitmap,
}

impl<'a> PageReader<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        let layout = PageLayout::new(schema);
        let null_bitmap = new_null_bitmap(layout.null_bitmap_size(), true);
        Self {
            schema,
            layout,
            page: None,
            record_count: 0,
            read_count: 0,
            position: PAGE_HEADER_SIZE,
            null_bitmap,
        }
    }

    /// Reads a page's record count without positioning a reader on it.
    pub fn page_record_count(page: &Page) -> Result<u32> {
        page.record_count()
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Record count of the current page, 0 when none is held.
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    pub fn set_page(&mut self, page: Page) -> Result<()> {
        self.close();
        self.record_count = page.record_count()?;
        self.read_count = 0;
        self.position = PAGE_HEADER_SIZE;
        self.page = Some(page);
        Ok(())
    }

    pub fn next_record(&mut self) -> Result<bool> {
        let Some(page) = &self.page else {
            return Ok(false);
        };
        if self.read_count >= self.record_count {
            return Ok(false);
        }

        let data = page.buffer().as_slice();
        if self.read_count > 0 {
            let span = RecordHeader::from_bytes(&data[self.position..])?.record_size() as usize;
            ensure!(
                span >= self.layout.record_header_size(),
                "record {} has invalid span {}",
                self.read_count - 1,
                span
            );
            self.position += span;
        }
        ensure!(
            self.position + self.layout.fixed_record_size() <= data.len(),
            "record {} at offset {} overruns page of {} bytes",
            self.read_count,
            self.position,
            data.len()
        );

        self.read_count += 1;
        let bitmap_at = self.position + RECORD_SIZE_FIELD;
        self.null_bitmap
            .copy_from_slice(&data[bitmap_at..bitmap_at + self.layout.null_bitmap_size()]);
        Ok(true)
    }

    /// Releases the current page. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(page) = self.page.take() {
            page.release();
        }
        self.record_count = 0;
        self.read_count = 0;
        self.position = PAGE_HEADER_SIZE;
    }

    pub fn is_null(&self, col_idx: usize) -> Result<bool> {
        self.current(col_idx)?;
        Ok(is_null_bit(&self.null_bitmap, col_idx))
    }

    pub fn get_boolean(&self, col_idx: usize) -> Result<Option<bool>> {
        let Some((page, at)) = self.slot(col_idx, Type::Boolean)? else {
            return Ok(None);
        };
        Ok(Some(page.buffer().get_u8(at) != 0))
    }

    pub fn get_long(&self, col_idx: usize) -> Result<Option<i64>> {
        let Some((page, at)) = self.slot(col_idx, Type::Long)? else {
            return Ok(None);
        };
        Ok(Some(page.buffer().get_i64(at)))
    }

    pub fn get_double(&self, col_idx: usize) -> Result<Option<f64>> {
        let Some((page, at)) = self.slot(col_idx, Type::Double)? else {
            return Ok(None);
        };
        Ok(Some(page.buffer().get_f64(at)))
    }

    pub fn get_string(&self, col_idx: usize) -> Result<Option<&str>> {
        let Some((page, at)) = self.slot(col_idx, Type::String)? else {
            return Ok(None);
        };
        let idx = page.buffer().get_u32(at) as usize;
        page.string_reference(idx).map(Some).ok_or_else(|| {
            eyre::eyre!(
                "column {} references string {} but page holds {}",
                col_idx,
                idx,
                page.string_references().len()
            )
        })
    }

    pub fn get_json(&self, col_idx: usize) -> Result<Option<&serde_json::Value>> {
        let Some((page, at)) = self.slot(col_idx, Type::Json)? else {
            return Ok(None);
        };
        let idx = page.buffer().get_u32(at) as usize;
        page.json_reference(idx).map(Some).ok_or_else(|| {
            eyre::eyre!(
                "column {} references json value {} but page holds {}",
                col_idx,
                idx,
                page.json_references().len()
            )
        })
    }

    pub fn get_timestamp(&self, col_idx: usize) -> Result<Option<Timestamp>> {
        let Some((page, at)) = self.slot(col_idx, Type::Timestamp)? else {
            return Ok(None);
        };
        let mut bytes = [0u8; 12];
        page.buffer().get_bytes(at, &mut bytes);
        Timestamp::from_bytes(bytes).map(Some)
    }

    /// Dynamically typed accessor dispatching on the column's type.
    pub fn get_value(&self, col_idx: usize) -> Result<Value> {
        let column_type = self.column_type(col_idx)?;
        let value = match column_type {
            Type::Boolean => self.get_boolean(col_idx)?.map(Value::Boolean),
            Type::Long => self.get_long(col_idx)?.map(Value::Long),
            Type::Double => self.get_double(col_idx)?.map(Value::Double),
            Type::String => self.get_string(col_idx)?.map(|s| Value::String(s.to_string())),
            Type::Timestamp => self.get_timestamp(col_idx)?.map(Value::Timestamp),
            Type::Json => self.get_json(col_idx)?.cloned().map(Value::Json),
        };
        Ok(value.unwrap_or(Value::Null))
    }

    /// All column values of the current record in schema order.
    pub fn get_values(&self) -> Result<Vec<Value>> {
        (0..self.schema.column_count())
            .map(|col_idx| self.get_value(col_idx))
            .collect()
    }

    fn column_type(&self, col_idx: usize) -> Result<Type> {
        self.schema.column_type(col_idx).ok_or_else(|| {
            eyre::eyre!(
                "column index {} out of range for schema with {} columns",
                col_idx,
                self.schema.column_count()
            )
        })
    }

    fn current(&self, col_idx: usize) -> Result<&Page> {
        self.column_type(col_idx)?;
        match &self.page {
            Some(page) if self.read_count > 0 => Ok(page),
            _ => bail!("no current record: next_record must return true before reading columns"),
        }
    }

    /// The page and absolute slot offset of a non-null column, after checking
    /// the accessor type against the schema.
    fn slot(&self, col_idx: usize, requested: Type) -> Result<Option<(&Page, usize)>> {
        let page = self.current(col_idx)?;
        let declared = self.column_type(col_idx)?;
        if declared != requested {
            bail!(
                "column {} is declared {} but read as {}",
                col_idx,
                declared,
                requested
            );
        }
        if is_null_bit(&self.null_bitmap, col_idx) {
            return Ok(None);
        }
        Ok(Some((page, self.position + self.layout.column_offset(col_idx))))
    }
}
