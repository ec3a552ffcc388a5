//! # PageBuilder - Record Encoding and Flush Policy
//!
//! `PageBuilder` stages typed values for the current record, encodes each
//! committed record into the active buffer and seals full buffers into pages
//! for its `PageOutput`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = PageBuilder::new(&schema, &allocator, output);
//! builder.set_boolean(0, true)?;
//! builder.set_long(1, 42)?;
//! builder.set_string(2, "hi")?;
//! builder.add_record()?;
//!
//! builder.set_long(1, -7)?;   // columns 0 and 2 stay null
//! builder.add_record()?;
//!
//! let output = builder.finish()?;
//! ```
//!
//! ## State
//!
//! ```text
//! per record:  Row slots ──add_record──> buffer[position..position + fixed_record_size]
//! per buffer:  record_count, position, string/json reference lists, size estimate
//! ```
//!
//! Setting a column twice before `add_record` keeps the last value. A setter
//! whose type does not match the column fails without touching the row.
//!
//! ## Flush Policy
//!
//! After every record the builder checks whether another fixed-size record
//! plus the estimated size of the accumulated references still fits:
//!
//! ```text
//! capacity < position + fixed_record_size + reference_size  =>  flush
//! ```
//!
//! Flushing writes the record count into the page header, sets the buffer
//! limit to the write position and hands a `Page` to the output. An output
//! error that is not already a `TransferError` is reported as
//! `TransferErrorKind::Rejected` with the pages and bytes handed over before
//! it. The next
//! buffer is allocated lazily by the next `add_record`. Flushing with no
//! committed records does nothing.
//!
//! ## Termination
//!
//! `finish` (flush + end-of-stream) and `close` (discard + release) both
//! consume the builder, so neither can be followed by further setters.
//! Dropping a builder without either behaves like `close`.
//!
//! ## Thread Safety
//!
//! A builder has a single writer and carries no locks. Only the allocator is
//! shared with other stages.

use std::mem;

use eyre::Result;
use zerocopy::IntoBytes;

use super::row::{Row, SlotValue};
use super::Page;
use crate::buffer::{AllocationError, Buffer, BufferAllocator};
use crate::config::{
    JSON_REFERENCE_SIZE_ESTIMATE, PAGE_HEADER_SIZE, RECORD_SIZE_FIELD,
    STRING_REFERENCE_BYTES_PER_UNIT, STRING_REFERENCE_OVERHEAD,
};
use crate::layout::{
    clear_null_bit, new_null_bitmap, set_null_bit, NullBitmap, PageHeader, PageLayout,
    RecordHeader,
};
use crate::pipeline::{PageOutput, TransferError, TransferErrorKind};
use crate::schema::Schema;
use crate::types::{Timestamp, Value};

pub struct PageBuilder<'a, O: PageOutput> {
    schema: &'a Schema,
    allocator: &'a dyn BufferAllocator,
    output: Option<O>,
    layout: PageLayout,
    row: Row,
    null_bitmap: NullBitmap,
    buffer: Option<Buffer>,
    record_count: u32,
    position: usize,
    strings: Vec<String>,
    jsons: Vec<serde_json::Value>,
    reference_size: usize,
    transferred_pages: u64,
    transferred_bytes: u64,
}

impl<'a, O: PageOutput> PageBuilder<'a, O> {
    pub fn new(schema: &'a Schema, allocator: &'a dyn BufferAllocator, output: O) -> Self {
        let layout = PageLayout::new(schema);
        let null_bitmap = new_null_bitmap(layout.null_bitmap_size(), true);
        Self {
            schema,
            allocator,
            output: Some(output),
            row: Row::new(schema),
            null_bitmap,
            layout,
            buffer: None,
            record_count: 0,
            position: PAGE_HEADER_SIZE,
            strings: Vec::new(),
            jsons: Vec::new(),
            reference_size: 0,
            transferred_pages: 0,
            transferred_bytes: 0,
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Records committed to the active buffer but not yet flushed.
    pub fn record_count(&self) -> u32 {
        self.record_count
    }

    pub fn transferred_pages(&self) -> u64 {
        self.transferred_pages
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    pub fn set_null(&mut self, col_idx: usize) -> Result<()> {
        self.row.set_null(col_idx)
    }

    pub fn set_boolean(&mut self, col_idx: usize, value: bool) -> Result<()> {
        self.row.set_boolean(col_idx, value)
    }

    pub fn set_long(&mut self, col_idx: usize, value: i64) -> Result<()> {
        self.row.set_long(col_idx, value)
    }

    pub fn set_double(&mut self, col_idx: usize, value: f64) -> Result<()> {
        self.row.set_double(col_idx, value)
    }

    pub fn set_string(&mut self, col_idx: usize, value: &str) -> Result<()> {
        self.row.set_string(col_idx, value)
    }

    pub fn set_timestamp(&mut self, col_idx: usize, value: Timestamp) -> Result<()> {
        self.row.set_timestamp(col_idx, value)
    }

    pub fn set_json(&mut self, col_idx: usize, value: serde_json::Value) -> Result<()> {
        self.row.set_json(col_idx, value)
    }

    /// Dynamically typed setter; `Value::Null` fits every column.
    pub fn set_value(&mut self, col_idx: usize, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.set_null(col_idx),
            Value::Boolean(v) => self.set_boolean(col_idx, *v),
            Value::Long(v) => self.set_long(col_idx, *v),
            Value::Double(v) => self.set_double(col_idx, *v),
            Value::String(v) => self.set_string(col_idx, v),
            Value::Timestamp(v) => self.set_timestamp(col_idx, *v),
            Value::Json(v) => self.set_json(col_idx, v.clone()),
        }
    }

    /// Encodes the staged row as the next record and resets the row to all
    /// null. May flush a page to the output.
    pub fn add_record(&mut self) -> Result<()> {
        if self.buffer.is_none() {
            self.buffer = Some(self.allocate_buffer()?);
        }
        let Some(buffer) = self.buffer.as_mut() else {
            eyre::bail!("page builder has no active buffer");
        };

        let position = self.position;
        let record_size = self.layout.fixed_record_size();

        for (col_idx, slot) in self.row.slots_mut().iter_mut().enumerate() {
            if slot.null {
                set_null_bit(&mut self.null_bitmap, col_idx);
                continue;
            }
            clear_null_bit(&mut self.null_bitmap, col_idx);

            let at = position + self.layout.column_offset(col_idx);
            match &mut slot.value {
                SlotValue::Boolean(v) => buffer.set_u8(at, u8::from(*v)),
                SlotValue::Long(v) => buffer.set_i64(at, *v),
                SlotValue::Double(v) => buffer.set_f64(at, *v),
                SlotValue::Timestamp(v) => buffer.set_bytes(at, &v.to_bytes()),
                SlotValue::String(v) => {
                    let value = mem::take(v);
                    self.reference_size +=
                        value.len() * STRING_REFERENCE_BYTES_PER_UNIT + STRING_REFERENCE_OVERHEAD;
                    self.strings.push(value);
                    buffer.set_u32(at, (self.strings.len() - 1) as u32);
                }
                SlotValue::Json(v) => {
                    self.jsons.push(mem::take(v));
                    self.reference_size += JSON_REFERENCE_SIZE_ESTIMATE;
                    buffer.set_u32(at, (self.jsons.len() - 1) as u32);
                }
            }
        }

        buffer.set_bytes(position, RecordHeader::new(record_size as u32).as_bytes());
        buffer.set_bytes(position + RECORD_SIZE_FIELD, &self.null_bitmap);

        self.position += record_size;
        self.record_count += 1;
        self.row.reset();

        if buffer.capacity() < self.position + record_size + self.reference_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Seals the committed records into a page and hands it to the output.
    pub fn flush(&mut self) -> Result<()> {
        if self.record_count == 0 {
            return Ok(());
        }
        let Some(mut buffer) = self.buffer.take() else {
            return Ok(());
        };

        buffer.set_bytes(0, PageHeader::new(self.record_count).as_bytes());
        buffer.set_limit(self.position)?;

        let page = Page::new(
            buffer,
            mem::take(&mut self.strings),
            mem::take(&mut self.jsons),
        );

        tracing::debug!(
            records = self.record_count,
            bytes = page.byte_len(),
            strings = page.string_references().len(),
            jsons = page.json_references().len(),
            "flushing page"
        );

        let bytes = page.byte_len() as u64;
        self.reset_accumulation();

        let Some(output) = self.output.as_mut() else {
            eyre::bail!("page builder output already released");
        };
        if let Err(err) = output.add(page) {
            if err.downcast_ref::<TransferError>().is_some() {
                return Err(err);
            }
            tracing::warn!(
                transferred_pages = self.transferred_pages,
                error = %err,
                "page output rejected page"
            );
            return Err(eyre::Report::new(TransferError::new(
                TransferErrorKind::Rejected(err.to_string()),
                self.transferred_pages,
                self.transferred_bytes,
            )));
        }
        self.transferred_pages += 1;
        self.transferred_bytes += bytes;
        Ok(())
    }

    /// Flushes pending records, signals end-of-stream and returns the output.
    pub fn finish(mut self) -> Result<O> {
        self.flush()?;
        let Some(mut output) = self.output.take() else {
            eyre::bail!("page builder output already released");
        };
        output.finish()?;
        Ok(output)
    }

    /// Discards uncommitted and unflushed data and closes the output.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn release(&mut self) -> Result<()> {
        if self.record_count > 0 {
            tracing::warn!(
                records = self.record_count,
                "closing page builder with unflushed records"
            );
        }
        if let Some(mut buffer) = self.buffer.take() {
            buffer.release();
        }
        self.reset_accumulation();
        self.row.reset();
        match self.output.take() {
            Some(mut output) => output.close(),
            None => Ok(()),
        }
    }

    fn reset_accumulation(&mut self) {
        self.record_count = 0;
        self.position = PAGE_HEADER_SIZE;
        self.strings.clear();
        self.jsons.clear();
        self.reference_size = 0;
    }

    fn allocate_buffer(&self) -> Result<Buffer> {
        self.allocator
            .allocate_with_capacity(self.layout.min_page_capacity())
            .map_err(|err| match err.downcast::<AllocationError>() {
                Ok(refused) => eyre::Report::new(TransferError::new(
                    TransferErrorKind::AllocatorExhausted {
                        requested: refused.requested,
                        available: refused.available,
                    },
                    self.transferred_pages,
                    self.transferred_bytes,
                )),
                Err(other) => other,
            })
    }
}

impl<O: PageOutput> Drop for PageBuilder<'_, O> {
    fn drop(&mut self) {
        if self.output.is_none() {
            return;
        }
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "failed to close page output on drop");
        }
    }
}
