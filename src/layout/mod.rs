//! # Page Layout Calculator
//!
//! Pure functions of a `Schema` that decide where every byte of a record
//! lives. Builders and readers compute a `PageLayout` once at construction and
//! keep it for their lifetime; nothing here mutates the schema.
//!
//! ## Record Binary Layout
//!
//! ```text
//! +-------------------+----------------------+--------------------------------+
//! | Record Size       | Null Bitmap          | Column Slots                   |
//! | (u32)             | [u8; (N+7)/8]        | schema order, fixed widths     |
//! +-------------------+----------------------+--------------------------------+
//! ^ record start      ^ +4                   ^ +record_header_size
//! ```
//!
//! | Function | Value |
//! |----------|-------|
//! | `null_bitmap_size` | `ceil(column_count / 8)` |
//! | `record_header_size` | `4 + null_bitmap_size` |
//! | `fixed_record_size` | `record_header_size + sum(fixed_width)` |
//! | `column_offsets` | running sum of widths starting at `record_header_size` |
//!
//! A set bitmap bit means "null": bit `idx & 7` of byte `idx >> 3`.

mod headers;

pub use headers::{PageHeader, RecordHeader};

use smallvec::SmallVec;

use crate::config::{PAGE_HEADER_SIZE, RECORD_SIZE_FIELD};
use crate::schema::Schema;

pub fn null_bitmap_size(schema: &Schema) -> usize {
    schema.column_count().div_ceil(8)
}

pub fn record_header_size(schema: &Schema) -> usize {
    RECORD_SIZE_FIELD + null_bitmap_size(schema)
}

pub fn fixed_record_size(schema: &Schema) -> usize {
    record_header_size(schema) + schema.fixed_storage_size()
}

/// Byte offset of each column relative to the start of a record.
pub fn column_offsets(schema: &Schema) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(schema.column_count());
    let mut offset = record_header_size(schema);
    for column in schema.columns() {
        offsets.push(offset);
        offset += column.column_type().fixed_width();
    }
    offsets
}

pub const fn page_header_size() -> usize {
    PAGE_HEADER_SIZE
}

/// Cached layout of one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLayout {
    null_bitmap_size: usize,
    record_header_size: usize,
    fixed_record_size: usize,
    column_offsets: Vec<usize>,
}

impl PageLayout {
    pub fn new(schema: &Schema) -> Self {
        Self {
            null_bitmap_size: null_bitmap_size(schema),
            record_header_size: record_header_size(schema),
            fixed_record_size: fixed_record_size(schema),
            column_offsets: column_offsets(schema),
        }
    }

    pub fn null_bitmap_size(&self) -> usize {
        self.null_bitmap_size
    }

    pub fn record_header_size(&self) -> usize {
        self.record_header_size
    }

    pub fn fixed_record_size(&self) -> usize {
        self.fixed_record_size
    }

    pub fn column_offset(&self, col_idx: usize) -> usize {
        self.column_offsets[col_idx]
    }

    pub fn column_offsets(&self) -> &[usize] {
        &self.column_offsets
    }

    /// Offset of the null bitmap relative to the start of a record.
    pub fn null_bitmap_offset(&self) -> usize {
        RECORD_SIZE_FIELD
    }

    /// Smallest buffer capacity that holds the page header and one record.
    pub fn min_page_capacity(&self) -> usize {
        PAGE_HEADER_SIZE + self.fixed_record_size
    }
}

/// Null bitmap scratch sized for up to 256 columns without spilling to the heap.
pub type NullBitmap = SmallVec<[u8; 32]>;

pub fn new_null_bitmap(size: usize, all_null: bool) -> NullBitmap {
    let fill = if all_null { 0xFF } else { 0x00 };
    smallvec::smallvec![fill; size]
}

#[inline]
pub fn is_null_bit(bitmap: &[u8], col_idx: usize) -> bool {
    bitmap[col_idx >> 3] & (1 << (col_idx & 7)) != 0
}

#[inline]
pub fn set_null_bit(bitmap: &mut [u8], col_idx: usize) {
    bitmap[col_idx >> 3] |= 1 << (col_idx & 7);
}

#[inline]
pub fn clear_null_bit(bitmap: &mut [u8], col_idx: usize) {
    bitmap[col_idx >> 3] &= !(1 << (col_idx & 7));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn schema_of(types: &[Type]) -> Schema {
        let mut builder = Schema::builder();
        for (i, t) in types.iter().enumerate() {
            builder = builder.add(format!("c{}", i), *t);
        }
        builder.build().unwrap()
    }

    #[test]
    fn bitmap_size_rounds_up() {
        assert_eq!(null_bitmap_size(&schema_of(&[])), 0);
        assert_eq!(null_bitmap_size(&schema_of(&[Type::Long; 1])), 1);
        assert_eq!(null_bitmap_size(&schema_of(&[Type::Long; 8])), 1);
        assert_eq!(null_bitmap_size(&schema_of(&[Type::Long; 9])), 2);
    }

    #[test]
    fn offsets_follow_record_header() {
        let schema = schema_of(&[Type::Boolean, Type::Long, Type::String, Type::Timestamp, Type::Json]);
        assert_eq!(record_header_size(&schema), 5);
        assert_eq!(column_offsets(&schema), vec![5, 6, 14, 18, 30]);
        assert_eq!(fixed_record_size(&schema), 5 + 1 + 8 + 4 + 12 + 4);
    }

    #[test]
    fn layout_caches_calculator_results() {
        let schema = schema_of(&[Type::Boolean, Type::Long, Type::String]);
        let layout = PageLayout::new(&schema);
        assert_eq!(layout.null_bitmap_size(), 1);
        assert_eq!(layout.record_header_size(), 5);
        assert_eq!(layout.fixed_record_size(), 18);
        assert_eq!(layout.column_offsets(), &[5, 6, 14]);
        assert_eq!(layout.min_page_capacity(), 22);
        assert_eq!(page_header_size(), 4);
    }

    #[test]
    fn bitmap_bits_address_byte_and_bit() {
        let mut bitmap = new_null_bitmap(2, false);
        set_null_bit(&mut bitmap, 9);
        assert_eq!(bitmap.as_slice(), &[0x00, 0x02]);
        assert!(is_null_bit(&bitmap, 9));
        assert!(!is_null_bit(&bitmap, 1));
        clear_null_bit(&mut bitmap, 9);
        assert_eq!(bitmap.as_slice(), &[0x00, 0x00]);

        let all = new_null_bitmap(1, true);
        assert!(is_null_bit(&all, 7));
    }
}
