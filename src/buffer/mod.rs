//! # Buffers
//!
//! A `Buffer` is the unit of memory ownership for pages: a byte region with a
//! start offset, a capacity and a filled length ("limit"). It is owned by
//! exactly one component at a time: the builder while it is being filled, the
//! `Page` after a flush, the reader while it is being decoded. Moving the
//! `Buffer` value is the hand-off; it is never shared.
//!
//! ## Layout
//!
//! ```text
//! array: [ .......... | filled bytes ......... | free ........ | .... ]
//!                     ^ offset                 ^ offset+limit  ^ offset+capacity
//! ```
//!
//! Invariant: `0 <= limit <= capacity <= array.len() - offset`.
//!
//! ## Release
//!
//! `release()` hands the backing array back to the allocator that produced it
//! and is idempotent. `Drop` calls it too, so every exit path (normal finish,
//! error, abandonment) returns memory exactly once. A released buffer has zero
//! capacity; any read or write after release panics.
//!
//! ## Equality
//!
//! Two buffers are equal when their filled regions hold the same bytes,
//! regardless of backing array, offset or capacity. `Hash` agrees.

mod allocator;

pub use allocator::{AllocationError, BufferAllocator, HeapAllocator, PooledAllocator};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use eyre::{ensure, Result};

use allocator::PoolInner;

pub struct Buffer {
    array: Vec<u8>,
    offset: usize,
    filled: usize,
    capacity: usize,
    origin: Option<Origin>,
    released: bool,
}

struct Origin {
    pool: Arc<PoolInner>,
    shard_idx: usize,
}

impl Buffer {
    /// Allocates an empty, pool-free buffer of exactly `size` bytes.
    pub fn allocate(size: usize) -> Self {
        Self::from_array(vec![0u8; size], 0, 0, size)
    }

    /// Wraps `array` as a buffer whose whole length is filled.
    pub fn wrap(array: Vec<u8>) -> Self {
        let len = array.len();
        Self::from_array(array, 0, len, len)
    }

    pub fn copy_of(bytes: &[u8]) -> Self {
        Self::wrap(bytes.to_vec())
    }

    /// Wraps `array[offset..offset + capacity]` with `limit` bytes filled.
    pub fn wrap_region(array: Vec<u8>, offset: usize, capacity: usize, limit: usize) -> Result<Self> {
        ensure!(
            offset + capacity <= array.len(),
            "buffer region {}..{} exceeds backing array of {} bytes",
            offset,
            offset + capacity,
            array.len()
        );
        ensure!(
            limit <= capacity,
            "buffer limit {} exceeds capacity {}",
            limit,
            capacity
        );
        Ok(Self::from_array(array, offset, offset + limit, capacity))
    }

    fn from_array(array: Vec<u8>, offset: usize, filled: usize, capacity: usize) -> Self {
        Self {
            array,
            offset,
            filled,
            capacity,
            origin: None,
            released: false,
        }
    }

    pub(crate) fn pooled(array: Vec<u8>, pool: Arc<PoolInner>, shard_idx: usize) -> Self {
        let capacity = array.len();
        Self {
            array,
            offset: 0,
            filled: 0,
            capacity,
            origin: Some(Origin { pool, shard_idx }),
            released: false,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of filled bytes.
    pub fn limit(&self) -> usize {
        self.filled - self.offset
    }

    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        ensure!(
            limit <= self.capacity,
            "buffer limit {} exceeds capacity {}",
            limit,
            self.capacity
        );
        self.filled = self.offset + limit;
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The filled bytes, `[offset, offset + limit)`.
    pub fn as_slice(&self) -> &[u8] {
        &self.array[self.offset..self.filled]
    }

    /// The whole writable region, `[offset, offset + capacity)`.
    pub fn region(&self) -> &[u8] {
        &self.array[self.offset..self.offset + self.capacity]
    }

    fn region_mut(&mut self) -> &mut [u8] {
        let end = self.offset + self.capacity;
        &mut self.array[self.offset..end]
    }

    /// Copies `src` to `index`. Panics if the write leaves the capacity.
    #[inline]
    pub fn set_bytes(&mut self, index: usize, src: &[u8]) {
        self.region_mut()[index..index + src.len()].copy_from_slice(src);
    }

    /// Copies `dst.len()` bytes starting at `index` into `dst`.
    #[inline]
    pub fn get_bytes(&self, index: usize, dst: &mut [u8]) {
        dst.copy_from_slice(&self.region()[index..index + dst.len()]);
    }

    #[inline]
    pub fn set_u8(&mut self, index: usize, value: u8) {
        self.region_mut()[index] = value;
    }

    #[inline]
    pub fn get_u8(&self, index: usize) -> u8 {
        self.region()[index]
    }

    #[inline]
    pub fn set_u32(&mut self, index: usize, value: u32) {
        self.set_bytes(index, &value.to_le_bytes());
    }

    #[inline]
    pub fn get_u32(&self, index: usize) -> u32 {
        let mut bytes = [0u8; 4];
        self.get_bytes(index, &mut bytes);
        u32::from_le_bytes(bytes)
    }

    #[inline]
    pub fn set_i64(&mut self, index: usize, value: i64) {
        self.set_bytes(index, &value.to_le_bytes());
    }

    #[inline]
    pub fn get_i64(&self, index: usize) -> i64 {
        let mut bytes = [0u8; 8];
        self.get_bytes(index, &mut bytes);
        i64::from_le_bytes(bytes)
    }

    #[inline]
    pub fn set_f64(&mut self, index: usize, value: f64) {
        self.set_bytes(index, &value.to_le_bytes());
    }

    #[inline]
    pub fn get_f64(&self, index: usize) -> f64 {
        let mut bytes = [0u8; 8];
        self.get_bytes(index, &mut bytes);
        f64::from_le_bytes(bytes)
    }

    /// Returns the backing array to its allocator. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.is_released() {
            return;
        }
        let array = std::mem::take(&mut self.array);
        let capacity = self.capacity;
        self.released = true;
        self.offset = 0;
        self.filled = 0;
        self.capacity = 0;
        if let Some(origin) = self.origin.take() {
            origin.pool.recycle(array, capacity, origin.shard_idx);
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Buffer {}

impl Hash for Buffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("offset", &self.offset)
            .field("limit", &self.limit())
            .field("capacity", &self.capacity)
            .field("pooled", &self.origin.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(buffer: &Buffer) -> u64 {
        let mut hasher = DefaultHasher::new();
        buffer.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn allocate_is_empty() {
        let buffer = Buffer::allocate(64);
        assert_eq!(buffer.limit(), 0);
        assert_eq!(buffer.capacity(), 64);
        assert!(buffer.as_slice().is_empty());
    }

    #[test]
    fn set_limit_bounds_checked() {
        let mut buffer = Buffer::allocate(16);
        buffer.set_limit(16).unwrap();
        let err = buffer.set_limit(17).unwrap_err();
        assert!(err.to_string().contains("exceeds capacity"));
        assert_eq!(buffer.limit(), 16);
    }

    #[test]
    fn typed_accessors_round_trip() {
        let mut buffer = Buffer::allocate(32);
        buffer.set_u32(0, 7);
        buffer.set_i64(4, -42);
        buffer.set_f64(12, 2.5);
        buffer.set_u8(20, 1);
        assert_eq!(buffer.get_u32(0), 7);
        assert_eq!(buffer.get_i64(4), -42);
        assert_eq!(buffer.get_f64(12), 2.5);
        assert_eq!(buffer.get_u8(20), 1);
    }

    #[test]
    #[should_panic]
    fn write_past_capacity_panics() {
        let array = vec![0u8; 16];
        let mut buffer = Buffer::wrap_region(array, 4, 8, 0).unwrap();
        buffer.set_u32(6, 1);
    }

    #[test]
    fn offset_region_addresses_relative_to_offset() {
        let array = vec![9u8; 16];
        let mut buffer = Buffer::wrap_region(array, 4, 8, 0).unwrap();
        buffer.set_u32(0, 0x0A0B_0C0D);
        buffer.set_limit(4).unwrap();
        assert_eq!(buffer.as_slice(), &[0x0D, 0x0C, 0x0B, 0x0A]);
    }

    #[test]
    fn wrap_region_rejects_bad_bounds() {
        assert!(Buffer::wrap_region(vec![0u8; 8], 4, 8, 0).is_err());
        assert!(Buffer::wrap_region(vec![0u8; 8], 0, 4, 5).is_err());
    }

    #[test]
    fn equality_uses_filled_content_only() {
        let a = Buffer::copy_of(b"abcd");
        let mut b = Buffer::wrap_region(b"xxabcdyy".to_vec(), 2, 6, 4).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        b.set_u8(0, b'z');
        assert_ne!(a, b);
    }

    #[test]
    fn release_is_idempotent() {
        let mut buffer = Buffer::copy_of(b"data");
        buffer.release();
        assert!(buffer.is_released());
        buffer.release();
        assert_eq!(buffer.capacity(), 0);
        assert_eq!(buffer.limit(), 0);
    }
}
