//! # Buffer Allocators
//!
//! `BufferAllocator` is the pluggable factory every builder draws its page
//! buffers from. It is the only mutable resource shared between pipeline
//! stages, so implementations are `Send + Sync` and take `&self`.
//!
//! ## Implementations
//!
//! - `HeapAllocator`: a fresh zeroed `Vec` per call, freed on release
//! - `PooledAllocator`: page-sized arrays recycled through a sharded pool,
//!   with an optional cap on outstanding bytes
//!
//! ## Pool Design
//!
//! The pool uses lock sharding (16 shards) to reduce contention when several
//! stage threads allocate at once. `allocate()` picks a shard round-robin;
//! the buffer remembers its shard and returns there on release. Arrays larger
//! than the page size (from `allocate_with_capacity`) are not retained.
//!
//! ## Budget
//!
//! With a memory limit set, every allocation reserves its capacity against an
//! atomic counter before any memory is touched. A reservation that would push
//! the outstanding total past the limit fails with `AllocationError`; the
//! reservation is returned when the buffer is released.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use eyre::{bail, Result};
use parking_lot::Mutex;

use super::Buffer;
use crate::config::{
    AllocatorConfig, BUFFER_POOL_SHARD_COUNT, DEFAULT_PAGE_SIZE, MAX_POOLED_PER_SHARD,
};

pub trait BufferAllocator: Send + Sync {
    /// Allocates an empty buffer of the allocator's default page size.
    fn allocate(&self) -> Result<Buffer> {
        self.allocate_with_capacity(self.page_size())
    }

    /// Allocates an empty buffer with at least `min_capacity` bytes.
    fn allocate_with_capacity(&self, min_capacity: usize) -> Result<Buffer>;

    fn page_size(&self) -> usize;
}

#[derive(Debug)]
pub struct AllocationError {
    pub requested: usize,
    pub available: usize,
}

impl std::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "buffer allocation refused: requested {} bytes but only {} available",
            self.requested, self.available
        )
    }
}

impl std::error::Error for AllocationError {}

#[derive(Debug, Clone, Copy)]
pub struct HeapAllocator {
    page_size: usize,
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl HeapAllocator {
    pub fn new(page_size: usize) -> Self {
        Self { page_size }
    }
}

impl BufferAllocator for HeapAllocator {
    fn allocate_with_capacity(&self, min_capacity: usize) -> Result<Buffer> {
        Ok(Buffer::allocate(min_capacity.max(self.page_size)))
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

#[derive(Clone)]
pub struct PooledAllocator {
    inner: Arc<PoolInner>,
}

pub(crate) struct PoolInner {
    shards: [Mutex<Vec<Vec<u8>>>; BUFFER_POOL_SHARD_COUNT],
    /// Round-robin counter for distributing allocations across shards
    next_shard: AtomicUsize,
    page_size: usize,
    outstanding: AtomicUsize,
    limit: Option<usize>,
}

impl PooledAllocator {
    pub fn new(page_size: usize) -> Self {
        Self::from_config(&AllocatorConfig::new().page_size(page_size))
    }

    pub(crate) fn from_config(config: &AllocatorConfig) -> Self {
        let page_size = config.get_page_size();
        let shards: [Mutex<Vec<Vec<u8>>>; BUFFER_POOL_SHARD_COUNT] =
            std::array::from_fn(|_| Mutex::new(Vec::new()));

        let initial = config.get_pool_capacity();
        let per_shard = initial / BUFFER_POOL_SHARD_COUNT;
        let remainder = initial % BUFFER_POOL_SHARD_COUNT;

        for (i, shard) in shards.iter().enumerate() {
            let count = per_shard + usize::from(i < remainder);
            let mut guard = shard.lock();
            for _ in 0..count.min(MAX_POOLED_PER_SHARD) {
                guard.push(vec![0u8; page_size]);
            }
        }

        Self {
            inner: Arc::new(PoolInner {
                shards,
                next_shard: AtomicUsize::new(0),
                page_size,
                outstanding: AtomicUsize::new(0),
                limit: config.get_memory_limit(),
            }),
        }
    }

    /// Number of idle arrays retained across all shards.
    pub fn available(&self) -> usize {
        self.inner.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Bytes held by buffers that have not been released yet.
    pub fn outstanding_bytes(&self) -> usize {
        self.inner.outstanding.load(Ordering::Acquire)
    }

    pub fn memory_limit(&self) -> Option<usize> {
        self.inner.limit
    }
}

impl BufferAllocator for PooledAllocator {
    fn allocate_with_capacity(&self, min_capacity: usize) -> Result<Buffer> {
        let inner = &self.inner;
        let capacity = min_capacity.max(inner.page_size);
        inner.reserve(capacity)?;

        let shard_idx = inner.next_shard.fetch_add(1, Ordering::Relaxed) % BUFFER_POOL_SHARD_COUNT;
        let recycled = if capacity == inner.page_size {
            inner.shards[shard_idx].lock().pop()
        } else {
            None
        };
        let reused = recycled.is_some();
        let array = recycled.unwrap_or_else(|| vec![0u8; capacity]);

        tracing::trace!(capacity, shard_idx, reused, "allocated page buffer");
        Ok(Buffer::pooled(array, Arc::clone(inner), shard_idx))
    }

    fn page_size(&self) -> usize {
        self.inner.page_size
    }
}

impl std::fmt::Debug for PooledAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledAllocator")
            .field("page_size", &self.inner.page_size)
            .field("outstanding", &self.outstanding_bytes())
            .field("limit", &self.inner.limit)
            .finish()
    }
}

impl PoolInner {
    fn reserve(&self, bytes: usize) -> Result<()> {
        let Some(limit) = self.limit else {
            self.outstanding.fetch_add(bytes, Ordering::AcqRel);
            return Ok(());
        };

        let reserved = self
            .outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let next = current.checked_add(bytes)?;
                (next <= limit).then_some(next)
            });

        if let Err(current) = reserved {
            bail!(AllocationError {
                requested: bytes,
                available: limit.saturating_sub(current),
            });
        }
        Ok(())
    }

    pub(crate) fn recycle(&self, array: Vec<u8>, capacity: usize, shard_idx: usize) {
        self.outstanding.fetch_sub(capacity, Ordering::AcqRel);
        if array.len() != self.page_size {
            return;
        }
        let mut shard = self.shards[shard_idx].lock();
        if shard.len() < MAX_POOLED_PER_SHARD {
            shard.push(array);
            tracing::trace!(shard_idx, "returned page buffer to pool");
        }
    }
}
