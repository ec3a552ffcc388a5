//! # Configuration
//!
//! Centralized constants plus the `AllocatorConfig` builder used to set up the
//! shared buffer allocator of a pipeline run.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation
//!
//! ## Usage
//!
//! ```ignore
//! let allocator = AllocatorConfig::new()
//!     .page_size(64 * 1024)
//!     .pool_capacity(32)
//!     .memory_limit(16 * 1024 * 1024)
//!     .build()?;
//! ```

pub mod constants;
pub use constants::*;

use eyre::{ensure, Result};

use crate::buffer::PooledAllocator;

/// Builder for the pipeline-wide `PooledAllocator`.
///
/// | Option        | Default             | Description                          |
/// |---------------|---------------------|--------------------------------------|
/// | page_size     | `DEFAULT_PAGE_SIZE` | Capacity of buffers from `allocate()`|
/// | pool_capacity | `DEFAULT_POOL_CAPACITY` | Buffers pre-allocated up front   |
/// | memory_limit  | unlimited           | Cap on bytes outstanding at once     |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorConfig {
    page_size: usize,
    pool_capacity: usize,
    memory_limit: Option<usize>,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocatorConfig {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            memory_limit: None,
        }
    }

    pub fn page_size(mut self, bytes: usize) -> Self {
        self.page_size = bytes;
        self
    }

    pub fn pool_capacity(mut self, buffers: usize) -> Self {
        self.pool_capacity = buffers;
        self
    }

    /// Caps the bytes held by outstanding buffers. Allocations beyond the
    /// cap fail with `AllocationError`.
    pub fn memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    pub fn get_page_size(&self) -> usize {
        self.page_size
    }

    pub fn get_pool_capacity(&self) -> usize {
        self.pool_capacity
    }

    pub fn get_memory_limit(&self) -> Option<usize> {
        self.memory_limit
    }

    pub fn build(self) -> Result<PooledAllocator> {
        ensure!(
            self.page_size >= MIN_PAGE_SIZE,
            "page size {} is below the minimum of {} bytes",
            self.page_size,
            MIN_PAGE_SIZE
        );
        if let Some(limit) = self.memory_limit {
            ensure!(
                limit >= self.page_size,
                "memory limit {} cannot hold a single {}-byte page",
                limit,
                self.page_size
            );
        }
        Ok(PooledAllocator::from_config(&self))
    }
}
