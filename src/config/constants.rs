//! # Page Engine Configuration Constants
//!
//! This module centralizes the numeric constants that shape page buffers and
//! the flush policy. Constants that depend on each other are co-located and
//! their relationships are enforced through compile-time assertions.
//!
//! ## Dependency Graph
//!
//! ```text
//! DEFAULT_PAGE_SIZE (32 KB)
//!       │
//!       ├─> PAGE_HEADER_SIZE (4 bytes, record count)
//!       │
//!       └─> MIN_PAGE_SIZE (must be >= header + one minimal record)
//!
//! RECORD_SIZE_FIELD (4 bytes)
//!       │
//!       └─> record header = RECORD_SIZE_FIELD + null bitmap
//!
//! STRING_REFERENCE_BYTES_PER_UNIT / STRING_REFERENCE_OVERHEAD
//! JSON_REFERENCE_SIZE_ESTIMATE
//!       │
//!       └─> flush trigger: position + fixed record + reference estimate > capacity
//!
//! BUFFER_POOL_SHARD_COUNT (16)
//!       │
//!       └─> DEFAULT_POOL_CAPACITY (distributed evenly across shards)
//! ```
//!
//! ## Reference Size Estimates
//!
//! String and JSON values live outside the page buffer, so their cost is
//! estimated rather than measured. Strings are charged
//! `len * STRING_REFERENCE_BYTES_PER_UNIT + STRING_REFERENCE_OVERHEAD`, JSON
//! values a flat `JSON_REFERENCE_SIZE_ESTIMATE`. The estimate only decides
//! *when* a page is flushed; it never affects the encoded layout.

// ============================================================================
// PAGE LAYOUT CONSTANTS
// ============================================================================

/// Default capacity of a page buffer in bytes (32KB).
pub const DEFAULT_PAGE_SIZE: usize = 32 * 1024;

/// Smallest page capacity an allocator will hand out.
pub const MIN_PAGE_SIZE: usize = 64;

/// Size of the page header: a 4-byte record count.
pub const PAGE_HEADER_SIZE: usize = 4;

/// Size of the per-record span field that precedes the null bitmap.
pub const RECORD_SIZE_FIELD: usize = 4;

/// Inline width of a String/Json slot (index into the page reference list).
pub const REFERENCE_INDEX_SIZE: usize = 4;

const _: () = assert!(
    DEFAULT_PAGE_SIZE >= MIN_PAGE_SIZE,
    "DEFAULT_PAGE_SIZE must be >= MIN_PAGE_SIZE"
);

const _: () = assert!(
    MIN_PAGE_SIZE > PAGE_HEADER_SIZE + RECORD_SIZE_FIELD,
    "MIN_PAGE_SIZE must hold the page header and one record header"
);

// ============================================================================
// FLUSH POLICY ESTIMATES
// ============================================================================

/// Estimated bytes charged per string character unit.
pub const STRING_REFERENCE_BYTES_PER_UNIT: usize = 2;

/// Fixed bookkeeping bytes charged per string reference.
pub const STRING_REFERENCE_OVERHEAD: usize = 4;

/// Flat estimate charged per JSON reference.
pub const JSON_REFERENCE_SIZE_ESTIMATE: usize = 256;

// ============================================================================
// BUFFER POOL CONFIGURATION
// ============================================================================

/// Number of shards for the buffer pool to reduce lock contention.
pub const BUFFER_POOL_SHARD_COUNT: usize = 16;

/// Buffers pre-allocated by `AllocatorConfig::default()`.
pub const DEFAULT_POOL_CAPACITY: usize = BUFFER_POOL_SHARD_COUNT;

/// Retained buffers per shard; buffers returned beyond this are freed.
pub const MAX_POOLED_PER_SHARD: usize = 8;

const _: () = assert!(
    DEFAULT_POOL_CAPACITY <= BUFFER_POOL_SHARD_COUNT * MAX_POOLED_PER_SHARD,
    "DEFAULT_POOL_CAPACITY must fit in the retained pool"
);
