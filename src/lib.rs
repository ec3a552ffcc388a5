//! # pagestream - Record-Batch Pages for Bulk Data Transfer
//!
//! pagestream is the in-process batch format that flows between the stages
//! of a bulk data-transfer pipeline (readers, filters, writers). Records are
//! encoded into pooled byte buffers with a schema-derived fixed layout, so
//! producing and consuming a record allocates nothing beyond the out-of-band
//! string and JSON values it carries.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pagestream::{HeapAllocator, PageBuilder, PageCollector, PageReader, Schema, Type};
//!
//! let schema = Schema::builder()
//!     .add("ok", Type::Boolean)
//!     .add("n", Type::Long)
//!     .add("name", Type::String)
//!     .build()?;
//! let allocator = HeapAllocator::default();
//!
//! let mut builder = PageBuilder::new(&schema, &allocator, PageCollector::new());
//! builder.set_boolean(0, true)?;
//! builder.set_long(1, 42)?;
//! builder.set_string(2, "hi")?;
//! builder.add_record()?;
//! let pages = builder.finish()?.into_pages();
//!
//! let mut reader = PageReader::new(&schema);
//! for page in pages {
//!     reader.set_page(page)?;
//!     while reader.next_record()? {
//!         assert_eq!(reader.get_long(1)?, Some(42));
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   pipeline: PageOutput / PageInput / channel  │
//! ├──────────────────────────────────────────────┤
//! │   page: PageBuilder ─> Page ─> PageReader     │
//! ├──────────────────────┬───────────────────────┤
//! │   layout: offsets     │   buffer: allocators  │
//! ├──────────────────────┴───────────────────────┤
//! │   schema / types: Column, Schema, Type        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: Size constants and `AllocatorConfig`
//! - [`types`]: `Type`, `Timestamp`, `Value`
//! - [`schema`]: `Column`, `Schema`, JSON wire form
//! - [`layout`]: Layout calculator and page/record headers
//! - [`buffer`]: `Buffer` and the `BufferAllocator` implementations
//! - [`page`]: `Page`, `PageBuilder`, `PageReader`
//! - [`pipeline`]: Stage boundary traits, channel hand-off, `TransferError`

#[macro_use]
mod macros;

pub mod buffer;
pub mod config;
pub mod layout;
pub mod page;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use buffer::{AllocationError, Buffer, BufferAllocator, HeapAllocator, PooledAllocator};
pub use config::AllocatorConfig;
pub use page::{build_pages, read_values, Page, PageBuilder, PageReader};
pub use pipeline::{
    page_channel, ChannelInput, ChannelOutput, PageCollector, PageInput, PageOutput,
    TransferError, TransferErrorKind,
};
pub use schema::{Column, Schema, SchemaBuilder};
pub use types::{Timestamp, Type, Value};
