//! # Value Types
//!
//! - `data_type`: the closed `Type` enum and its inline widths
//! - `timestamp`: `Timestamp` (epoch seconds + nanoseconds)
//! - `value`: `Value`, an owned dynamically typed column value

mod data_type;
mod timestamp;
mod value;

pub use data_type::Type;
pub use timestamp::{Timestamp, NANOS_PER_SECOND};
pub use value::Value;
