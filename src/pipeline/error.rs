//! Transfer failures at the page boundary.
//!
//! Contract violations (wrong-typed setters, reading without a current
//! record) are plain `eyre` errors. Failures that happen while pages move
//! between a builder and its collaborators are a `TransferError` instead, so
//! a caller can tell them apart with `downcast_ref` and see how much had
//! already gone through before deciding whether partial progress is usable.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferErrorKind {
    /// The allocator refused a new page buffer.
    AllocatorExhausted { requested: usize, available: usize },
    /// The receiving side of an output went away.
    OutputClosed,
    /// The sending side went away without signalling end-of-stream.
    Truncated,
    /// The output refused the page.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferError {
    pub kind: TransferErrorKind,
    pub transferred_pages: u64,
    pub transferred_bytes: u64,
}

impl TransferError {
    pub fn new(kind: TransferErrorKind, transferred_pages: u64, transferred_bytes: u64) -> Self {
        Self {
            kind,
            transferred_pages,
            transferred_bytes,
        }
    }
}

impl fmt::Display for TransferErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferErrorKind::AllocatorExhausted {
                requested,
                available,
            } => write!(
                f,
                "allocator exhausted: requested {} bytes, {} available",
                requested, available
            ),
            TransferErrorKind::OutputClosed => f.write_str("page output closed"),
            TransferErrorKind::Truncated => f.write_str("page stream ended without finish"),
            TransferErrorKind::Rejected(reason) => write!(f, "page rejected: {}", reason),
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} after {} pages ({} bytes) transferred",
            self.kind, self.transferred_pages, self.transferred_bytes
        )
    }
}

impl std::error::Error for TransferError {}
