//! # Pipeline Boundary
//!
//! Pipeline stages exchange pages through two small traits:
//!
//! - `PageOutput`: the sink a `PageBuilder` pushes finished pages into
//! - `PageInput`: the source a stage pulls pages from, in encoding order
//!
//! Ownership of a `Page` moves through `add`; once handed over, the producer
//! never sees it again. End-of-stream is `finish` on the output side and
//! `Ok(None)` on the input side.
//!
//! ## Implementations
//!
//! | Type | Role |
//! |------|------|
//! | `PageCollector` | In-memory output that can be drained as an input |
//! | `ChannelOutput` / `ChannelInput` | Bounded cross-thread hand-off from `page_channel` |

mod channel;
mod collector;
mod error;

pub use channel::{page_channel, ChannelInput, ChannelOutput};
pub use collector::PageCollector;
pub use error::{TransferError, TransferErrorKind};

use eyre::Result;

use crate::page::Page;

pub trait PageOutput {
    /// Takes ownership of a finished page.
    fn add(&mut self, page: Page) -> Result<()>;

    /// No more pages will arrive.
    fn finish(&mut self) -> Result<()>;

    /// Releases resources regardless of completion state.
    fn close(&mut self) -> Result<()>;
}

pub trait PageInput {
    /// The next page, or `None` once the producer has finished.
    fn next_page(&mut self) -> Result<Option<Page>>;
}

impl<T: PageOutput + ?Sized> PageOutput for &mut T {
    fn add(&mut self, page: Page) -> Result<()> {
        (**self).add(page)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: PageOutput + ?Sized> PageOutput for Box<T> {
    fn add(&mut self, page: Page) -> Result<()> {
        (**self).add(page)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: PageInput + ?Sized> PageInput for &mut T {
    fn next_page(&mut self) -> Result<Option<Page>> {
        (**self).next_page()
    }
}
