//! Bounded cross-thread page hand-off.
//!
//! `page_channel(bound)` connects a producing stage to a consuming stage on
//! another thread. Sending a page moves it (and its buffer) into the channel;
//! at most `bound` pages are in flight, so a fast producer blocks in `add`
//! until the consumer catches up.
//!
//! ```text
//! PageBuilder ──add──> ChannelOutput ══ bounded queue ══> ChannelInput ──> PageReader
//!   (stage A thread)                                        (stage B thread)
//! ```
//!
//! `finish` sends an explicit end-of-stream marker. If the output is dropped
//! or closed without it, the input reports `TransferErrorKind::Truncated`
//! rather than a silent end, and a page sent after the input hung up fails
//! with `TransferErrorKind::OutputClosed`. A page that cannot be delivered is
//! dropped, which releases its buffer.

use crossbeam_channel as xchan;
use eyre::{bail, Result};

use super::{PageInput, PageOutput, TransferError, TransferErrorKind};
use crate::page::Page;

enum Message {
    Page(Page),
    Finish,
}

pub fn page_channel(bound: usize) -> (ChannelOutput, ChannelInput) {
    let (tx, rx) = xchan::bounded(bound);
    (
        ChannelOutput {
            tx: Some(tx),
            sent_pages: 0,
            sent_bytes: 0,
        },
        ChannelInput {
            rx,
            finished: false,
            received_pages: 0,
            received_bytes: 0,
        },
    )
}

#[derive(Debug)]
pub struct ChannelOutput {
    tx: Option<xchan::Sender<Message>>,
    sent_pages: u64,
    sent_bytes: u64,
}

impl ChannelOutput {
    pub fn sent_pages(&self) -> u64 {
        self.sent_pages
    }

    pub fn sent_bytes(&self) -> u64 {
        self.sent_bytes
    }

    fn closed_error(&self) -> TransferError {
        TransferError::new(
            TransferErrorKind::OutputClosed,
            self.sent_pages,
            self.sent_bytes,
        )
    }
}

impl PageOutput for ChannelOutput {
    fn add(&mut self, page: Page) -> Result<()> {
        let Some(tx) = &self.tx else {
            bail!(self.closed_error());
        };
        let bytes = page.byte_len() as u64;
        if tx.send(Message::Page(page)).is_err() {
            tracing::warn!(
                sent_pages = self.sent_pages,
                "page input disconnected; dropping page"
            );
            bail!(self.closed_error());
        }
        self.sent_pages += 1;
        self.sent_bytes += bytes;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let Some(tx) = &self.tx else {
            bail!(self.closed_error());
        };
        if tx.send(Message::Finish).is_err() {
            bail!(self.closed_error());
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }
}

pub struct ChannelInput {
    rx: xchan::Receiver<Message>,
    finished: bool,
    received_pages: u64,
    received_bytes: u64,
}

impl ChannelInput {
    pub fn received_pages(&self) -> u64 {
        self.received_pages
    }

    pub fn received_bytes(&self) -> u64 {
        self.received_bytes
    }
}

impl PageInput for ChannelInput {
    fn next_page(&mut self) -> Result<Option<Page>> {
        if self.finished {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(Message::Page(page)) => {
                self.received_pages += 1;
                self.received_bytes += page.byte_len() as u64;
                Ok(Some(page))
            }
            Ok(Message::Finish) => {
                self.finished = true;
                Ok(None)
            }
            Err(xchan::RecvError) => {
                self.finished = true;
                bail!(TransferError::new(
                    TransferErrorKind::Truncated,
                    self.received_pages,
                    self.received_bytes,
                ))
            }
        }
    }
}

impl Iterator for ChannelInput {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page().transpose()
    }
}
