//! In-memory page output.

use std::collections::VecDeque;

use eyre::{ensure, Result};

use super::{PageInput, PageOutput};
use crate::page::Page;

#[derive(Debug, Default)]
pub struct PageCollector {
    pages: VecDeque<Page>,
    finished: bool,
    closed: bool,
}

impl PageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn into_pages(self) -> Vec<Page> {
        self.pages.into()
    }
}

impl PageOutput for PageCollector {
    fn add(&mut self, page: Page) -> Result<()> {
        ensure!(!self.closed, "page collector is closed");
        self.pages.push_back(page);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl PageInput for PageCollector {
    fn next_page(&mut self) -> Result<Option<Page>> {
        Ok(self.pages.pop_front())
    }
}
