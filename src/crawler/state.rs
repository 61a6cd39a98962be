//! Crawl engine state definitions
//!
//! A run moves through these states strictly in order: pages one at a time,
//! records within a page one at a time.

use std::fmt;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Catalog loaded, no page requested yet
    Start,

    /// Downloading listing page `n`
    FetchingPage(u32),

    /// Turning page `n` into records
    ExtractingRecords(u32),

    /// Handling record `index` (0-based) of page `page`
    ProcessingRecord { page: u32, index: usize },

    /// Every record of page `n` handled
    PageDone(u32),

    /// Pagination over; the catalog is about to be saved
    Finished,
}

impl CrawlState {
    /// Returns true if the engine may move from `self` to `next`
    pub fn can_transition_to(&self, next: &CrawlState) -> bool {
        use CrawlState::*;

        match (*self, *next) {
            (Start, FetchingPage(1)) => true,
            (FetchingPage(n), ExtractingRecords(m)) => n == m,
            // fetch failure ends pagination
            (FetchingPage(_), Finished) => true,
            (ExtractingRecords(n), ProcessingRecord { page, index: 0 }) => n == page,
            // an empty page ends pagination
            (ExtractingRecords(_), Finished) => true,
            (ProcessingRecord { page, index }, ProcessingRecord { page: p, index: i }) => {
                page == p && i == index + 1
            }
            (ProcessingRecord { page, .. }, PageDone(n)) => page == n,
            (PageDone(n), FetchingPage(m)) => m == n + 1,
            (PageDone(_), Finished) => true,
            _ => false,
        }
    }

    /// Returns true once pagination has stopped
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The page this state belongs to, if any
    pub fn page(&self) -> Option<u32> {
        match *self {
            Self::FetchingPage(n) | Self::ExtractingRecords(n) | Self::PageDone(n) => Some(n),
            Self::ProcessingRecord { page, .. } => Some(page),
            Self::Start | Self::Finished => None,
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::FetchingPage(n) => write!(f, "fetching_page({})", n),
            Self::ExtractingRecords(n) => write!(f, "extracting_records({})", n),
            Self::ProcessingRecord { page, index } => {
                write!(f, "processing_record({}, {})", page, index)
            }
            Self::PageDone(n) => write!(f, "page_done({})", n),
            Self::Finished => write!(f, "finished"),
        }
    }
}
