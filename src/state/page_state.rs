/// Per-page traversal state
///
/// This module defines the state carried while walking one page of listings
/// and the pagination state machine's states.
use crate::surface::ElementRef;
use std::fmt;

/// Progress through the listings of one result page
///
/// Created at the start of each outer-loop iteration and discarded when
/// pagination advances. `last_listing` is the most recently yielded handle;
/// the next listing is its following sibling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    /// 1-based page number
    pub page_number: u32,

    /// Last listing handed out on this page
    pub last_listing: Option<ElementRef>,
}

impl PageState {
    /// Creates the state for a fresh page
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            last_listing: None,
        }
    }

    /// Returns true if no listing has been yielded on this page yet
    pub fn at_start(&self) -> bool {
        self.last_listing.is_none()
    }

    /// Records `listing` as the most recently yielded handle
    pub fn advance_to(&mut self, listing: ElementRef) {
        self.last_listing = Some(listing);
    }
}

/// States of the pagination state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaginationState {
    /// Listings of page `n` are (or are about to be) on screen
    AtPage(u32),

    /// No further page exists, or it could not be reached
    Exhausted,
}

impl PaginationState {
    /// Returns the current page number, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::AtPage(n) => Some(*n),
            Self::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::AtPage(1)
    }
}

impl fmt::Display for PaginationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtPage(n) => write!(f, "page {}", n),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}
