//! Sibling-based listing traversal
//!
//! The listing container renders items incrementally as it scrolls, so a
//! missing sibling can mean either "last item" or "not rendered yet". The
//! iterator disambiguates with a single scroll-and-retry before ending the
//! page.

use crate::config::{millis, Config};
use crate::state::PageState;
use crate::surface::{ElementRef, Surface, SurfaceResult};
use std::time::Duration;

/// Forward-only sequence of listing handles on the current page
pub struct ListingIterator<'a> {
    surface: &'a dyn Surface,
    item_selector: String,
    container_selector: String,
    scroll_increment: u32,
    scroll_settle: Duration,
    state: PageState,
    done: bool,
}

impl<'a> ListingIterator<'a> {
    /// Starts at the first listing of page `page_number`
    pub fn new(surface: &'a dyn Surface, config: &Config, page_number: u32) -> Self {
        Self::resume(surface, config, PageState::new(page_number))
    }

    /// Continues after `state.last_listing`, or from the top if there is none
    pub fn resume(surface: &'a dyn Surface, config: &Config, state: PageState) -> Self {
        Self {
            surface,
            item_selector: config.selectors.listing_item.clone(),
            container_selector: config.selectors.listing_container.clone(),
            scroll_increment: config.timing.listing_scroll_increment,
            scroll_settle: millis(config.timing.listing_scroll_settle_ms),
            state,
            done: false,
        }
    }

    pub fn page_state(&self) -> &PageState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Yields the next listing handle
    ///
    /// Returns `Ok(None)` once the page is exhausted; every later call
    /// returns `Ok(None)` without touching the surface. A surface error also
    /// ends the sequence.
    pub async fn next(&mut self) -> SurfaceResult<Option<ElementRef>> {
        if self.done {
            return Ok(None);
        }

        let next = match self.lookup().await {
            Ok(next) => next,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        match next {
            Some(handle) => {
                self.state.advance_to(handle.clone());
                Ok(Some(handle))
            }
            None => {
                tracing::debug!(
                    "No more listings on page {}",
                    self.state.page_number
                );
                self.done = true;
                Ok(None)
            }
        }
    }

    async fn lookup(&self) -> SurfaceResult<Option<ElementRef>> {
        let last = match &self.state.last_listing {
            Some(last) => last,
            None => return self.surface.find(&self.item_selector).await,
        };

        if let Some(sibling) = self.surface.sibling_of(last).await? {
            return Ok(Some(sibling));
        }

        // Not rendered yet or really the last one: scroll once and look again
        let Some(container) = self.surface.find(&self.container_selector).await? else {
            return Ok(None);
        };
        self.surface.scroll(&container, self.scroll_increment).await?;
        self.surface.settle(self.scroll_settle).await;

        self.surface.sibling_of(last).await
    }
}
