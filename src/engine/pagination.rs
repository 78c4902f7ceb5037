//! Numbered pagination state machine

use crate::config::{millis, Config};
use crate::state::PaginationState;
use crate::surface::{Surface, SurfaceError, SurfaceResult};
use std::time::Duration;

/// Label of the control tried when no current-page indicator is shown
const FALLBACK_LABEL: &str = "2";

/// Moves from page N to page N+1 by activating the numbered control
///
/// Starts in `AtPage(1)`. Lookup or activation failures are fail-closed:
/// they end the traversal as `Exhausted` instead of aborting the run.
#[derive(Debug, Clone)]
pub struct PaginationController {
    indicator_selector: String,
    control_selector: String,
    settle: Duration,
    state: PaginationState,
}

impl PaginationController {
    pub fn new(config: &Config) -> Self {
        Self {
            indicator_selector: config.selectors.current_page.clone(),
            control_selector: config.selectors.page_control.clone(),
            settle: millis(config.timing.pagination_settle_ms),
            state: PaginationState::default(),
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    /// Activates the control for the next page
    ///
    /// Returns the new state. Once `Exhausted`, further calls do nothing.
    pub async fn advance(&mut self, surface: &dyn Surface) -> PaginationState {
        if self.state.is_exhausted() {
            return self.state;
        }

        self.state = match self.try_advance(surface).await {
            Ok(Some(page)) => {
                tracing::info!("Advanced to page {}", page);
                PaginationState::AtPage(page)
            }
            Ok(None) => {
                tracing::info!("No further page control after {}", self.state);
                PaginationState::Exhausted
            }
            Err(e) => {
                tracing::warn!("Pagination failed after {}: {}", self.state, e);
                PaginationState::Exhausted
            }
        };
        self.state
    }

    async fn try_advance(&self, surface: &dyn Surface) -> SurfaceResult<Option<u32>> {
        let (label, next_page) = match surface.find(&self.indicator_selector).await? {
            Some(indicator) => {
                let text = surface.read_text(&indicator).await?;
                let current = parse_page_label(&text)?;
                let next = current.checked_add(1).ok_or_else(|| {
                    SurfaceError::Script(format!("no page follows page {current}"))
                })?;
                (next.to_string(), next)
            }
            None => {
                tracing::debug!("No current-page indicator, trying control \"{FALLBACK_LABEL}\"");
                (FALLBACK_LABEL.to_string(), 2)
            }
        };

        let Some(control) = surface.find_by_text(&self.control_selector, &label).await? else {
            return Ok(None);
        };

        surface.click(&control).await?;
        surface.settle(self.settle).await;
        Ok(Some(next_page))
    }
}

/// Parses the trimmed label of a pagination control as a page number
fn parse_page_label(text: &str) -> SurfaceResult<u32> {
    let trimmed = text.trim();
    trimmed.parse::<u32>().ok().filter(|n| *n >= 1).ok_or_else(|| {
        SurfaceError::Script(format!(
            "page indicator label `{trimmed}` is not a page number"
        ))
    })
}
