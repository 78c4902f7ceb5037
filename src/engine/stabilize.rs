//! Scroll-driven content stabilization
//!
//! A lazily rendered region keeps growing while it is scrolled. The detector
//! scrolls it in fixed steps and stops once the content height has stopped
//! changing, the scroll position has reached the bottom, or a hard poll
//! ceiling is hit.

use crate::config::{millis, TimingConfig};
use crate::state::ScrollState;
use crate::surface::{ElementRef, Surface, SurfaceResult};
use std::time::Duration;

/// Why a stabilization run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The height was unchanged for the configured number of polls
    Stagnant,

    /// The scroll position reached the end of the content
    ReachedBottom,

    /// The poll ceiling was hit while the content was still changing
    PollCeiling,
}

/// Result of one stabilization run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stabilization {
    /// Last observed content height
    pub height: u64,

    /// Number of scroll-settle-read polls performed
    pub polls: u32,

    pub stop: StopReason,
}

/// Decides when a scrollable region has finished loading content
#[derive(Debug, Clone)]
pub struct StabilizationDetector {
    increment: u32,
    settle: Duration,
    stagnant_polls: u32,
    max_polls: u32,
}

impl StabilizationDetector {
    pub fn new(increment: u32, settle: Duration, stagnant_polls: u32, max_polls: u32) -> Self {
        Self {
            increment,
            settle,
            stagnant_polls: stagnant_polls.max(1),
            max_polls: max_polls.max(1),
        }
    }

    pub fn from_config(timing: &TimingConfig) -> Self {
        Self::new(
            timing.description_scroll_increment,
            millis(timing.description_settle_ms),
            timing.stagnant_polls,
            timing.max_stabilization_polls,
        )
    }

    /// Scrolls `container` until its content height is committed
    ///
    /// # Arguments
    ///
    /// * `surface` - The surface rendering the container
    /// * `container` - The scrollable region to stabilize
    ///
    /// # Returns
    ///
    /// * `Ok(Stabilization)` - The committed height and how the run ended
    /// * `Err(SurfaceError)` - A scroll or read failed
    pub async fn stabilize(
        &self,
        surface: &dyn Surface,
        container: &ElementRef,
    ) -> SurfaceResult<Stabilization> {
        let mut state = ScrollState::new(surface.read_height(container).await?);
        let mut polls = 0;

        loop {
            surface.scroll(container, self.increment).await?;
            surface.settle(self.settle).await;

            let height = surface.read_height(container).await?;
            let offset = surface.read_scroll_offset(container).await?;
            state.observe(height);
            polls += 1;

            tracing::trace!(
                "Stabilization poll {}: height={} offset={} stagnant={}",
                polls,
                height,
                offset,
                state.stagnant_count
            );

            let stop = if state.is_stagnant(self.stagnant_polls) {
                Some(StopReason::Stagnant)
            } else if offset + u64::from(self.increment) >= height {
                Some(StopReason::ReachedBottom)
            } else if polls >= self.max_polls {
                tracing::warn!(
                    "Container {} still changing after {} polls, using height {}",
                    container,
                    polls,
                    height
                );
                Some(StopReason::PollCeiling)
            } else {
                None
            };

            if let Some(stop) = stop {
                return Ok(Stabilization {
                    height: state.last_height,
                    polls,
                    stop,
                });
            }
        }
    }
}
