//! Scrape orchestration - the page x listing double loop
//!
//! The orchestrator composes the engine components:
//! - [`PaginationController`] drives the outer loop over result pages
//! - [`ListingIterator`] drives the inner loop over listings on a page
//! - [`RetryPolicy`] guards the metadata query
//! - [`StabilizationDetector`] loads the full description before it is read
//! - [`extract_qualifications`] derives the qualifications text
//!
//! Every assembled record is pushed to the sink before the next listing is
//! activated. Per-listing failures are skips; they never abort the run.

use super::extract::extract_qualifications;
use super::listing::ListingIterator;
use super::outcome::{Outcome, SkipReason};
use super::pagination::PaginationController;
use super::retry::RetryPolicy;
use super::stabilize::StabilizationDetector;
use super::summary::RunSummary;
use crate::config::{millis, Config};
use crate::query::{MetadataQuery, MetadataSchema};
use crate::record::JobRecord;
use crate::sink::RecordSink;
use crate::state::PaginationState;
use crate::surface::{ElementRef, Surface, SurfaceError};

/// Drives one full scrape over every reachable result page
pub struct Orchestrator<'a> {
    surface: &'a dyn Surface,
    query: &'a dyn MetadataQuery,
    sink: &'a dyn RecordSink,
    config: &'a Config,
    schema: MetadataSchema,
    retry: RetryPolicy,
    stabilizer: StabilizationDetector,
}

impl<'a> Orchestrator<'a> {
    /// Creates an orchestrator over already-prepared collaborators
    ///
    /// # Arguments
    ///
    /// * `surface` - A surface showing the first page of results
    /// * `query` - The metadata query backend
    /// * `sink` - Where emitted records go
    /// * `config` - Selectors, timing and retry settings
    pub fn new(
        surface: &'a dyn Surface,
        query: &'a dyn MetadataQuery,
        sink: &'a dyn RecordSink,
        config: &'a Config,
    ) -> Self {
        Self {
            surface,
            query,
            sink,
            config,
            schema: MetadataSchema::from_config(&config.metadata),
            retry: RetryPolicy::from_config(&config.retry),
            stabilizer: StabilizationDetector::from_config(&config.timing),
        }
    }

    /// Runs the scrape until pagination is exhausted
    pub async fn run(&self) -> RunSummary {
        tracing::info!(
            "Starting scrape (query: {}, sink: {})",
            self.query.name(),
            self.sink.name()
        );

        let mut pagination = PaginationController::new(self.config);
        let mut summary = RunSummary::default();

        while let PaginationState::AtPage(page) = pagination.state() {
            summary.pages_visited += 1;
            self.scrape_page(page, &mut summary).await;

            match pagination.advance(self.surface).await {
                PaginationState::AtPage(_) => {
                    self.surface
                        .settle(millis(self.config.timing.page_load_settle_ms))
                        .await;
                }
                PaginationState::Exhausted => break,
            }
        }

        tracing::info!(
            "Scrape complete: {} pages, {} listings, {} records emitted, {} skipped, {} sink failures",
            summary.pages_visited,
            summary.listings_seen,
            summary.records_emitted,
            summary.total_skipped(),
            summary.sink_failures
        );

        summary
    }

    /// Processes every listing of the current page
    pub async fn scrape_page(&self, page: u32, summary: &mut RunSummary) {
        tracing::info!("Scraping page {}", page);

        let mut listings = ListingIterator::new(self.surface, self.config, page);
        let mut index = 0u32;

        loop {
            let handle = match listings.next().await {
                Ok(Some(handle)) => handle,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Page {}: listing lookup failed after {} listings: {}", page, index, e);
                    break;
                }
            };

            index += 1;
            summary.listings_seen += 1;

            match self.process_listing(&handle).await {
                Outcome::Success(record) => self.emit(record, page, index, summary).await,
                Outcome::Skip(reason) => {
                    tracing::warn!(
                        "Page {} listing {}: skipped at {}: {}",
                        page,
                        index,
                        reason.kind(),
                        reason
                    );
                    summary.record_skip(&reason);
                }
                Outcome::Exhausted => {
                    tracing::warn!("Page {} listing {}: browser failed, abandoning page", page, index);
                    break;
                }
            }
        }

        tracing::info!("Page {}: {} listings processed", page, index);
    }

    /// Activates one listing and assembles its record
    pub async fn process_listing(&self, handle: &ElementRef) -> Outcome<JobRecord> {
        let selectors = &self.config.selectors;
        let timing = &self.config.timing;

        if let Err(e) = self.surface.click(handle).await {
            let reason = SkipReason::ClickFailed(e.to_string());
            return step_failed("listing click", e, reason);
        }
        self.surface.settle(millis(timing.listing_settle_ms)).await;

        if let Err(e) = self
            .surface
            .wait_for(&selectors.details_card, millis(timing.details_timeout_ms))
            .await
        {
            return step_failed("details panel", e, SkipReason::DetailsMissing);
        }

        if let Err(e) = self
            .surface
            .wait_for(&selectors.title, millis(timing.title_timeout_ms))
            .await
        {
            return step_failed("title", e, SkipReason::TitleMissing);
        }

        let metadata = match self
            .retry
            .run(self.surface, "metadata query", || {
                self.query.query(self.surface, &self.schema)
            })
            .await
        {
            Outcome::Success(metadata) => metadata,
            Outcome::Skip(reason) => return Outcome::Skip(reason),
            Outcome::Exhausted => return Outcome::Exhausted,
        };

        let description = match self.read_description().await {
            Ok(text) => text,
            Err(e) => {
                let reason = SkipReason::DescriptionMissing(e.to_string());
                return step_failed("description", e, reason);
            }
        };

        let qualifications = extract_qualifications(&description);
        Outcome::Success(JobRecord::from_metadata(
            &metadata,
            description,
            qualifications,
        ))
    }

    /// Waits for the description region, loads it fully and reads it
    async fn read_description(&self) -> crate::surface::SurfaceResult<String> {
        let container = self
            .surface
            .wait_for(
                &self.config.selectors.description_container,
                millis(self.config.timing.description_timeout_ms),
            )
            .await?;

        let stabilized = self.stabilizer.stabilize(self.surface, &container).await?;
        tracing::debug!(
            "Description stabilized at height {} after {} polls ({:?})",
            stabilized.height,
            stabilized.polls,
            stabilized.stop
        );

        Ok(self.surface.read_text(&container).await?.trim().to_string())
    }

    async fn emit(&self, record: JobRecord, page: u32, index: u32, summary: &mut RunSummary) {
        match self.sink.create(&record).await {
            Ok(()) => {
                summary.records_emitted += 1;
                tracing::info!("Page {} listing {}: emitted {}", page, index, record.label());
            }
            Err(e) => {
                summary.sink_failures += 1;
                tracing::error!(
                    "Page {} listing {}: sink {} rejected {}: {}",
                    page,
                    index,
                    self.sink.name(),
                    record.label(),
                    e
                );
            }
        }

        self.surface
            .settle(millis(self.config.timing.post_emit_settle_ms))
            .await;
    }
}

/// Maps a failed surface step to a skip
///
/// A browser failure leaves nothing to skip to, so it ends the page instead.
fn step_failed(step: &str, error: SurfaceError, reason: SkipReason) -> Outcome<JobRecord> {
    if error.is_absence() {
        tracing::debug!("{} did not appear: {}", step, error);
        Outcome::Skip(reason)
    } else if matches!(error, SurfaceError::Browser(_)) {
        tracing::error!("{} failed in the browser: {}", step, error);
        Outcome::Exhausted
    } else {
        tracing::debug!("{} failed: {}", step, error);
        Outcome::Skip(reason)
    }
}
