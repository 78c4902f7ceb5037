//! Traversal and extraction engine
//!
//! # Components
//!
//! - `StabilizationDetector`: decides when a lazily growing region is loaded
//! - `extract_qualifications`: fallback chain over description text
//! - `RetryPolicy`: bounded-attempt wrapper for the metadata query
//! - `ListingIterator`: sibling-based listing sequence for one page
//! - `PaginationController`: page N to page N+1 state machine
//! - `Orchestrator`: the page x listing double loop

mod extract;
mod listing;
mod orchestrator;
mod outcome;
mod pagination;
mod retry;
mod search;
mod stabilize;
mod summary;

pub use extract::{extract_qualifications, find_sections, QualificationSections};
pub use listing::ListingIterator;
pub use orchestrator::Orchestrator;
pub use outcome::{Outcome, SkipReason};
pub use pagination::PaginationController;
pub use retry::RetryPolicy;
pub use search::start_search;
pub use stabilize::{Stabilization, StabilizationDetector, StopReason};
pub use summary::RunSummary;
