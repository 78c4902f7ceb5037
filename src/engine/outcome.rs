//! Closed result set of engine steps

use std::fmt;

/// Result of one engine step
///
/// Callers branch on these three cases instead of inspecting errors:
/// a skip abandons the current unit of work, exhaustion ends the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Skip(SkipReason),
    Exhausted,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(value) => Outcome::Success(f(value)),
            Self::Skip(reason) => Outcome::Skip(reason),
            Self::Exhausted => Outcome::Exhausted,
        }
    }
}

/// Why a listing was abandoned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The listing could not be activated
    ClickFailed(String),

    /// The details panel never appeared
    DetailsMissing,

    /// The title never appeared in the details panel
    TitleMissing,

    /// The description region never appeared or could not be read
    DescriptionMissing(String),

    /// The metadata query failed on every attempt
    MetadataUnavailable { attempts: u32, last_error: String },
}

impl SkipReason {
    /// Stable name used for counting and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClickFailed(_) => "click_failed",
            Self::DetailsMissing => "details_missing",
            Self::TitleMissing => "title_missing",
            Self::DescriptionMissing(_) => "description_missing",
            Self::MetadataUnavailable { .. } => "metadata_unavailable",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClickFailed(e) => write!(f, "could not activate listing: {}", e),
            Self::DetailsMissing => write!(f, "details panel did not appear"),
            Self::TitleMissing => write!(f, "title did not appear"),
            Self::DescriptionMissing(e) => write!(f, "description unavailable: {}", e),
            Self::MetadataUnavailable {
                attempts,
                last_error,
            } => write!(
                f,
                "metadata unavailable after {} attempt(s): {}",
                attempts, last_error
            ),
        }
    }
}
