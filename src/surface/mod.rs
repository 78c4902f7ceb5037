//! Rendering surface abstraction
//!
//! The engine never talks to a browser directly. Every navigation, lookup,
//! scroll and read goes through the [`Surface`] trait so the traversal logic
//! can be driven by a real Chromium page or by a scripted test double.
//!
//! Elements are referenced through [`ElementRef`], an opaque key owned by the
//! surface. A key becomes stale once the surface re-renders the element.

mod chromium;
#[cfg(test)]
pub(crate) mod testing;

pub use chromium::{find_chromium, ChromiumSurface};

use crate::session::SessionState;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors reported by a rendering surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("Timed out after {timeout_ms}ms waiting for `{selector}`")]
    Timeout { selector: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Stale element handle: {0}")]
    Stale(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Script returned an unexpected value: {0}")]
    Script(String),
}

impl SurfaceError {
    /// Returns true if this error means "the element is not there (yet)"
    pub fn is_absence(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::NotFound(_))
    }
}

/// Result type for surface operations
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Opaque reference to one rendered element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The surface-specific key identifying the element
    pub fn key(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-duration pause inserted after an action
///
/// Every "wait for the page to catch up" point in the engine goes through
/// this trait, which lets tests record waits instead of sleeping.
#[async_trait]
pub trait Settle: Send + Sync {
    async fn settle(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Settle implementation backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSettle;

impl Settle for TokioSettle {}

/// Synchronous-in-effect operations on the live page
///
/// Calls are awaited one at a time by a single driver; implementations do
/// not need to support concurrent use of the same page.
#[async_trait]
pub trait Surface: Settle {
    /// Navigates the page to `url`
    async fn navigate(&self, url: &str) -> SurfaceResult<()>;

    /// Returns the first element matching `selector`, if any
    async fn find(&self, selector: &str) -> SurfaceResult<Option<ElementRef>>;

    /// Returns every element matching `selector` in DOM order
    async fn find_all(&self, selector: &str) -> SurfaceResult<Vec<ElementRef>>;

    /// Returns the first element matching `selector` whose trimmed text equals `label`
    async fn find_by_text(&self, selector: &str, label: &str)
        -> SurfaceResult<Option<ElementRef>>;

    /// Activates the element
    async fn click(&self, element: &ElementRef) -> SurfaceResult<()>;

    /// Types `text` into an input element
    async fn fill(&self, element: &ElementRef, text: &str) -> SurfaceResult<()>;

    /// Presses Enter while the element has focus
    async fn press_enter(&self, element: &ElementRef) -> SurfaceResult<()>;

    /// Scrolls the element's content vertically by `delta` pixels
    async fn scroll(&self, element: &ElementRef, delta: u32) -> SurfaceResult<()>;

    /// Total content height of a scrollable element
    async fn read_height(&self, element: &ElementRef) -> SurfaceResult<u64>;

    /// Current vertical scroll offset of a scrollable element
    async fn read_scroll_offset(&self, element: &ElementRef) -> SurfaceResult<u64>;

    /// Rendered text of the element
    async fn read_text(&self, element: &ElementRef) -> SurfaceResult<String>;

    /// Waits until an element matching `selector` exists
    ///
    /// Fails with [`SurfaceError::Timeout`] once `timeout` elapses.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> SurfaceResult<ElementRef>;

    /// The element immediately following `element` among its siblings
    async fn sibling_of(&self, element: &ElementRef) -> SurfaceResult<Option<ElementRef>>;

    /// Serialized HTML of the whole page
    async fn content(&self) -> SurfaceResult<String>;

    /// Captures the authenticated session (cookies)
    async fn save_session(&self) -> SurfaceResult<SessionState>;

    /// Installs a previously captured session
    async fn restore_session(&self, state: &SessionState) -> SurfaceResult<()>;
}
