//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `PageState`: the page being walked and the last listing handed out on it
//! - `PaginationState`: states of the pagination state machine
//! - `ScrollState`: height readings of one stabilization run

mod page_state;
mod scroll_state;

// Re-export main types
pub use page_state::{PageState, PaginationState};
pub use scroll_state::ScrollState;
