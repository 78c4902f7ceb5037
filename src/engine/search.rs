//! Search bootstrap: opens the start page and submits the keyword search

use crate::config::{millis, SearchConfig};
use crate::surface::Surface;
use crate::{HarvestError, Result};

/// Navigates to the start page and runs the configured search
///
/// Leaves the surface on the first page of results.
pub async fn start_search(surface: &dyn Surface, search: &SearchConfig) -> Result<()> {
    tracing::info!("Searching for \"{}\" on {}", search.keywords, search.start_url);

    surface.navigate(&search.start_url).await?;

    let input = surface.find(&search.input_selector).await?.ok_or_else(|| {
        HarvestError::Search(format!(
            "search input `{}` not found on {}",
            search.input_selector, search.start_url
        ))
    })?;

    surface.fill(&input, &search.keywords).await?;
    surface.press_enter(&input).await?;
    surface.settle(millis(search.settle_ms)).await;

    Ok(())
}
