use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Scroll-Harvest
///
/// Every section falls back to defaults tuned for the LinkedIn jobs search
/// page, so an empty file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub search: SearchConfig,
    pub browser: BrowserConfig,
    pub session: SessionConfig,
    pub selectors: SelectorConfig,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
    pub metadata: MetadataConfig,
    pub sink: SinkConfig,
}

/// Where the traversal starts and what it searches for
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Page holding the search form
    pub start_url: String,

    /// Search terms typed into the search input
    pub keywords: String,

    /// Selector of the search input
    pub input_selector: String,

    /// Wait after submitting the search (milliseconds)
    pub settle_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start_url: "https://www.linkedin.com/jobs/".to_string(),
            keywords: "Data Analyst".to_string(),
            input_selector: "input[aria-label='Search by title, skill, or company']".to_string(),
            settle_ms: 2000,
        }
    }
}

/// Browser launch options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    pub headless: bool,

    /// Explicit Chromium binary; autodetected when absent
    pub chrome_path: Option<PathBuf>,

    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            window_width: 1280,
            window_height: 900,
        }
    }
}

/// Session persistence and the login form used to create it
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Path of the saved session file
    pub path: String,

    pub login_url: String,
    pub email_selector: String,
    pub password_selector: String,
    pub submit_selector: String,

    /// Wait after filling each login field (milliseconds)
    pub field_settle_ms: u64,

    /// Wait after submitting the login form (milliseconds)
    pub post_login_settle_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: "linkedin_login.json".to_string(),
            login_url:
                "https://www.linkedin.com/login?fromSignIn=true&trk=guest_homepage-basic_nav-header-signin"
                    .to_string(),
            email_selector: "input#username".to_string(),
            password_selector: "input#password".to_string(),
            submit_selector: "button[type='submit']".to_string(),
            field_settle_ms: 300,
            post_login_settle_ms: 3000,
        }
    }
}

/// Structural selectors of the listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Scrollable container holding the listings
    pub listing_container: String,

    /// Listing items; the first match starts each page
    pub listing_item: String,

    /// Details panel that appears after a listing is activated
    pub details_card: String,

    /// Title inside the details panel
    pub title: String,

    /// Scrollable region holding the full description
    pub description_container: String,

    /// Pagination control marking the current page
    pub current_page: String,

    /// Pagination controls, matched by their label
    pub page_control: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            listing_container: ".jobs-search-results-list".to_string(),
            listing_item: ".jobs-search-results-list li".to_string(),
            details_card:
                ".job-details-jobs-unified-top-card, .jobs-unified-top-card, .jobs-search__job-details"
                    .to_string(),
            title: ".job-details-jobs-unified-top-card__job-title, h2[class*='job-title']"
                .to_string(),
            description_container: "div.jobs-search__job-details--wrapper".to_string(),
            current_page: "button[aria-current='true']".to_string(),
            page_control: "button".to_string(),
        }
    }
}

/// Settle intervals, timeouts and scroll increments
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimingConfig {
    /// Wait after activating a listing
    pub listing_settle_ms: u64,

    /// Wait after a record has been emitted
    pub post_emit_settle_ms: u64,

    pub details_timeout_ms: u64,
    pub title_timeout_ms: u64,
    pub description_timeout_ms: u64,

    /// Pixels scrolled per stabilization poll
    pub description_scroll_increment: u32,

    /// Wait between a stabilization scroll and the next reading
    pub description_settle_ms: u64,

    /// Consecutive unchanged heights that count as stable
    pub stagnant_polls: u32,

    /// Hard ceiling on stabilization polls
    pub max_stabilization_polls: u32,

    /// Pixels scrolled when the listing container runs out of siblings
    pub listing_scroll_increment: u32,

    pub listing_scroll_settle_ms: u64,

    /// Wait after activating a pagination control
    pub pagination_settle_ms: u64,

    /// Additional wait before scraping a newly opened page
    pub page_load_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            listing_settle_ms: 1000,
            post_emit_settle_ms: 300,
            details_timeout_ms: 5000,
            title_timeout_ms: 3000,
            description_timeout_ms: 10000,
            description_scroll_increment: 200,
            description_settle_ms: 500,
            stagnant_polls: 3,
            max_stabilization_polls: 100,
            listing_scroll_increment: 300,
            listing_scroll_settle_ms: 1000,
            pagination_settle_ms: 1500,
            page_load_settle_ms: 2000,
        }
    }
}

impl TimingConfig {
    /// Configuration with every wait set to zero (for tests and dry runs)
    pub fn immediate() -> Self {
        Self {
            listing_settle_ms: 0,
            post_emit_settle_ms: 0,
            description_settle_ms: 0,
            listing_scroll_settle_ms: 0,
            pagination_settle_ms: 0,
            page_load_settle_ms: 0,
            ..Self::default()
        }
    }
}

/// Converts a millisecond setting into a `Duration`
pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Bounded retry of the metadata query
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 2000,
        }
    }
}

/// Which metadata query backend resolves the schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataProvider {
    /// Resolve selectors against the page HTML locally
    #[default]
    Selectors,

    /// Send the schema and page HTML to the AgentQL API
    AgentQl,
}

/// One named metadata field bound to a selector
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    pub selector: String,
}

impl FieldConfig {
    fn new(name: &str, selector: &str) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// Metadata query schema and backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MetadataConfig {
    pub provider: MetadataProvider,

    /// Name of the object the fields are grouped under
    pub root: String,

    pub agentql_endpoint: String,

    pub fields: Vec<FieldConfig>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            provider: MetadataProvider::Selectors,
            root: "job_details".to_string(),
            agentql_endpoint: "https://api.agentql.com/v1/query-data".to_string(),
            fields: vec![
                FieldConfig::new(
                    "org_name",
                    ".job-details-jobs-unified-top-card__company-name",
                ),
                FieldConfig::new("job_title", ".job-details-jobs-unified-top-card__job-title"),
                FieldConfig::new("salary", ".job-details-jobs-unified-top-card__salary"),
                FieldConfig::new(
                    "location",
                    ".job-details-jobs-unified-top-card__primary-description",
                ),
                FieldConfig::new(
                    "date_posted",
                    ".job-details-jobs-unified-top-card__posted-date",
                ),
            ],
        }
    }
}

/// Record sink backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Airtable,
    Sqlite,
}

/// Where emitted records go
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Base URL of the Airtable REST API
    pub airtable_endpoint: String,

    /// Path to the SQLite database file
    pub database_path: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Airtable,
            airtable_endpoint: "https://api.airtable.com/v0".to_string(),
            database_path: "./jobs.db".to_string(),
        }
    }
}
