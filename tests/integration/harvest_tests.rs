//! Integration tests for the scrape engine
//!
//! These tests drive the orchestrator against a scripted job site that
//! implements the public `Surface` trait, and use wiremock for the HTTP
//! backends.

use async_trait::async_trait;
use scroll_harvest::config::{
    AirtableTarget, Config, Credentials, MetadataProvider, SelectorConfig, SinkKind,
    TimingConfig,
};
use scroll_harvest::engine::{Orchestrator, RunSummary};
use scroll_harvest::query::{build_query, MetadataQuery, MetadataSchema, QueryResult, SelectorQuery};
use scroll_harvest::record::{JobRecord, Metadata};
use scroll_harvest::session::SessionState;
use scroll_harvest::sink::{build_sink, AirtableSink, RecordSink, SinkResult, SqliteSink};
use scroll_harvest::surface::{ElementRef, Settle, Surface, SurfaceError, SurfaceResult};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTINGS_PER_PAGE: u32 = 3;

/// A paginated job site with a fixed number of fully rendered listings per page
struct MockSite {
    selectors: SelectorConfig,
    pages: u32,
    state: Mutex<SiteState>,
}

#[derive(Default)]
struct SiteState {
    page: u32,
    active_listing: Option<String>,
    page_clicks: u32,
}

impl MockSite {
    fn new(selectors: SelectorConfig, pages: u32) -> Self {
        Self {
            selectors,
            pages,
            state: Mutex::new(SiteState {
                page: 1,
                ..SiteState::default()
            }),
        }
    }

    fn page_clicks(&self) -> u32 {
        self.state.lock().unwrap().page_clicks
    }

    fn current_page(&self) -> u32 {
        self.state.lock().unwrap().page
    }

    fn listing_key(page: u32, index: u32) -> String {
        format!("p{}-l{}", page, index)
    }

    fn parse_listing(key: &str) -> Option<(u32, u32)> {
        let (page, index) = key.strip_prefix('p')?.split_once("-l")?;
        Some((page.parse().ok()?, index.parse().ok()?))
    }

    fn active_listing(&self) -> SurfaceResult<String> {
        self.state
            .lock()
            .unwrap()
            .active_listing
            .clone()
            .ok_or_else(|| SurfaceError::NotFound("no listing is active".to_string()))
    }
}

#[async_trait]
impl Settle for MockSite {
    async fn settle(&self, _duration: Duration) {}
}

#[async_trait]
impl Surface for MockSite {
    async fn navigate(&self, _url: &str) -> SurfaceResult<()> {
        Ok(())
    }

    async fn find(&self, selector: &str) -> SurfaceResult<Option<ElementRef>> {
        let s = &self.selectors;
        let page = self.current_page();
        let found = if selector == s.listing_item {
            Some(Self::listing_key(page, 1))
        } else if selector == s.listing_container {
            Some("list".to_string())
        } else if selector == s.current_page {
            Some("current-page".to_string())
        } else {
            None
        };
        Ok(found.map(ElementRef::new))
    }

    async fn find_all(&self, selector: &str) -> SurfaceResult<Vec<ElementRef>> {
        Ok(self.find(selector).await?.into_iter().collect())
    }

    async fn find_by_text(
        &self,
        selector: &str,
        label: &str,
    ) -> SurfaceResult<Option<ElementRef>> {
        if selector != self.selectors.page_control {
            return Ok(None);
        }
        let wanted: u32 = match label.parse() {
            Ok(n) => n,
            Err(_) => return Ok(None),
        };
        if (2..=self.pages).contains(&wanted) {
            Ok(Some(ElementRef::new(format!("page-{}", wanted))))
        } else {
            Ok(None)
        }
    }

    async fn click(&self, element: &ElementRef) -> SurfaceResult<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(page) = element.key().strip_prefix("page-") {
            state.page = page
                .parse()
                .map_err(|_| SurfaceError::Stale(element.to_string()))?;
            state.page_clicks += 1;
            state.active_listing = None;
        } else {
            state.active_listing = Some(element.key().to_string());
        }
        Ok(())
    }

    async fn fill(&self, _element: &ElementRef, _text: &str) -> SurfaceResult<()> {
        Ok(())
    }

    async fn press_enter(&self, _element: &ElementRef) -> SurfaceResult<()> {
        Ok(())
    }

    async fn scroll(&self, _element: &ElementRef, _delta: u32) -> SurfaceResult<()> {
        Ok(())
    }

    async fn read_height(&self, _element: &ElementRef) -> SurfaceResult<u64> {
        Ok(1200)
    }

    async fn read_scroll_offset(&self, _element: &ElementRef) -> SurfaceResult<u64> {
        Ok(1100)
    }

    async fn read_text(&self, element: &ElementRef) -> SurfaceResult<String> {
        match element.key() {
            "current-page" => Ok(self.current_page().to_string()),
            "description" => {
                let listing = self.active_listing()?;
                Ok(format!(
                    "About the role {listing}.\n\nMinimum Qualifications:\nSQL\n\nPreferred Qualifications:\ndbt\n"
                ))
            }
            other => Err(SurfaceError::Stale(other.to_string())),
        }
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> SurfaceResult<ElementRef> {
        let s = &self.selectors;
        let key = if selector == s.details_card {
            "details"
        } else if selector == s.title {
            "title"
        } else if selector == s.description_container {
            "description"
        } else {
            return Err(SurfaceError::Timeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        };
        self.active_listing()?;
        Ok(ElementRef::new(key))
    }

    async fn sibling_of(&self, element: &ElementRef) -> SurfaceResult<Option<ElementRef>> {
        let (page, index) = Self::parse_listing(element.key())
            .ok_or_else(|| SurfaceError::Stale(element.to_string()))?;
        if index < LISTINGS_PER_PAGE {
            Ok(Some(ElementRef::new(Self::listing_key(page, index + 1))))
        } else {
            Ok(None)
        }
    }

    async fn content(&self) -> SurfaceResult<String> {
        let listing = self.active_listing()?;
        Ok(format!(
            r#"<html><body>
                <h1 class="job-details-jobs-unified-top-card__job-title">Analyst {listing}</h1>
                <div class="job-details-jobs-unified-top-card__company-name">Acme</div>
                <span class="job-details-jobs-unified-top-card__salary">$90,000</span>
            </body></html>"#
        ))
    }

    async fn save_session(&self) -> SurfaceResult<SessionState> {
        Ok(SessionState::new(Vec::new()))
    }

    async fn restore_session(&self, _state: &SessionState) -> SurfaceResult<()> {
        Ok(())
    }
}

/// Query returning the same metadata for every listing
struct MockQuery {
    calls: AtomicU32,
}

#[async_trait]
impl MetadataQuery for MockQuery {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, _surface: &dyn Surface, _schema: &MetadataSchema) -> QueryResult<Metadata> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let mut metadata = Metadata::new();
        metadata.insert("org_name".to_string(), Some("Acme".to_string()));
        metadata.insert("job_title".to_string(), Some(format!("Analyst #{}", n)));
        Ok(metadata)
    }
}

/// Sink keeping every record in memory
#[derive(Default)]
struct MemorySink {
    records: Mutex<Vec<JobRecord>>,
    finished: Mutex<Option<RunSummary>>,
}

#[async_trait]
impl RecordSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create(&self, record: &JobRecord) -> SinkResult<()> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn finish(&self, summary: &RunSummary) -> SinkResult<()> {
        *self.finished.lock().unwrap() = Some(summary.clone());
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        timing: TimingConfig::immediate(),
        ..Config::default()
    }
}

#[tokio::test]
async fn test_two_pages_of_three_listings() {
    let config = test_config();
    let site = MockSite::new(config.selectors.clone(), 2);
    let query = MockQuery {
        calls: AtomicU32::new(0),
    };
    let sink = MemorySink::default();

    let summary = Orchestrator::new(&site, &query, &sink, &config).run().await;
    sink.finish(&summary).await.unwrap();

    let records = sink.records.lock().unwrap();
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| !r.job_description.is_empty()));
    assert!(records
        .iter()
        .all(|r| r.qualifications == "Minimum Qualifications:\nSQL\n\nPreferred Qualifications:\ndbt"));
    assert!(records[0].job_description.contains("p1-l1"));
    assert!(records[5].job_description.contains("p2-l3"));

    // One page-control activation between the pages, none after page 2
    assert_eq!(site.page_clicks(), 1);
    assert_eq!(site.current_page(), 2);

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.listings_seen, 6);
    assert_eq!(summary.records_emitted, 6);
    assert_eq!(summary.total_skipped(), 0);
    assert_eq!(query.calls.load(Ordering::SeqCst), 6);
    assert_eq!(sink.finished.lock().unwrap().as_ref(), Some(&summary));
}

#[tokio::test]
async fn test_selector_query_into_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.sink.kind = SinkKind::Sqlite;
    config.sink.database_path = dir.path().join("jobs.db").display().to_string();

    let site = MockSite::new(config.selectors.clone(), 1);
    let query = SelectorQuery::new();
    let sink = build_sink(&config, &Credentials::default(), "test-hash").unwrap();

    let summary = Orchestrator::new(&site, &query, sink.as_ref(), &config)
        .run()
        .await;
    sink.finish(&summary).await.unwrap();
    assert_eq!(summary.records_emitted, 3);
    drop(sink);

    let stats = SqliteSink::open_for_stats(dir.path().join("jobs.db").as_path()).unwrap();
    assert_eq!(stats.count_records().unwrap(), 3);
    assert_eq!(stats.top_organizations(1).unwrap(), vec![("Acme".to_string(), 3)]);
    let run = stats.latest_completed_run().unwrap().unwrap();
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.records_emitted, 3);
}

#[tokio::test]
async fn test_agentql_into_airtable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/query-data"))
        .and(header("X-API-Key", "agentql-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "job_details": {
                    "org_name": "Acme",
                    "job_title": "Data Analyst",
                    "salary": 95000,
                    "location": "Remote",
                    "date_posted": null
                }
            }
        })))
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v0/appBase/Jobs"))
        .and(header("Authorization", "Bearer airtable-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "rec1"})))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.metadata.provider = MetadataProvider::AgentQl;
    config.metadata.agentql_endpoint = format!("{}/v1/query-data", server.uri());
    let credentials = Credentials::from_lookup(|key| match key {
        "AGENTQL_API_KEY" => Some("agentql-key".to_string()),
        _ => None,
    });

    let site = MockSite::new(config.selectors.clone(), 1);
    let query = build_query(&config, &credentials).unwrap();
    let sink = AirtableSink::new(
        &format!("{}/v0", server.uri()),
        &AirtableTarget {
            api_key: "airtable-key",
            base_id: "appBase",
            table_name: "Jobs",
        },
    )
    .unwrap();

    let summary = Orchestrator::new(&site, query.as_ref(), &sink, &config)
        .run()
        .await;

    assert_eq!(summary.records_emitted, 3);
    assert_eq!(summary.sink_failures, 0);

    let received = server.received_requests().await.unwrap();
    let airtable_bodies: Vec<serde_json::Value> = received
        .iter()
        .filter(|r| r.url.path().starts_with("/v0/"))
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(airtable_bodies.len(), 3);
    assert_eq!(airtable_bodies[0]["fields"]["salary"], json!("95000"));
    assert!(airtable_bodies[0]["fields"].get("date_posted").is_none());
}

#[tokio::test]
async fn test_sink_rejections_do_not_stop_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(422).set_body_string("INVALID_VALUE_FOR_COLUMN"))
        .mount(&server)
        .await;

    let config = test_config();
    let site = MockSite::new(config.selectors.clone(), 2);
    let query = MockQuery {
        calls: AtomicU32::new(0),
    };
    let sink = AirtableSink::new(
        &server.uri(),
        &AirtableTarget {
            api_key: "key",
            base_id: "app",
            table_name: "Jobs",
        },
    )
    .unwrap();

    let summary = Orchestrator::new(&site, &query, &sink, &config).run().await;

    assert_eq!(summary.pages_visited, 2);
    assert_eq!(summary.records_emitted, 0);
    assert_eq!(summary.sink_failures, 6);
}
