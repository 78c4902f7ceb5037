//! Chromium-backed surface using chromiumoxide
//!
//! Element handles are keys stamped into a `data-harvest-key` attribute on
//! the element itself. Lookups, reads and scrolls are evaluated scripts that
//! resolve the key back to the node, so a handle goes stale exactly when the
//! page drops or re-renders the node.

use super::{ElementRef, Settle, Surface, SurfaceError, SurfaceResult};
use crate::config::BrowserConfig as BrowserSettings;
use crate::session::{SessionState, StoredCookie};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Attribute used to pin element handles to DOM nodes
const KEY_ATTRIBUTE: &str = "data-harvest-key";

/// How often `wait_for` re-checks the page
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Finds the Chromium binary to launch
///
/// Order: `SCROLL_HARVEST_CHROME` environment variable, then the configured
/// path. `None` lets chromiumoxide fall back to its own detection.
pub fn find_chromium(settings: &BrowserSettings) -> Option<PathBuf> {
    if let Ok(p) = std::env::var("SCROLL_HARVEST_CHROME") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("SCROLL_HARVEST_CHROME points to a missing file: {}", p);
    }

    settings.chrome_path.clone().filter(|p| p.exists())
}

/// Result envelope for scripts evaluated against a keyed element
#[derive(Debug, Deserialize)]
struct Probe<T> {
    found: bool,
    value: Option<T>,
}

/// A single Chromium tab driven through the DevTools protocol
pub struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    next_key: AtomicU64,
}

impl ChromiumSurface {
    /// Launches Chromium and opens a blank tab
    pub async fn launch(settings: &BrowserSettings) -> SurfaceResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(settings.window_width, settings.window_height)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(path) = find_chromium(settings) {
            tracing::debug!("Using Chromium at {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| SurfaceError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SurfaceError::Browser(format!("failed to launch Chromium: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SurfaceError::Browser(format!("failed to open tab: {e}")))?;

        tracing::info!(
            "Chromium launched ({})",
            if settings.headless { "headless" } else { "headed" }
        );

        Ok(Self {
            browser,
            page,
            handler,
            next_key: AtomicU64::new(0),
        })
    }

    /// Closes the browser and stops the protocol handler
    pub async fn close(mut self) -> SurfaceResult<()> {
        let result = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| SurfaceError::Browser(e.to_string()));
        self.handler.abort();
        result
    }

    fn fresh_key(&self) -> String {
        format!("h{}", self.next_key.fetch_add(1, Ordering::Relaxed))
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> SurfaceResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| SurfaceError::Browser(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| SurfaceError::Script(format!("{e:?}")))
    }

    /// Evaluates `expression` with `el` bound to the keyed element
    async fn probe<T: DeserializeOwned>(
        &self,
        element: &ElementRef,
        expression: &str,
    ) -> SurfaceResult<T> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return {{ found: false }};
                return {{ found: true, value: ({expression}) }};
            }})()"#,
            selector = js_string(&key_selector(element)),
        );

        let probe: Probe<T> = self.eval(&script).await?;
        if !probe.found {
            return Err(SurfaceError::Stale(element.key().to_string()));
        }
        probe
            .value
            .ok_or_else(|| SurfaceError::Script(format!("no value for `{expression}`")))
    }

    async fn element(&self, element: &ElementRef) -> SurfaceResult<chromiumoxide::Element> {
        self.page
            .find_element(key_selector(element))
            .await
            .map_err(|_| SurfaceError::Stale(element.key().to_string()))
    }
}

/// Quotes a Rust string as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn key_selector(element: &ElementRef) -> String {
    format!("[{}=\"{}\"]", KEY_ATTRIBUTE, element.key())
}

/// Script fragment that stamps `target` with a key (unless it has one) and returns it
fn stamp(target: &str, key: &str) -> String {
    format!(
        r#"(() => {{
            const t = {target};
            if (!t) return "";
            if (!t.getAttribute("{attr}")) t.setAttribute("{attr}", {key});
            return t.getAttribute("{attr}");
        }})()"#,
        attr = KEY_ATTRIBUTE,
        key = js_string(key),
    )
}

/// Origin a stored cookie belongs to, so it can be installed from any page
fn cookie_url(cookie: &StoredCookie) -> String {
    format!(
        "https://{}{}",
        cookie.domain.trim_start_matches('.'),
        cookie.path
    )
}

fn non_empty(key: String) -> Option<ElementRef> {
    if key.is_empty() {
        None
    } else {
        Some(ElementRef::new(key))
    }
}

impl Settle for ChromiumSurface {}

#[async_trait]
impl Surface for ChromiumSurface {
    async fn navigate(&self, url: &str) -> SurfaceResult<()> {
        tracing::debug!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| SurfaceError::Browser(format!("navigation to {url} failed: {e}")))?;
        if let Err(e) = self.page.wait_for_navigation().await {
            tracing::trace!("Navigation to {} did not settle: {}", url, e);
        }
        Ok(())
    }

    async fn find(&self, selector: &str) -> SurfaceResult<Option<ElementRef>> {
        let target = format!("document.querySelector({})", js_string(selector));
        let key: String = self.eval(&stamp(&target, &self.fresh_key())).await?;
        Ok(non_empty(key))
    }

    async fn find_all(&self, selector: &str) -> SurfaceResult<Vec<ElementRef>> {
        let script = format!(
            r#"Array.from(document.querySelectorAll({selector})).map((el, i) => {{
                if (!el.getAttribute("{attr}")) el.setAttribute("{attr}", {prefix} + "-" + i);
                return el.getAttribute("{attr}");
            }})"#,
            selector = js_string(selector),
            attr = KEY_ATTRIBUTE,
            prefix = js_string(&self.fresh_key()),
        );
        let keys: Vec<String> = self.eval(&script).await?;
        Ok(keys.into_iter().map(ElementRef::new).collect())
    }

    async fn find_by_text(
        &self,
        selector: &str,
        label: &str,
    ) -> SurfaceResult<Option<ElementRef>> {
        let target = format!(
            r#"Array.from(document.querySelectorAll({selector}))
                .find((el) => (el.innerText || el.textContent || "").trim() === {label})"#,
            selector = js_string(selector),
            label = js_string(label.trim()),
        );
        let key: String = self.eval(&stamp(&target, &self.fresh_key())).await?;
        Ok(non_empty(key))
    }

    async fn click(&self, element: &ElementRef) -> SurfaceResult<()> {
        self.element(element)
            .await?
            .click()
            .await
            .map_err(|e| SurfaceError::Browser(format!("click failed: {e}")))?;
        Ok(())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> SurfaceResult<()> {
        let el = self.element(element).await?;
        el.click()
            .await
            .map_err(|e| SurfaceError::Browser(format!("focus failed: {e}")))?;
        el.type_str(text)
            .await
            .map_err(|e| SurfaceError::Browser(format!("typing failed: {e}")))?;
        Ok(())
    }

    async fn press_enter(&self, element: &ElementRef) -> SurfaceResult<()> {
        self.element(element)
            .await?
            .press_key("Enter")
            .await
            .map_err(|e| SurfaceError::Browser(format!("key press failed: {e}")))?;
        Ok(())
    }

    async fn scroll(&self, element: &ElementRef, delta: u32) -> SurfaceResult<()> {
        let _: bool = self
            .probe(element, &format!("(el.scrollBy(0, {delta}), true)"))
            .await?;
        Ok(())
    }

    async fn read_height(&self, element: &ElementRef) -> SurfaceResult<u64> {
        self.probe(element, "Math.max(0, Math.round(el.scrollHeight))")
            .await
    }

    async fn read_scroll_offset(&self, element: &ElementRef) -> SurfaceResult<u64> {
        self.probe(element, "Math.max(0, Math.round(el.scrollTop))")
            .await
    }

    async fn read_text(&self, element: &ElementRef) -> SurfaceResult<String> {
        self.probe(element, "el.innerText || el.textContent || \"\"")
            .await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> SurfaceResult<ElementRef> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.find(selector).await {
                Ok(Some(element)) => return Ok(element),
                Ok(None) => {}
                // The document may be mid-navigation; keep polling until the deadline.
                Err(e) => tracing::trace!("wait_for({}) probe failed: {}", selector, e),
            }

            if Instant::now() >= deadline {
                return Err(SurfaceError::Timeout {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(WAIT_POLL_INTERVAL).await;
        }
    }

    async fn sibling_of(&self, element: &ElementRef) -> SurfaceResult<Option<ElementRef>> {
        let key: String = self
            .probe(element, &stamp("el.nextElementSibling", &self.fresh_key()))
            .await?;
        Ok(non_empty(key))
    }

    async fn content(&self) -> SurfaceResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| SurfaceError::Browser(format!("failed to read page HTML: {e}")))
    }

    async fn save_session(&self) -> SurfaceResult<SessionState> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| SurfaceError::Browser(format!("failed to read cookies: {e}")))?;

        let cookies = cookies
            .into_iter()
            .map(|c| StoredCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect();

        Ok(SessionState::new(cookies))
    }

    async fn restore_session(&self, state: &SessionState) -> SurfaceResult<()> {
        let mut params = Vec::with_capacity(state.cookies.len());
        for cookie in &state.cookies {
            let param = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .url(cookie_url(cookie))
                .domain(cookie.domain.clone())
                .path(cookie.path.clone())
                .secure(cookie.secure)
                .http_only(cookie.http_only)
                .build()
                .map_err(|e| SurfaceError::Browser(format!("invalid cookie {}: {e}", cookie.name)))?;
            params.push(param);
        }

        self.page
            .set_cookies(params)
            .await
            .map_err(|e| SurfaceError::Browser(format!("failed to install cookies: {e}")))?;
        tracing::debug!("Restored {} session cookies", state.cookies.len());
        Ok(())
    }
}
