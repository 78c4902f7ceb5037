//! Scripted surface used by the engine's unit tests

use super::{ElementRef, Settle, Surface, SurfaceError, SurfaceResult};
use crate::session::SessionState;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct Script {
    /// selector -> first matching element
    selectors: HashMap<String, String>,
    /// (selector, label) -> element
    labelled: HashMap<(String, String), String>,
    /// element -> rendered text
    texts: HashMap<String, String>,
    /// element -> following sibling
    siblings: HashMap<String, String>,
    /// siblings that only appear after the given container was scrolled
    deferred: HashMap<String, Vec<(String, String)>>,
    /// height readings (the last one repeats)
    heights: VecDeque<u64>,
    /// scroll offset readings (the last one repeats)
    offsets: VecDeque<u64>,
    failing: HashSet<String>,
    /// elements whose handle went stale before they could be clicked
    stale: HashSet<String>,
    calls: Vec<String>,
    waits: Vec<Duration>,
    cookies: Option<SessionState>,
}

/// In-memory surface whose DOM is declared up front
#[derive(Default)]
pub(crate) struct FakeSurface {
    script: Mutex<Script>,
}

impl FakeSurface {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_element(self, selector: &str, key: &str) -> Self {
        self.lock()
            .selectors
            .insert(selector.to_string(), key.to_string());
        self
    }

    pub(crate) fn with_labelled(self, selector: &str, label: &str, key: &str) -> Self {
        self.lock().labelled.insert(
            (selector.to_string(), label.to_string()),
            key.to_string(),
        );
        self
    }

    pub(crate) fn with_text(self, key: &str, text: &str) -> Self {
        self.lock().texts.insert(key.to_string(), text.to_string());
        self
    }

    /// Declares `keys` as consecutive siblings
    pub(crate) fn with_siblings(self, keys: &[&str]) -> Self {
        {
            let mut script = self.lock();
            for pair in keys.windows(2) {
                script
                    .siblings
                    .insert(pair[0].to_string(), pair[1].to_string());
            }
        }
        self
    }

    /// `after -> key` becomes a sibling link only once `container` is scrolled
    pub(crate) fn with_deferred_sibling(self, container: &str, after: &str, key: &str) -> Self {
        self.lock()
            .deferred
            .entry(container.to_string())
            .or_default()
            .push((after.to_string(), key.to_string()));
        self
    }

    pub(crate) fn with_heights(self, heights: &[u64]) -> Self {
        self.lock().heights = heights.iter().copied().collect();
        self
    }

    pub(crate) fn with_offsets(self, offsets: &[u64]) -> Self {
        self.lock().offsets = offsets.iter().copied().collect();
        self
    }

    /// Every lookup of `selector`, or click on the element keyed `selector`,
    /// fails with a browser error
    pub(crate) fn failing(self, selector: &str) -> Self {
        self.lock().failing.insert(selector.to_string());
        self
    }

    /// Clicking `key` reports a stale handle
    pub(crate) fn with_stale(self, key: &str) -> Self {
        self.lock().stale.insert(key.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub(crate) fn count_calls(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.lock().waits.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    fn record(&self, call: String) {
        self.lock().calls.push(call);
    }

    fn check(&self, selector: &str) -> SurfaceResult<()> {
        if self.lock().failing.contains(selector) {
            return Err(SurfaceError::Browser(format!("scripted failure for {selector}")));
        }
        Ok(())
    }
}

fn next_reading(queue: &mut VecDeque<u64>) -> u64 {
    if queue.len() > 1 {
        queue.pop_front().unwrap_or_default()
    } else {
        queue.front().copied().unwrap_or_default()
    }
}

#[async_trait]
impl Settle for FakeSurface {
    async fn settle(&self, duration: Duration) {
        self.lock().waits.push(duration);
    }
}

#[async_trait]
impl Surface for FakeSurface {
    async fn navigate(&self, url: &str) -> SurfaceResult<()> {
        self.record(format!("navigate {url}"));
        Ok(())
    }

    async fn find(&self, selector: &str) -> SurfaceResult<Option<ElementRef>> {
        self.record(format!("find {selector}"));
        self.check(selector)?;
        Ok(self.lock().selectors.get(selector).map(ElementRef::new))
    }

    async fn find_all(&self, selector: &str) -> SurfaceResult<Vec<ElementRef>> {
        self.record(format!("find_all {selector}"));
        self.check(selector)?;
        Ok(self
            .lock()
            .selectors
            .get(selector)
            .map(ElementRef::new)
            .into_iter()
            .collect())
    }

    async fn find_by_text(
        &self,
        selector: &str,
        label: &str,
    ) -> SurfaceResult<Option<ElementRef>> {
        self.record(format!("find_by_text {selector} {label}"));
        self.check(selector)?;
        Ok(self
            .lock()
            .labelled
            .get(&(selector.to_string(), label.to_string()))
            .map(ElementRef::new))
    }

    async fn click(&self, element: &ElementRef) -> SurfaceResult<()> {
        self.record(format!("click {element}"));
        if self.lock().stale.contains(element.key()) {
            return Err(SurfaceError::Stale(element.to_string()));
        }
        self.check(element.key())
    }

    async fn fill(&self, element: &ElementRef, text: &str) -> SurfaceResult<()> {
        self.record(format!("fill {element} {text}"));
        Ok(())
    }

    async fn press_enter(&self, element: &ElementRef) -> SurfaceResult<()> {
        self.record(format!("enter {element}"));
        Ok(())
    }

    async fn scroll(&self, element: &ElementRef, delta: u32) -> SurfaceResult<()> {
        self.record(format!("scroll {element} {delta}"));
        let mut script = self.lock();
        if let Some(links) = script.deferred.remove(element.key()) {
            script.siblings.extend(links);
        }
        Ok(())
    }

    async fn read_height(&self, element: &ElementRef) -> SurfaceResult<u64> {
        self.record(format!("height {element}"));
        Ok(next_reading(&mut self.lock().heights))
    }

    async fn read_scroll_offset(&self, element: &ElementRef) -> SurfaceResult<u64> {
        self.record(format!("offset {element}"));
        Ok(next_reading(&mut self.lock().offsets))
    }

    async fn read_text(&self, element: &ElementRef) -> SurfaceResult<String> {
        self.record(format!("text {element}"));
        self.lock()
            .texts
            .get(element.key())
            .cloned()
            .ok_or_else(|| SurfaceError::Stale(element.key().to_string()))
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> SurfaceResult<ElementRef> {
        self.record(format!("wait_for {selector}"));
        self.lock()
            .selectors
            .get(selector)
            .map(ElementRef::new)
            .ok_or_else(|| SurfaceError::Timeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn sibling_of(&self, element: &ElementRef) -> SurfaceResult<Option<ElementRef>> {
        self.record(format!("sibling {element}"));
        Ok(self
            .lock()
            .siblings
            .get(element.key())
            .map(ElementRef::new))
    }

    async fn content(&self) -> SurfaceResult<String> {
        self.record("content".to_string());
        Ok(self.lock().texts.get("html").cloned().unwrap_or_default())
    }

    async fn save_session(&self) -> SurfaceResult<SessionState> {
        self.record("save_session".to_string());
        Ok(self
            .lock()
            .cookies
            .clone()
            .unwrap_or_else(|| SessionState::new(Vec::new())))
    }

    async fn restore_session(&self, state: &SessionState) -> SurfaceResult<()> {
        self.record("restore_session".to_string());
        self.lock().cookies = Some(state.clone());
        Ok(())
    }
}
