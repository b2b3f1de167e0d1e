//! End-to-end session behavior against a scripted source.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use recordlens_lib::cache::{PAGE_SIZE, page_bounds};
use recordlens_lib::error::{
    ImageFetchError, LoadError, MetadataFetchError, PageFetchError, SourceError,
};
use recordlens_lib::model::{CollectionSummary, ImageData, Record, RecordMetadata};
use recordlens_lib::scrollbar::ThumbMetrics;
use recordlens_lib::sink::{
    ImagePanel, MetadataPanel, RenderSink, StatusLevel, WindowSnapshot,
};
use recordlens_lib::source::RecordSource;
use recordlens_lib::{ViewerConfig, ViewerSession};
use serde_json::Value;
use tokio::sync::Semaphore;

// ===== Fixtures =====

fn test_record(index: usize) -> Record {
    Record::new(
        format!("rec-{index:05}"),
        format!("/data/shard{}", index / PAGE_SIZE),
    )
}

/// Two-sided latch: the source signals `started` when a gated fetch
/// begins and then parks until the test calls [`Gate::open`].
#[derive(Clone)]
struct Gate {
    started: Arc<Semaphore>,
    release: Arc<Semaphore>,
}

impl Gate {
    fn new() -> Self {
        Self {
            started: Arc::new(Semaphore::new(0)),
            release: Arc::new(Semaphore::new(0)),
        }
    }

    async fn wait_started(&self) {
        self.started.acquire().await.unwrap().forget();
    }

    fn open(&self) {
        self.release.add_permits(1);
    }
}

struct ScriptedSource {
    total: usize,
    fail_pages: Mutex<HashSet<usize>>,
    page_gates: HashMap<usize, Gate>,
    image_gates: HashMap<String, Gate>,
    fail_images: HashSet<String>,
    fail_metadata: HashSet<String>,
    page_requests: Mutex<Vec<usize>>,
    image_requests: Mutex<Vec<String>>,
}

impl ScriptedSource {
    fn new(total: usize) -> Self {
        Self {
            total,
            fail_pages: Mutex::new(HashSet::new()),
            page_gates: HashMap::new(),
            image_gates: HashMap::new(),
            fail_images: HashSet::new(),
            fail_metadata: HashSet::new(),
            page_requests: Mutex::new(Vec::new()),
            image_requests: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next fetch of `page` fail; later fetches succeed.
    fn with_failing_page(self, page: usize) -> Self {
        self.fail_pages.lock().unwrap().insert(page);
        self
    }

    fn with_page_gate(mut self, page: usize, gate: &Gate) -> Self {
        self.page_gates.insert(page, gate.clone());
        self
    }

    fn with_image_gate(mut self, key: &str, gate: &Gate) -> Self {
        self.image_gates.insert(key.to_string(), gate.clone());
        self
    }

    fn with_failing_image(mut self, key: &str) -> Self {
        self.fail_images.insert(key.to_string());
        self
    }

    fn with_failing_metadata(mut self, key: &str) -> Self {
        self.fail_metadata.insert(key.to_string());
        self
    }

    fn page_requests(&self) -> Vec<usize> {
        self.page_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSource for ScriptedSource {
    async fn load_collection(&self, path: &str) -> Result<CollectionSummary, LoadError> {
        if path == "/missing" {
            return Err(LoadError::from(SourceError::rejected(
                "Path does not exist",
            )));
        }
        Ok(CollectionSummary::new(self.total, 3)
            .with_columns(vec!["uuid".to_string(), "filepath".to_string()]))
    }

    async fn fetch_record_page(&self, page: usize) -> Result<Vec<Record>, PageFetchError> {
        self.page_requests.lock().unwrap().push(page);

        if let Some(gate) = self.page_gates.get(&page) {
            gate.started.add_permits(1);
            gate.release.acquire().await.unwrap().forget();
        }
        if self.fail_pages.lock().unwrap().remove(&page) {
            return Err(PageFetchError::new(
                page,
                SourceError::http(500, "scripted failure"),
            ));
        }

        Ok(page_bounds(page)
            .filter(|index| *index < self.total)
            .map(test_record)
            .collect())
    }

    async fn fetch_image(&self, key: &str, _location: &str) -> Result<ImageData, ImageFetchError> {
        self.image_requests.lock().unwrap().push(key.to_string());

        if let Some(gate) = self.image_gates.get(key) {
            gate.started.add_permits(1);
            gate.release.acquire().await.unwrap().forget();
        }
        if self.fail_images.contains(key) {
            return Err(ImageFetchError::new(
                key,
                SourceError::http(404, "scripted image failure"),
            ));
        }

        Ok(ImageData::new("aW1n", 7.5))
    }

    async fn fetch_metadata(
        &self,
        key: &str,
        _location: &str,
    ) -> Result<RecordMetadata, MetadataFetchError> {
        if self.fail_metadata.contains(key) {
            return Err(MetadataFetchError::new(
                key,
                SourceError::rejected("scripted metadata failure"),
            ));
        }

        Ok(RecordMetadata::default()
            .with_field("uuid", key)
            .with_field("width", 640))
    }
}

#[derive(Default)]
struct RecordingSink {
    windows: Mutex<Vec<WindowSnapshot>>,
    thumbs: Mutex<Vec<ThumbMetrics>>,
    image_panels: Mutex<Vec<ImagePanel>>,
    metadata_panels: Mutex<Vec<MetadataPanel>>,
    statuses: Mutex<Vec<(StatusLevel, String)>>,
    stats: Mutex<Vec<CollectionSummary>>,
}

impl RecordingSink {
    fn windows(&self) -> Vec<WindowSnapshot> {
        self.windows.lock().unwrap().clone()
    }

    fn last_window(&self) -> WindowSnapshot {
        self.windows.lock().unwrap().last().cloned().unwrap()
    }

    fn last_thumb(&self) -> ThumbMetrics {
        *self.thumbs.lock().unwrap().last().unwrap()
    }

    fn statuses(&self) -> Vec<(StatusLevel, String)> {
        self.statuses.lock().unwrap().clone()
    }

    /// Image panel history as compact tags, in render order.
    fn image_panel_tags(&self) -> Vec<String> {
        self.image_panels
            .lock()
            .unwrap()
            .iter()
            .map(|panel| match panel {
                ImagePanel::Loading => "loading".to_string(),
                ImagePanel::Ready { record, .. } => format!("ready:{}", record.key()),
                ImagePanel::Failed(err) => format!("failed:{}", err.key),
            })
            .collect()
    }

    /// Metadata panel history as compact tags, in render order.
    fn metadata_panel_tags(&self) -> Vec<String> {
        self.metadata_panels
            .lock()
            .unwrap()
            .iter()
            .map(|panel| match panel {
                MetadataPanel::Loading => "loading".to_string(),
                MetadataPanel::Ready(metadata) => format!(
                    "ready:{}",
                    metadata
                        .get("uuid")
                        .and_then(Value::as_str)
                        .unwrap_or("?")
                ),
                MetadataPanel::Failed(err) => format!("failed:{}", err.key),
            })
            .collect()
    }
}

impl RenderSink for RecordingSink {
    fn render_visible_window(&self, window: WindowSnapshot) {
        self.windows.lock().unwrap().push(window);
    }

    fn render_scroll_thumb(&self, thumb: ThumbMetrics) {
        self.thumbs.lock().unwrap().push(thumb);
    }

    fn render_image_panel(&self, panel: ImagePanel) {
        self.image_panels.lock().unwrap().push(panel);
    }

    fn render_metadata_panel(&self, panel: MetadataPanel) {
        self.metadata_panels.lock().unwrap().push(panel);
    }

    fn show_status(&self, level: StatusLevel, message: &str) {
        self.statuses
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }

    fn render_stats(&self, summary: &CollectionSummary) {
        self.stats.lock().unwrap().push(summary.clone());
    }
}

async fn open_session(source: Arc<ScriptedSource>) -> (ViewerSession, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let session = ViewerSession::load(
        source,
        sink.clone(),
        ViewerConfig::default(),
        "/data/lookup",
    )
    .await
    .unwrap();
    (session, sink)
}

// ===== Loading =====

#[tokio::test]
async fn test_load_renders_initial_window() {
    let source = Arc::new(ScriptedSource::new(250));
    let (_session, sink) = open_session(source.clone()).await;

    assert_eq!(
        sink.statuses(),
        vec![
            (StatusLevel::Loading, "Loading collection...".to_string()),
            (
                StatusLevel::Success,
                "Loaded 250 records successfully!".to_string()
            ),
        ]
    );
    assert_eq!(sink.stats.lock().unwrap()[0].total_records, 250);
    assert_eq!(source.page_requests(), vec![0]);

    let windows = sink.windows();
    assert!(!windows[0].has_data());

    let last = sink.last_window();
    assert_eq!(last.start, 0);
    assert_eq!(last.end(), Some(14));
    assert_eq!(last.total_records, 250);
    assert!(last.slots.iter().all(Option::is_some));
}

#[tokio::test]
async fn test_load_failure_leaves_no_session() {
    let source = Arc::new(ScriptedSource::new(250));
    let sink = Arc::new(RecordingSink::default());

    let result = ViewerSession::load(
        source.clone(),
        sink.clone(),
        ViewerConfig::default(),
        "/missing",
    )
    .await;

    assert!(result.is_err());
    let statuses = sink.statuses();
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[1].0, StatusLevel::Error);
    assert!(statuses[1].1.contains("Path does not exist"));
    assert!(sink.stats.lock().unwrap().is_empty());
    assert!(sink.windows().is_empty());
    assert!(source.page_requests().is_empty());
}

#[tokio::test]
async fn test_empty_collection_renders_empty_window() {
    let source = Arc::new(ScriptedSource::new(0));
    let (session, sink) = open_session(source.clone()).await;

    assert!(sink.last_window().is_empty());
    assert!(source.page_requests().is_empty());

    let thumb = sink.last_thumb();
    assert_eq!(thumb.height_px, 200.0);
    assert_eq!(thumb.top_px, 0.0);

    session.scroll_to_index(3).await;
    assert_eq!(session.viewport().visible_start(), 0);
    assert!(source.page_requests().is_empty());
}

// ===== Scrolling and page fills =====

#[tokio::test]
async fn test_scroll_across_page_boundary_fetches_next_page() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    session.scroll_to_index(95).await;

    assert_eq!(source.page_requests(), vec![0, 1]);
    let last = sink.last_window();
    assert_eq!(last.start, 95);
    assert_eq!(last.end(), Some(109));
    assert!(last.slots.iter().all(Option::is_some));
}

#[tokio::test]
async fn test_scroll_within_loaded_page_skips_fetch() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    let before = sink.windows().len();
    session.scroll_to_index(5).await;

    assert_eq!(source.page_requests(), vec![0]);
    let windows = sink.windows();
    assert_eq!(windows.len(), before + 2);
    assert!(windows[before].has_data());
    assert!(windows[before + 1].has_data());
}

#[tokio::test]
async fn test_scroll_clamps_to_tail() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    session.scroll_to_index(10_000).await;

    assert_eq!(session.viewport().visible_start(), 235);
    assert_eq!(source.page_requests(), vec![0, 2]);
    let last = sink.last_window();
    assert_eq!(last.end(), Some(249));
    assert!(last.slots.iter().all(Option::is_some));
}

#[tokio::test]
async fn test_short_collection_stays_pinned() {
    let source = Arc::new(ScriptedSource::new(10));
    let (session, sink) = open_session(source.clone()).await;

    session.scroll_to_index(7).await;

    assert_eq!(session.viewport().visible_start(), 0);
    assert_eq!(sink.last_window().len(), 10);
    assert_eq!(source.page_requests(), vec![0]);

    let thumb = sink.last_thumb();
    assert_eq!(thumb.height_px, 200.0);
    assert_eq!(thumb.top_px, 0.0);
}

#[tokio::test]
async fn test_failed_page_renders_placeholders_and_retries_later() {
    let source = Arc::new(ScriptedSource::new(250).with_failing_page(1));
    let (session, sink) = open_session(source.clone()).await;

    session.scroll_to_index(95).await;

    assert_eq!(source.page_requests(), vec![0, 1]);
    let last = sink.last_window();
    assert!(last.slots[..5].iter().all(Option::is_some));
    assert!(last.slots[5..].iter().all(Option::is_none));
    // Page failures are silent; the status banner still shows the load.
    assert_eq!(sink.statuses().len(), 2);

    session.scroll_to_index(100).await;

    assert_eq!(source.page_requests(), vec![0, 1, 1]);
    let last = sink.last_window();
    assert_eq!(last.start, 100);
    assert!(last.slots.iter().all(Option::is_some));
}

#[tokio::test]
async fn test_concurrent_fill_skips_and_recovers_on_trailing_render() {
    let gate = Gate::new();
    let source = Arc::new(ScriptedSource::new(250).with_page_gate(1, &gate));
    let (session, sink) = open_session(source.clone()).await;

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.scroll_to_index(95).await }
    });
    gate.wait_started().await;

    // Second navigation covers the same page; the fill in flight makes
    // it skip, leaving placeholders.
    session.scroll_to_index(100).await;
    assert_eq!(source.page_requests(), vec![0, 1]);
    assert!(sink.last_window().slots.iter().all(Option::is_none));

    gate.open();
    first.await.unwrap();

    // The first navigation's trailing render reads the viewport as it
    // stands now, start 100, with the page resident.
    assert_eq!(source.page_requests(), vec![0, 1]);
    let last = sink.last_window();
    assert_eq!(last.start, 100);
    assert!(last.slots.iter().all(Option::is_some));
}

// ===== Gestures =====

#[tokio::test]
async fn test_wheel_scrolls_three_per_notch() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, _sink) = open_session(source.clone()).await;

    session.handle_wheel(120.0).await;
    assert_eq!(session.viewport().visible_start(), 3);

    session.handle_wheel(0.5).await;
    assert_eq!(session.viewport().visible_start(), 6);

    session.handle_wheel(-40.0).await;
    assert_eq!(session.viewport().visible_start(), 3);

    assert_eq!(source.page_requests(), vec![0]);
}

#[tokio::test]
async fn test_track_click_jumps_proportionally() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, _sink) = open_session(source.clone()).await;

    session.handle_track_click(100.0).await;

    assert_eq!(session.viewport().visible_start(), 117);
    assert_eq!(source.page_requests(), vec![0, 1]);
}

#[tokio::test]
async fn test_drag_follows_pointer_until_release() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    let drag = session.begin_drag(310.0);

    session.handle_drag(drag, 400.0).await;
    assert_eq!(session.viewport().visible_start(), 117);

    session.handle_drag(drag, 490.0).await;
    assert_eq!(session.viewport().visible_start(), 235);

    let thumb = sink.last_thumb();
    assert!((thumb.top_px + thumb.height_px - 200.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_resize_track_rescales_thumb() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    session.resize_track(400.0);

    let thumb = sink.last_thumb();
    assert!((thumb.height_px - 24.0).abs() < 1e-9);
    assert_eq!(thumb.top_px, 0.0);
}

// ===== Selection =====

#[tokio::test]
async fn test_selection_loads_both_panels() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    let record = sink.last_window().slots[0].clone().unwrap();
    session.select_record(record).await;

    assert_eq!(sink.image_panel_tags(), vec!["loading", "ready:rec-00000"]);
    assert_eq!(
        sink.metadata_panel_tags(),
        vec!["loading", "ready:rec-00000"]
    );
    assert_eq!(
        sink.last_window().selected_key.as_deref(),
        Some("rec-00000")
    );
    assert_eq!(*source.image_requests.lock().unwrap(), vec!["rec-00000"]);

    let panels = sink.image_panels.lock().unwrap();
    match panels.last().unwrap() {
        ImagePanel::Ready { image, .. } => {
            assert_eq!(image.image_b64, "aW1n");
            assert_eq!(image.fetch_time_ms, 7.5);
        }
        other => panic!("expected ready image panel, got {other:?}"),
    }
}

#[tokio::test]
async fn test_image_failure_leaves_metadata_intact() {
    let source = Arc::new(ScriptedSource::new(250).with_failing_image("rec-00003"));
    let (session, sink) = open_session(source.clone()).await;

    let record = sink.last_window().slots[3].clone().unwrap();
    session.select_record(record).await;

    assert_eq!(sink.image_panel_tags(), vec!["loading", "failed:rec-00003"]);
    assert_eq!(
        sink.metadata_panel_tags(),
        vec!["loading", "ready:rec-00003"]
    );
    // Detail failures stay inside their panel; no status banner, and
    // the selection itself is kept.
    assert_eq!(sink.statuses().len(), 2);
    assert_eq!(session.selected_key().as_deref(), Some("rec-00003"));
}

#[tokio::test]
async fn test_metadata_failure_leaves_image_intact() {
    let source = Arc::new(ScriptedSource::new(250).with_failing_metadata("rec-00004"));
    let (session, sink) = open_session(source.clone()).await;

    let record = sink.last_window().slots[4].clone().unwrap();
    session.select_record(record).await;

    assert_eq!(sink.image_panel_tags(), vec!["loading", "ready:rec-00004"]);
    assert_eq!(
        sink.metadata_panel_tags(),
        vec!["loading", "failed:rec-00004"]
    );
}

#[tokio::test]
async fn test_rapid_selection_last_resolved_wins() {
    let gate = Gate::new();
    let source = Arc::new(ScriptedSource::new(250).with_image_gate("rec-00000", &gate));
    let (session, sink) = open_session(source.clone()).await;

    let first = sink.last_window().slots[0].clone().unwrap();
    let second = sink.last_window().slots[1].clone().unwrap();

    let stalled = tokio::spawn({
        let session = session.clone();
        async move { session.select_record(first).await }
    });
    gate.wait_started().await;

    session.select_record(second).await;
    gate.open();
    stalled.await.unwrap();

    // The stalled fetch pair resolved last, so its record owns both
    // panels even though the selection state points at the newer one.
    assert_eq!(
        sink.image_panel_tags(),
        vec!["loading", "loading", "ready:rec-00001", "ready:rec-00000"]
    );
    assert_eq!(
        sink.metadata_panel_tags(),
        vec!["loading", "loading", "ready:rec-00001", "ready:rec-00000"]
    );
    assert_eq!(session.selected_key().as_deref(), Some("rec-00001"));
    assert_eq!(
        sink.last_window().selected_key.as_deref(),
        Some("rec-00001")
    );
}

#[tokio::test]
async fn test_selection_survives_scrolling_out_of_window() {
    let source = Arc::new(ScriptedSource::new(250));
    let (session, sink) = open_session(source.clone()).await;

    let record = sink.last_window().slots[0].clone().unwrap();
    session.select_record(record).await;
    session.scroll_to_index(95).await;

    assert_eq!(
        sink.last_window().selected_key.as_deref(),
        Some("rec-00000")
    );
}
