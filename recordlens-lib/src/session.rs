//! Viewer sessions

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::cache::PageCache;
use crate::error::LoadError;
use crate::model::{CollectionSummary, Record};
use crate::scrollbar::{self, DragSession, TrackLayout};
use crate::selection::SelectionController;
use crate::sink::{ImagePanel, MetadataPanel, RenderSink, StatusLevel, WindowSnapshot};
use crate::source::RecordSource;
use crate::viewport::ViewportState;

/// Construction-time knobs for a viewer session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    /// Records shown per window. Fixed for the life of the session.
    pub items_per_view: usize,
    /// Initial scrollbar track height in pixels.
    pub track_px: f64,
    /// Minimum scrollbar thumb height in pixels.
    pub min_thumb_px: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            items_per_view: 15,
            track_px: 200.0,
            min_thumb_px: 20.0,
        }
    }
}

impl ViewerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the window height in records.
    pub fn with_items_per_view(mut self, items_per_view: usize) -> Self {
        self.items_per_view = items_per_view;
        self
    }

    /// Sets the scrollbar track height in pixels.
    pub fn with_track_px(mut self, track_px: f64) -> Self {
        self.track_px = track_px;
        self
    }

    /// Sets the minimum thumb height in pixels.
    pub fn with_min_thumb_px(mut self, min_thumb_px: f64) -> Self {
        self.min_thumb_px = min_thumb_px;
        self
    }
}

/// A loaded collection being browsed through a render sink.
///
/// The session owns the page cache, viewport, scrollbar geometry and
/// selection state, and pushes every visual consequence of an operation
/// to its [`RenderSink`]. Cloning is cheap and clones share all state,
/// so gesture handlers can be driven from separate tasks.
///
/// Scrolling renders optimistically: the window and thumb update
/// immediately, missing slots render as placeholders, and a second
/// window render follows once page fetches settle. Fetches are
/// best-effort; a failed page stays empty until a later navigation
/// covers it again.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
///
/// use recordlens_lib::source::HttpRecordSource;
/// use recordlens_lib::{ViewerConfig, ViewerSession};
///
/// let source = Arc::new(HttpRecordSource::new("http://127.0.0.1:5839"));
/// let session =
///     ViewerSession::load(source, sink, ViewerConfig::default(), "/data/lookup").await?;
/// session.handle_wheel(1.0).await;
/// ```
#[derive(Clone)]
pub struct ViewerSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    source: Arc<dyn RecordSource>,
    sink: Arc<dyn RenderSink>,
    cache: PageCache,
    viewport: Mutex<ViewportState>,
    track: Mutex<TrackLayout>,
    selection: SelectionController,
    summary: CollectionSummary,
}

impl ViewerSession {
    /// Loads the collection at `path` and opens a session over it.
    ///
    /// Drives the full load handshake on the sink: a loading banner,
    /// then either the success banner plus collection stats followed by
    /// an initial scroll to the top (which fetches the first page), or
    /// an error banner. On failure no session is returned and the
    /// caller is free to retry with a corrected path.
    pub async fn load(
        source: Arc<dyn RecordSource>,
        sink: Arc<dyn RenderSink>,
        config: ViewerConfig,
        path: &str,
    ) -> Result<Self, LoadError> {
        sink.show_status(StatusLevel::Loading, "Loading collection...");

        let summary = match source.load_collection(path).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!("{err}");
                sink.show_status(StatusLevel::Error, &err.to_string());
                return Err(err);
            }
        };

        info!(
            "collection loaded: {} records across {} locations",
            summary.total_records, summary.unique_locations
        );
        sink.show_status(
            StatusLevel::Success,
            &format!("Loaded {} records successfully!", summary.formatted_total()),
        );
        sink.render_stats(&summary);

        let session = Self {
            inner: Arc::new(SessionInner {
                source,
                sink,
                cache: PageCache::new(),
                viewport: Mutex::new(ViewportState::new(
                    summary.total_records,
                    config.items_per_view,
                )),
                track: Mutex::new(TrackLayout::new(config.track_px, config.min_thumb_px)),
                selection: SelectionController::new(),
                summary,
            }),
        };

        session.scroll_to_index(0).await;
        Ok(session)
    }

    /// Summary of the loaded collection.
    pub fn summary(&self) -> &CollectionSummary {
        &self.inner.summary
    }

    /// Snapshot of the current viewport.
    pub fn viewport(&self) -> ViewportState {
        *self.inner.viewport.lock().expect("viewport lock poisoned")
    }

    /// Currently selected record key, if any.
    pub fn selected_key(&self) -> Option<String> {
        self.inner.selection.selected_key()
    }

    /// Moves the window so `target` is the first visible index.
    ///
    /// The target is clamped into the valid range. The window and thumb
    /// render immediately from whatever is cached; the pages covering
    /// the window are then filled one at a time, in order, and the
    /// window renders once more from the viewport as it stands after
    /// the fills (a concurrent scroll may have moved it).
    pub async fn scroll_to_index(&self, target: usize) {
        let span = {
            let mut viewport = self.inner.viewport.lock().expect("viewport lock poisoned");
            let applied = viewport.scroll_to(target);
            debug!("window moved to start {applied}");
            viewport.page_span()
        };

        self.render_window();
        self.render_thumb();

        if let Some(pages) = span {
            for page in pages {
                self.inner
                    .cache
                    .fetch_page(self.inner.source.as_ref(), page)
                    .await;
            }
        }

        self.render_window();
    }

    /// Applies a wheel gesture: one notch scrolls three records, only
    /// the delta's sign matters.
    pub async fn handle_wheel(&self, delta_y: f64) {
        let target = self.viewport().wheel_target(delta_y);
        self.scroll_to_index(target).await;
    }

    /// Jumps to the position a track click at `y` maps to.
    ///
    /// `y` is in pixels from the top of the track.
    pub async fn handle_track_click(&self, y: f64) {
        let target = scrollbar::index_at_track_pos(self.track_layout(), &self.viewport(), y);
        self.scroll_to_index(target).await;
    }

    /// Starts a thumb drag at `pointer_y`, capturing the current thumb
    /// position.
    ///
    /// The caller holds the returned session for the duration of the
    /// drag and feeds pointer moves to [`handle_drag`]. Dropping it is
    /// the release.
    ///
    /// [`handle_drag`]: ViewerSession::handle_drag
    pub fn begin_drag(&self, pointer_y: f64) -> DragSession {
        let thumb = scrollbar::thumb_metrics(self.track_layout(), &self.viewport());
        DragSession::begin(pointer_y, thumb.top_px)
    }

    /// Continues a thumb drag with the current pointer position.
    ///
    /// `pointer_y` must be in the same coordinate space the drag was
    /// begun in; the pointer may be far off the track.
    pub async fn handle_drag(&self, drag: DragSession, pointer_y: f64) {
        let target = drag.target_index(self.track_layout(), &self.viewport(), pointer_y);
        self.scroll_to_index(target).await;
    }

    /// Updates the scrollbar track height after a layout change and
    /// re-renders the thumb.
    pub fn resize_track(&self, track_px: f64) {
        {
            let mut track = self.inner.track.lock().expect("track lock poisoned");
            track.track_px = track_px.max(0.0);
        }
        self.render_thumb();
    }

    /// Selects `record` and loads its image and metadata.
    ///
    /// The window re-renders with the new highlight and both detail
    /// panels show placeholders while the two fetches run concurrently.
    /// Each panel then renders its own result; one failing does not
    /// touch the other. Selections are not cancelled by later ones: if
    /// the user selects twice in quick succession, both fetch pairs
    /// complete and each panel ends up showing whichever response
    /// resolved last.
    pub async fn select_record(&self, record: Record) {
        debug!("record '{}' selected", record.key());
        self.inner.selection.select(record.key());
        self.render_window();

        self.inner.sink.render_image_panel(ImagePanel::Loading);
        self.inner.sink.render_metadata_panel(MetadataPanel::Loading);

        let (image, metadata) = futures::join!(
            self.inner.source.fetch_image(record.key(), record.location()),
            self.inner.source.fetch_metadata(record.key(), record.location()),
        );

        match image {
            Ok(image) => {
                self.inner.sink.render_image_panel(ImagePanel::Ready {
                    record: record.clone(),
                    image,
                });
            }
            Err(err) => {
                warn!("{err}");
                self.inner.sink.render_image_panel(ImagePanel::Failed(err));
            }
        }

        match metadata {
            Ok(metadata) => {
                self.inner
                    .sink
                    .render_metadata_panel(MetadataPanel::Ready(metadata));
            }
            Err(err) => {
                warn!("{err}");
                self.inner
                    .sink
                    .render_metadata_panel(MetadataPanel::Failed(err));
            }
        }
    }

    fn track_layout(&self) -> TrackLayout {
        *self.inner.track.lock().expect("track lock poisoned")
    }

    fn render_window(&self) {
        let snapshot = {
            let viewport = self.inner.viewport.lock().expect("viewport lock poisoned");
            WindowSnapshot {
                start: viewport.visible_start(),
                slots: self.inner.cache.window(viewport.window()),
                total_records: viewport.total_records(),
                selected_key: self.inner.selection.selected_key(),
            }
        };
        self.inner.sink.render_visible_window(snapshot);
    }

    fn render_thumb(&self) {
        let thumb = scrollbar::thumb_metrics(self.track_layout(), &self.viewport());
        self.inner.sink.render_scroll_thumb(thumb);
    }
}
