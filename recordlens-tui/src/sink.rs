//! Render-sink bridge between the viewer session and the draw loop.
//!
//! Session tasks push updates into a shared [`UiState`]; the event loop
//! reads it every frame. Panel payloads are reshaped into display form
//! here so drawing stays a pure formatting pass.

use std::sync::{Arc, Mutex};

use recordlens_lib::model::CollectionSummary;
use recordlens_lib::scrollbar::ThumbMetrics;
use recordlens_lib::sink::{
    ImagePanel, MetadataPanel, RenderSink, StatusLevel, WindowSnapshot,
};
use serde_json::Value;

/// Everything the draw loop needs to paint a frame.
#[derive(Default)]
pub struct UiState {
    pub window: WindowSnapshot,
    pub thumb: Option<ThumbMetrics>,
    pub image: ImagePanelView,
    pub metadata: MetadataPanelView,
    pub status: Option<(StatusLevel, String)>,
    pub stats: Option<CollectionSummary>,
}

/// Image panel reshaped for display.
#[derive(Debug, Default)]
pub enum ImagePanelView {
    /// Nothing selected yet.
    #[default]
    Empty,
    Loading,
    Ready {
        key: String,
        source_file: String,
        fetch_time_ms: f64,
        encoded_len: usize,
        /// Raw byte count, `None` when the payload fails to decode.
        decoded_len: Option<usize>,
    },
    Failed(String),
}

/// Metadata panel reshaped for display.
#[derive(Debug, Default)]
pub enum MetadataPanelView {
    /// Nothing selected yet.
    #[default]
    Empty,
    Loading,
    /// Formatted field/value rows.
    Ready(Vec<(String, String)>),
    Failed(String),
}

/// [`RenderSink`] writing into the shared [`UiState`].
pub struct UiSink {
    state: Arc<Mutex<UiState>>,
}

impl UiSink {
    pub fn new(state: Arc<Mutex<UiState>>) -> Self {
        Self { state }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, UiState> {
        self.state.lock().expect("ui state poisoned")
    }
}

impl RenderSink for UiSink {
    fn render_visible_window(&self, window: WindowSnapshot) {
        self.state().window = window;
    }

    fn render_scroll_thumb(&self, thumb: ThumbMetrics) {
        self.state().thumb = Some(thumb);
    }

    fn render_image_panel(&self, panel: ImagePanel) {
        self.state().image = match panel {
            ImagePanel::Loading => ImagePanelView::Loading,
            ImagePanel::Ready { record, image } => ImagePanelView::Ready {
                key: record.key().to_string(),
                source_file: format!("{}_images.h5", record.location()),
                fetch_time_ms: image.fetch_time_ms,
                encoded_len: image.encoded_len(),
                decoded_len: image.bytes().ok().map(|bytes| bytes.len()),
            },
            ImagePanel::Failed(err) => ImagePanelView::Failed(err.to_string()),
        };
    }

    fn render_metadata_panel(&self, panel: MetadataPanel) {
        self.state().metadata = match panel {
            MetadataPanel::Loading => MetadataPanelView::Loading,
            MetadataPanel::Ready(metadata) => MetadataPanelView::Ready(
                metadata
                    .iter()
                    .map(|(field, value)| (field.clone(), format_value(value)))
                    .collect(),
            ),
            MetadataPanel::Failed(err) => MetadataPanelView::Failed(err.to_string()),
        };
    }

    fn show_status(&self, level: StatusLevel, message: &str) {
        self.state().status = Some((level, message.to_string()));
    }

    fn render_stats(&self, summary: &CollectionSummary) {
        self.state().stats = Some(summary.clone());
    }
}

/// Formats a metadata value for a table cell.
///
/// Strings render bare, everything else as compact JSON; values longer
/// than 100 characters are truncated with an ellipsis.
fn format_value(value: &Value) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > 100 {
        let truncated: String = text.chars().take(100).collect();
        format!("{truncated}...")
    } else {
        text
    }
}
