//! Render sinks
//!
//! The viewer core pushes every UI update through this seam. Sinks are
//! write-only: the core never reads state back from a front-end, so an
//! implementation can be a terminal layout, a recording fixture or a
//! plain log.

use crate::error::{ImageFetchError, MetadataFetchError};
use crate::model::{CollectionSummary, ImageData, Record, RecordMetadata};
use crate::scrollbar::ThumbMetrics;

/// One rendered slice of the logical record list.
#[derive(Debug, Clone, Default)]
pub struct WindowSnapshot {
    /// Logical index of the first slot in `slots`.
    pub start: usize,
    /// Per-slot contents; `None` marks a slot whose page is not resident.
    pub slots: Vec<Option<Record>>,
    /// Total records in the collection.
    pub total_records: usize,
    /// Currently selected key, for highlighting.
    pub selected_key: Option<String>,
}

impl WindowSnapshot {
    /// Returns `true` if any slot has a record.
    ///
    /// An all-empty window is rendered as a single loading placeholder
    /// rather than a column of blanks.
    pub fn has_data(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }

    /// Inclusive end index, `None` when the window is empty.
    pub fn end(&self) -> Option<usize> {
        (!self.slots.is_empty()).then(|| self.start + self.slots.len() - 1)
    }

    /// Number of slots in the window.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` for the empty-collection window.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates `(logical_index, slot)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (usize, Option<&Record>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(offset, slot)| (self.start + offset, slot.as_ref()))
    }
}

/// Image panel hand-off.
#[derive(Debug)]
pub enum ImagePanel {
    /// A fetch is in flight; show a placeholder.
    Loading,
    /// The image arrived.
    Ready {
        /// Record the image belongs to.
        record: Record,
        /// The fetched payload.
        image: ImageData,
    },
    /// The fetch failed; show the error in place of the image.
    Failed(ImageFetchError),
}

/// Metadata panel hand-off.
#[derive(Debug)]
pub enum MetadataPanel {
    /// A fetch is in flight; show a placeholder.
    Loading,
    /// The metadata table arrived.
    Ready(RecordMetadata),
    /// The fetch failed; show the error in place of the table.
    Failed(MetadataFetchError),
}

/// Severity of a status-banner update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    /// Work is in progress.
    Loading,
    /// The last operation succeeded.
    Success,
    /// The last operation failed.
    Error,
}

/// Receiver for viewer UI updates.
///
/// Calls arrive from whichever task drove the update, so sinks must be
/// internally synchronized. Each call replaces the previous content of
/// the same surface.
pub trait RenderSink: Send + Sync {
    /// Renders the visible window, loaded or not.
    fn render_visible_window(&self, window: WindowSnapshot);

    /// Positions the scrollbar thumb.
    fn render_scroll_thumb(&self, thumb: ThumbMetrics);

    /// Replaces the image panel content.
    fn render_image_panel(&self, panel: ImagePanel);

    /// Replaces the metadata panel content.
    fn render_metadata_panel(&self, panel: MetadataPanel);

    /// Updates the status banner.
    fn show_status(&self, level: StatusLevel, message: &str);

    /// Shows collection statistics after a successful load.
    fn render_stats(&self, summary: &CollectionSummary);
}
