//! Scrollbar-thumb geometry and inverse gesture mapping
//!
//! Pure pixel math kept separate from viewport state so front-ends can
//! lay out a proportional thumb without owning any scroll logic. All
//! positions are in pixels relative to the top of the track.

use crate::viewport::ViewportState;

/// Pixel geometry of the scrollbar track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackLayout {
    /// Track height in pixels.
    pub track_px: f64,
    /// Lower bound on thumb height, keeping it grabbable on huge
    /// collections.
    pub min_thumb_px: f64,
}

impl TrackLayout {
    /// Creates a track layout.
    pub fn new(track_px: f64, min_thumb_px: f64) -> Self {
        Self {
            track_px,
            min_thumb_px,
        }
    }
}

/// Computed thumb size and position, ready for a render sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbMetrics {
    /// Offset of the thumb top from the track top, in pixels.
    pub top_px: f64,
    /// Thumb height in pixels.
    pub height_px: f64,
}

/// Computes the thumb geometry for the current viewport.
///
/// The thumb height is proportional to the visible fraction of the
/// collection, never smaller than the layout minimum and never taller
/// than the track. When the whole collection fits in one window the
/// thumb fills the track and pins to the top.
pub fn thumb_metrics(layout: TrackLayout, viewport: &ViewportState) -> ThumbMetrics {
    let track = layout.track_px.max(0.0);
    let total = viewport.total_records();

    let height = if total == 0 {
        track
    } else {
        let ratio = viewport.items_per_view() as f64 / total as f64;
        (track * ratio).max(layout.min_thumb_px).min(track)
    };

    let scrollable = total.saturating_sub(viewport.items_per_view());
    let top = if scrollable == 0 {
        0.0
    } else {
        let progress = viewport.visible_start() as f64 / scrollable as f64;
        progress * (track - height)
    };

    ThumbMetrics {
        top_px: top,
        height_px: height,
    }
}

/// Maps a click at `y` pixels from the track top to a scroll target.
///
/// The click position is clamped into the track, so clicks past either
/// end land on the first or last window.
pub fn index_at_track_pos(layout: TrackLayout, viewport: &ViewportState, y: f64) -> usize {
    let scrollable = viewport
        .total_records()
        .saturating_sub(viewport.items_per_view());
    if scrollable == 0 || layout.track_px <= 0.0 {
        return 0;
    }

    let fraction = y.clamp(0.0, layout.track_px) / layout.track_px;
    (fraction * scrollable as f64).floor() as usize
}

/// State captured when a thumb drag begins.
///
/// A front-end creates the session on press, feeds it every pointer
/// move, and drops it on release. Release ends the drag wherever the
/// pointer is, on or off the track.
///
/// # Example
///
/// ```
/// use recordlens_lib::scrollbar::{self, DragSession, TrackLayout};
/// use recordlens_lib::viewport::ViewportState;
///
/// let layout = TrackLayout::new(200.0, 20.0);
/// let mut viewport = ViewportState::new(1000, 15);
///
/// let drag = DragSession::begin(50.0, scrollbar::thumb_metrics(layout, &viewport).top_px);
/// let target = drag.target_index(layout, &viewport, 140.0);
/// viewport.scroll_to(target);
///
/// assert!(viewport.visible_start() > 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    start_pointer_y: f64,
    start_thumb_top: f64,
}

impl DragSession {
    /// Captures the pointer position and thumb top at press time.
    ///
    /// Both later pointer positions and `pointer_y` must share a
    /// coordinate space; only their difference is used.
    pub fn begin(pointer_y: f64, thumb_top_px: f64) -> Self {
        Self {
            start_pointer_y: pointer_y,
            start_thumb_top: thumb_top_px,
        }
    }

    /// Maps the current pointer position to a scroll target.
    ///
    /// The prospective thumb top is clamped into the track, so the
    /// mapping saturates at both ends. When the thumb fills the track
    /// there is nowhere to drag and the current start is returned.
    pub fn target_index(
        &self,
        layout: TrackLayout,
        viewport: &ViewportState,
        pointer_y: f64,
    ) -> usize {
        let thumb = thumb_metrics(layout, viewport);
        let max_top = layout.track_px - thumb.height_px;
        if max_top <= 0.0 {
            return viewport.visible_start();
        }

        let scrollable = viewport
            .total_records()
            .saturating_sub(viewport.items_per_view());
        let new_top = (self.start_thumb_top + pointer_y - self.start_pointer_y).clamp(0.0, max_top);
        (new_top / max_top * scrollable as f64).floor() as usize
    }
}
