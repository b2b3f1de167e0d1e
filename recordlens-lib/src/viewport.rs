//! Viewport state and window index math

use std::ops::{Range, RangeInclusive};

use crate::cache::page_of;

/// Items scrolled per wheel notch, regardless of delta magnitude.
pub const WHEEL_STEP: usize = 3;

/// The visible index window over the logical record list.
///
/// Only the first visible index is stored; the window extent follows
/// from the fixed `items_per_view`. The start index is kept clamped so
/// the window never extends past the end of the list: it cannot exceed
/// `total_records - items_per_view` (or 0 when the collection is
/// shorter than one window).
///
/// # Example
///
/// ```
/// use recordlens_lib::viewport::ViewportState;
///
/// let mut viewport = ViewportState::new(250, 15);
/// viewport.scroll_to(1000);
///
/// assert_eq!(viewport.visible_start(), 235);
/// assert_eq!(viewport.visible_end(), Some(249));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    visible_start: usize,
    items_per_view: usize,
    total_records: usize,
}

impl ViewportState {
    /// Creates a viewport at the top of a collection.
    ///
    /// `items_per_view` is fixed for the life of the viewport and is
    /// raised to 1 if 0 is passed.
    pub fn new(total_records: usize, items_per_view: usize) -> Self {
        Self {
            visible_start: 0,
            items_per_view: items_per_view.max(1),
            total_records,
        }
    }

    /// First visible logical index.
    pub fn visible_start(&self) -> usize {
        self.visible_start
    }

    /// Last visible logical index, `None` when the collection is empty.
    pub fn visible_end(&self) -> Option<usize> {
        if self.total_records == 0 {
            None
        } else {
            Some((self.visible_start + self.items_per_view - 1).min(self.total_records - 1))
        }
    }

    /// Fixed window height in items.
    pub fn items_per_view(&self) -> usize {
        self.items_per_view
    }

    /// Total records in the collection.
    pub fn total_records(&self) -> usize {
        self.total_records
    }

    /// Largest valid `visible_start`.
    pub fn max_start(&self) -> usize {
        self.total_records.saturating_sub(self.items_per_view)
    }

    /// Clamps a requested start index into the valid range.
    pub fn clamp_target(&self, target: usize) -> usize {
        target.min(self.max_start())
    }

    /// Moves the window so `target` is the first visible index, clamped.
    ///
    /// Returns the start index actually applied.
    pub fn scroll_to(&mut self, target: usize) -> usize {
        self.visible_start = self.clamp_target(target);
        self.visible_start
    }

    /// The visible window as a half-open index range.
    ///
    /// Empty when the collection is empty; shorter than
    /// `items_per_view` when the collection is.
    pub fn window(&self) -> Range<usize> {
        let len = self
            .items_per_view
            .min(self.total_records.saturating_sub(self.visible_start));
        self.visible_start..self.visible_start + len
    }

    /// Start index a wheel gesture would scroll to.
    ///
    /// Only the sign of the delta matters: positive scrolls down by
    /// [`WHEEL_STEP`], negative up by the same, zero (or NaN) stays put.
    pub fn wheel_target(&self, delta_y: f64) -> usize {
        let step = WHEEL_STEP as isize;
        let target = match delta_y.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Greater) => self.visible_start as isize + step,
            Some(std::cmp::Ordering::Less) => self.visible_start as isize - step,
            _ => self.visible_start as isize,
        };
        self.clamp_target(target.max(0) as usize)
    }

    /// Pages covering the visible window, `None` when the window is empty.
    pub fn page_span(&self) -> Option<RangeInclusive<usize>> {
        let window = self.window();
        if window.is_empty() {
            None
        } else {
            Some(page_of(window.start)..=page_of(window.end - 1))
        }
    }
}
