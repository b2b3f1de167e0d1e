//! Selection state

use std::sync::Mutex;

/// Tracks the single selected record key.
///
/// Selection is visual state only. It survives scrolling (including
/// scrolling the selected record out of the window), is replaced by the
/// next selection and is never cleared on fetch failures.
#[derive(Debug, Default)]
pub struct SelectionController {
    selected: Mutex<Option<String>>,
}

impl SelectionController {
    /// Creates a controller with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `key` as the sole selected record.
    ///
    /// Returns the previously selected key, if any.
    pub fn select(&self, key: impl Into<String>) -> Option<String> {
        self.selected
            .lock()
            .expect("selection lock poisoned")
            .replace(key.into())
    }

    /// Currently selected key, if any.
    pub fn selected_key(&self) -> Option<String> {
        self.selected
            .lock()
            .expect("selection lock poisoned")
            .clone()
    }

    /// Returns `true` if `key` is the selected record.
    pub fn is_selected(&self, key: &str) -> bool {
        self.selected
            .lock()
            .expect("selection lock poisoned")
            .as_deref()
            == Some(key)
    }
}
