//! Record collection viewer core
//!
//! A windowed viewer over large server-held record collections: pages
//! are fetched on demand into an append-only cache, a fixed-height
//! viewport maps scroll gestures to index ranges, and all UI output
//! flows through a render-sink seam.

pub mod cache;
pub mod error;
pub mod model;
pub mod scrollbar;
pub mod selection;
pub mod sink;
pub mod source;
pub mod viewport;

mod session;

pub use session::*;
