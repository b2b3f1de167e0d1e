//! Typed models

mod content;
mod record;
mod summary;

pub use content::*;
pub use record::*;
pub use summary::*;
