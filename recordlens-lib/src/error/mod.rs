//! Error types

mod fetch;
mod source;

pub use fetch::*;
pub use source::*;
