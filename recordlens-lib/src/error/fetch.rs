//! Fetch operation error types

use super::SourceError;

/// Error from the one-time collection load.
#[derive(Debug, thiserror::Error)]
#[error("Failed to load collection: {source}")]
pub struct LoadError {
    /// Underlying source failure.
    #[from]
    pub source: SourceError,
}

/// Error fetching one page of records.
#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch page {page}: {source}")]
pub struct PageFetchError {
    /// Page that failed.
    pub page: usize,
    /// Underlying source failure.
    #[source]
    pub source: SourceError,
}

impl PageFetchError {
    /// Creates a new page fetch error.
    pub fn new(page: usize, source: SourceError) -> Self {
        Self { page, source }
    }
}

/// Error fetching the image payload of a record.
#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch image for '{key}': {source}")]
pub struct ImageFetchError {
    /// Key of the record whose image failed.
    pub key: String,
    /// Underlying source failure.
    #[source]
    pub source: SourceError,
}

impl ImageFetchError {
    /// Creates a new image fetch error.
    pub fn new(key: impl Into<String>, source: SourceError) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }
}

/// Error fetching the metadata table of a record.
#[derive(Debug, thiserror::Error)]
#[error("Failed to fetch metadata for '{key}': {source}")]
pub struct MetadataFetchError {
    /// Key of the record whose metadata failed.
    pub key: String,
    /// Underlying source failure.
    #[source]
    pub source: SourceError,
}

impl MetadataFetchError {
    /// Creates a new metadata fetch error.
    pub fn new(key: impl Into<String>, source: SourceError) -> Self {
        Self {
            key: key.into(),
            source,
        }
    }
}
