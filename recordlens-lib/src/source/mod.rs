//! Record sources

mod http;

pub use http::*;

use async_trait::async_trait;

use crate::error::{ImageFetchError, LoadError, MetadataFetchError, PageFetchError};
use crate::model::{CollectionSummary, ImageData, Record, RecordMetadata};

/// Async provider of collection data.
///
/// One implementation talks to the HTTP service
/// ([`HttpRecordSource`]); tests script their own. Methods take
/// `&self` so one source can serve concurrent fetches.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Loads the collection at `path` and returns its summary.
    ///
    /// Called once per session, before anything else; the summary's
    /// `total_records` fixes the scroll range.
    async fn load_collection(&self, path: &str) -> Result<CollectionSummary, LoadError>;

    /// Fetches one page of records in collection order.
    ///
    /// Page `page` covers logical indices `page * PAGE_SIZE` up to but
    /// not including `(page + 1) * PAGE_SIZE`. A shorter or empty
    /// result means the collection ends inside (or before) the page.
    async fn fetch_record_page(&self, page: usize) -> Result<Vec<Record>, PageFetchError>;

    /// Fetches the image payload of one record.
    async fn fetch_image(&self, key: &str, location: &str) -> Result<ImageData, ImageFetchError>;

    /// Fetches the metadata table of one record.
    async fn fetch_metadata(
        &self,
        key: &str,
        location: &str,
    ) -> Result<RecordMetadata, MetadataFetchError>;
}
