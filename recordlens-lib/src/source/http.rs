//! HTTP record source

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::error::{ImageFetchError, LoadError, MetadataFetchError, PageFetchError, SourceError};
use crate::model::{CollectionSummary, ImageData, Record, RecordMetadata};
use crate::source::RecordSource;

/// Record source backed by the viewer's HTTP service.
///
/// Collections are loaded with `POST /load_lookup_path`, record pages
/// come from `GET /get_uuid_page/{page}` and per-record details from
/// `POST /get_image` and `POST /get_metadata`. The service reports
/// failures as an `error` field in the response body; those surface as
/// [`SourceError::Rejected`], anything else as HTTP or network errors.
///
/// # Example
///
/// ```ignore
/// use recordlens_lib::source::{HttpRecordSource, RecordSource};
///
/// let source = HttpRecordSource::new("http://127.0.0.1:5839");
/// let summary = source.load_collection("/data/lookup").await?;
/// println!("{} records", summary.total_records);
/// ```
#[derive(Debug, Clone)]
pub struct HttpRecordSource {
    base_url: String,
    http_client: Client,
}

impl HttpRecordSource {
    /// Creates a source for the service at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http_client: Client::new(),
        }
    }

    /// Replaces the HTTP client, for callers that need custom
    /// timeouts or TLS settings.
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Returns the base URL of the service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn load_collection(&self, path: &str) -> Result<CollectionSummary, LoadError> {
        debug!("loading collection at '{path}'");

        let response = self
            .http_client
            .post(self.endpoint("load_lookup_path"))
            .json(&json!({ "path": path }))
            .send()
            .await
            .map_err(SourceError::from)?;

        if response.status().is_success() {
            let body: LoadResponse = response.json().await.map_err(SourceError::from)?;
            Ok(body.into_summary()?)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(error_from_response(status, body).into())
        }
    }

    async fn fetch_record_page(&self, page: usize) -> Result<Vec<Record>, PageFetchError> {
        let response = self
            .http_client
            .get(self.endpoint(&format!("get_uuid_page/{page}")))
            .send()
            .await
            .map_err(|err| PageFetchError::new(page, err.into()))?;

        if response.status().is_success() {
            let records: Vec<Record> = response
                .json()
                .await
                .map_err(|err| PageFetchError::new(page, err.into()))?;
            debug!("fetched page {page} with {} records", records.len());
            Ok(records)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(PageFetchError::new(page, error_from_response(status, body)))
        }
    }

    async fn fetch_image(&self, key: &str, location: &str) -> Result<ImageData, ImageFetchError> {
        let response = self
            .http_client
            .post(self.endpoint("get_image"))
            .json(&json!({ "uuid": key, "filepath": location }))
            .send()
            .await
            .map_err(|err| ImageFetchError::new(key, err.into()))?;

        if response.status().is_success() {
            let body: ImageResponse = response
                .json()
                .await
                .map_err(|err| ImageFetchError::new(key, err.into()))?;
            body.into_image()
                .map_err(|source| ImageFetchError::new(key, source))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(ImageFetchError::new(key, error_from_response(status, body)))
        }
    }

    async fn fetch_metadata(
        &self,
        key: &str,
        location: &str,
    ) -> Result<RecordMetadata, MetadataFetchError> {
        let response = self
            .http_client
            .post(self.endpoint("get_metadata"))
            .json(&json!({ "uuid": key, "filepath": location }))
            .send()
            .await
            .map_err(|err| MetadataFetchError::new(key, err.into()))?;

        if response.status().is_success() {
            let fields: Map<String, Value> = response
                .json()
                .await
                .map_err(|err| MetadataFetchError::new(key, err.into()))?;
            if let Some(message) = fields.get("error").and_then(Value::as_str) {
                return Err(MetadataFetchError::new(key, SourceError::rejected(message)));
            }
            Ok(RecordMetadata::new(fields))
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(MetadataFetchError::new(key, error_from_response(status, body)))
        }
    }
}

/// Maps an error response body to a source error.
///
/// The service wraps its own failures in `{"error": "..."}` JSON; any
/// other body is reported verbatim under the HTTP status.
fn error_from_response(status: u16, body: String) -> SourceError {
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error: Some(message),
        }) => SourceError::rejected(message),
        _ => SourceError::http(status, body),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoadResponse {
    #[serde(default)]
    success: bool,
    summary: Option<CollectionSummary>,
    error: Option<String>,
}

impl LoadResponse {
    fn into_summary(self) -> Result<CollectionSummary, SourceError> {
        match (self.success, self.summary) {
            (true, Some(summary)) => Ok(summary),
            _ => Err(SourceError::rejected(
                self.error
                    .unwrap_or_else(|| "collection load refused".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    image_b64: Option<String>,
    fetch_time_ms: Option<f64>,
    error: Option<String>,
}

impl ImageResponse {
    fn into_image(self) -> Result<ImageData, SourceError> {
        match self {
            Self {
                image_b64: Some(image_b64),
                fetch_time_ms,
                ..
            } => Ok(ImageData::new(image_b64, fetch_time_ms.unwrap_or_default())),
            Self {
                error: Some(message),
                ..
            } => Err(SourceError::rejected(message)),
            _ => Err(SourceError::parse(
                "image response carried neither payload nor error",
            )),
        }
    }
}
