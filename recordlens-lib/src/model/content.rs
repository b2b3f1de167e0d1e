//! Per-record detail payloads

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Image payload for a selected record, as served.
///
/// The image stays in its transport encoding until a front-end actually
/// needs the raw bytes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes.
    pub image_b64: String,

    /// Server-measured fetch time in milliseconds.
    pub fetch_time_ms: f64,
}

impl ImageData {
    /// Creates an image payload from its encoded form.
    pub fn new(image_b64: impl Into<String>, fetch_time_ms: f64) -> Self {
        Self {
            image_b64: image_b64.into(),
            fetch_time_ms,
        }
    }

    /// Decodes the transport encoding into raw image bytes.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.image_b64)
    }

    /// Encoded payload length in bytes.
    pub fn encoded_len(&self) -> usize {
        self.image_b64.len()
    }
}

/// Field/value table describing one record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RecordMetadata {
    fields: Map<String, Value>,
}

impl RecordMetadata {
    /// Creates a metadata table from raw fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Adds a field value, builder style.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Looks up a field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Iterates over all field/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the table has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
