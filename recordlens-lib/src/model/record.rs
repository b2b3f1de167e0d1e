//! Collection records

use serde::Deserialize;
use serde_json::{Map, Value};

/// One record in a loaded collection.
///
/// Every collection provides the identifying `key` and the storage
/// `location` columns; any further server-defined columns are preserved
/// as raw JSON values. Records are immutable once fetched and their
/// position in the collection ordering never changes.
///
/// # Example
///
/// ```
/// use recordlens_lib::model::Record;
///
/// let record = Record::new("a1b2", "/data/shard0")
///     .with_field("width", 640);
///
/// assert_eq!(record.key(), "a1b2");
/// assert_eq!(record.field("width"), Some(&640.into()));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record {
    /// Unique identifier within the collection (wire name `uuid`).
    #[serde(rename = "uuid")]
    key: String,

    /// Opaque storage-location reference (wire name `filepath`).
    #[serde(rename = "filepath")]
    location: String,

    /// Extra server-defined columns, unmodeled.
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with the two required columns.
    pub fn new(key: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            location: location.into(),
            fields: Map::new(),
        }
    }

    /// Adds an extra column value, builder style.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Unique identifier within the collection.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Opaque storage-location reference.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Extra server-defined columns.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Looks up an extra column by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
