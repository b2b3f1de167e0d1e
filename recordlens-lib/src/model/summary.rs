//! Collection summary statistics

use serde::Deserialize;

/// Summary returned by the one-time collection load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionSummary {
    /// Number of records in the server-defined ordering.
    pub total_records: usize,

    /// Number of distinct storage locations backing the collection
    /// (wire name `unique_filepaths`).
    #[serde(rename = "unique_filepaths")]
    pub unique_locations: usize,

    /// Column names present in the collection.
    #[serde(default)]
    pub columns: Vec<String>,
}

impl CollectionSummary {
    /// Creates a summary without column information.
    pub fn new(total_records: usize, unique_locations: usize) -> Self {
        Self {
            total_records,
            unique_locations,
            columns: Vec::new(),
        }
    }

    /// Sets the column names, builder style.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Total record count with thousands separators, for status lines.
    pub fn formatted_total(&self) -> String {
        group_thousands(self.total_records)
    }

    /// Unique location count with thousands separators.
    pub fn formatted_locations(&self) -> String {
        group_thousands(self.unique_locations)
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
