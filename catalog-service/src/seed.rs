//! Bulk loading of catalog data
//!
//! The seed file is a JSON array of documents. Each record goes through the
//! collection's schema like any other create; records the schema rejects
//! are logged and skipped so one bad entry does not abort the import.

use std::path::Path;

use serde_json::Value;

use crate::catalog::validation::slugify;
use crate::error::{Error, Result};
use crate::store::{Collection, Filter};

/// Outcome of an import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Records stored
    pub inserted: usize,
    /// Records rejected by the schema
    pub skipped: usize,
}

/// Imports into and clears one collection
#[derive(Debug, Clone)]
pub struct Seeder<C> {
    collection: C,
}

impl<C: Collection> Seeder<C> {
    /// Seed `collection`
    pub fn new(collection: C) -> Self {
        Self { collection }
    }

    /// Insert every record; a missing `slug` is derived from `title`
    pub async fn import(&self, records: Vec<Value>) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for (index, record) in records.into_iter().enumerate() {
            let Value::Object(mut document) = record else {
                tracing::warn!(collection = self.collection.name(), index, "seed record is not an object");
                report.skipped += 1;
                continue;
            };
            if !document.contains_key("slug") {
                if let Some(title) = document.get("title").and_then(Value::as_str) {
                    let slug = slugify(title);
                    document.insert("slug".to_string(), Value::String(slug));
                }
            }

            match self.collection.create(document).await {
                Ok(_) => report.inserted += 1,
                Err(e) => {
                    tracing::warn!(collection = self.collection.name(), index, error = %e, "skipping seed record");
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            collection = self.collection.name(),
            inserted = report.inserted,
            skipped = report.skipped,
            "Data inserted"
        );
        Ok(report)
    }

    /// Read a JSON array from `path` and import it
    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<SeedReport> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let records = match serde_json::from_slice::<Value>(&bytes)? {
            Value::Array(records) => records,
            _ => {
                return Err(Error::Other(format!(
                    "seed file {} must contain a JSON array",
                    path.display()
                )))
            }
        };
        tracing::info!(file = %path.display(), records = records.len(), "Loading seed file");
        self.import(records).await
    }

    /// Remove every document from the collection
    pub async fn destroy(&self) -> Result<u64> {
        let removed = self.collection.delete_many(&Filter::new()).await?;
        tracing::info!(collection = self.collection.name(), removed, "Data destroyed");
        Ok(removed)
    }
}
