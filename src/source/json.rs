//! A catalog exported as a JSON array of items, one object per photo.

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use super::{CatalogEntry, CatalogSource, InvalidItem, SourceError, SourceItem};

pub struct JsonCatalog {
    path: PathBuf,
    records: Vec<Value>,
}

impl JsonCatalog {
    /// Load the whole export. A file that cannot be read, or that is not a
    /// JSON array, is fatal for the pass; each record is mapped on fetch.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: display.clone(),
            source,
        })?;
        let records: Vec<Value> =
            serde_json::from_str(&raw).map_err(|source| SourceError::Parse {
                path: display,
                source,
            })?;

        tracing::debug!(path = %path.display(), items = records.len(), "Loaded catalog");

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn map_record(record: &Value) -> CatalogEntry {
    SourceItem::deserialize(record).map_err(|source| InvalidItem {
        uuid: record
            .get("uuid")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        source,
    })
}

impl CatalogSource for JsonCatalog {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn fetch(&mut self, offset: usize, count: usize) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .records
            .iter()
            .skip(offset)
            .take(count)
            .map(map_record)
            .collect())
    }
}
