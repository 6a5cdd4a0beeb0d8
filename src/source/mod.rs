//! The read-only photo library catalog that sync mirrors.
//!
//! A catalog is anything that can report its size and hand out items in
//! pages. Fields that only some library versions expose are `Option` so the
//! sync engine can tell "absent" from "empty".

pub mod json;
pub mod timestamp;

use anyhow::Result;
use serde::{Deserialize, Deserializer};

use crate::db::PhotoScore;

pub use json::JsonCatalog;
pub use timestamp::SourceTimestamp;

/// Errors raised while loading or parsing a catalog.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
}

/// A catalog record that could not be read as a [`SourceItem`].
#[derive(Debug, thiserror::Error)]
#[error("invalid catalog item: {source}")]
pub struct InvalidItem {
    /// The record's `uuid` when it has a string one, otherwise empty.
    pub uuid: String,
    #[source]
    pub source: serde_json::Error,
}

/// One fetched record. A record that fails to map is reported on its own
/// and does not stop the pass.
pub type CatalogEntry = std::result::Result<SourceItem, InvalidItem>;

/// A source of catalog items, paged by position.
pub trait CatalogSource {
    /// Total number of items in the catalog.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries `offset..offset + count`, clipped to the catalog size.
    fn fetch(&mut self, offset: usize, count: usize) -> Result<Vec<CatalogEntry>>;
}

/// One photo or video as described by the library.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceItem {
    pub uuid: String,
    pub original_filename: Option<String>,
    pub filename: Option<String>,
    pub path: Option<String>,
    pub path_edited: Option<String>,

    #[serde(alias = "isphoto", deserialize_with = "null_as_default")]
    pub is_photo: bool,
    #[serde(alias = "ismovie", deserialize_with = "null_as_default")]
    pub is_movie: bool,
    #[serde(alias = "iscloudphoto", alias = "iscloudasset", deserialize_with = "null_as_default")]
    pub is_cloud_photo: bool,
    #[serde(alias = "hasadjustments", deserialize_with = "null_as_default")]
    pub has_adjustments: bool,
    #[serde(alias = "ismissing", deserialize_with = "null_as_default")]
    pub is_missing: bool,

    pub date: Option<SourceTimestamp>,
    pub date_modified: Option<SourceTimestamp>,
    pub date_added: Option<SourceTimestamp>,
    pub exif_datetime: Option<SourceTimestamp>,

    pub title: Option<String>,
    pub description: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place: Option<SourcePlace>,

    pub uti: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub live_photo: bool,
    pub live_photo_video_uuid: Option<String>,
    pub live_photo_video_path: Option<String>,
    #[serde(alias = "isburst", alias = "burst", deserialize_with = "null_as_default")]
    pub is_burst: bool,
    pub burst_uuid: Option<String>,
    #[serde(alias = "ishdr", alias = "hdr", deserialize_with = "null_as_default")]
    pub is_hdr: bool,
    #[serde(alias = "isportrait", alias = "portrait", deserialize_with = "null_as_default")]
    pub is_portrait: bool,
    #[serde(alias = "isscreenshot", alias = "screenshot", deserialize_with = "null_as_default")]
    pub is_screenshot: bool,
    #[serde(alias = "isslow_mo", alias = "slow_mo", deserialize_with = "null_as_default")]
    pub is_slow_mo: bool,
    #[serde(alias = "isselfie", alias = "selfie", deserialize_with = "null_as_default")]
    pub is_selfie: bool,
    #[serde(alias = "ispanorama", alias = "panorama", deserialize_with = "null_as_default")]
    pub is_panorama: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub has_raw: bool,
    #[serde(alias = "path_raw")]
    pub raw_path: Option<String>,

    pub orientation: Option<i64>,
    pub height: Option<i64>,
    pub width: Option<i64>,
    pub duration: Option<f64>,

    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub fstop: Option<f64>,
    pub aperture: Option<f64>,
    pub iso: Option<i64>,
    pub focal_length: Option<f64>,
    pub exposure_time: Option<f64>,

    pub timezone_name: Option<String>,
    pub timezone_offset: Option<i64>,

    #[serde(deserialize_with = "null_as_default")]
    pub favorite: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub hidden: bool,
    #[serde(alias = "intrash", deserialize_with = "null_as_default")]
    pub in_trash: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub shared: bool,

    #[serde(alias = "original_filesize")]
    pub original_file_size: Option<i64>,

    /// Private album names.
    #[serde(deserialize_with = "null_as_default")]
    pub albums: Vec<String>,
    /// Shared album names; `None` when the library does not report them.
    pub albums_shared: Option<Vec<String>>,
    #[serde(deserialize_with = "null_as_default")]
    pub persons: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    /// `None` when the library does not report labels.
    pub labels: Option<Vec<String>>,

    pub score: Option<PhotoScore>,
    /// `None` when the library does not report face information.
    #[serde(alias = "face_info")]
    pub faces: Option<Vec<SourceFace>>,
}

/// Treat an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcePlace {
    pub name: Option<String>,
    pub country_code: Option<String>,
    #[serde(alias = "address_str")]
    pub address: Option<String>,
    #[serde(alias = "ishome", deserialize_with = "null_as_default")]
    pub is_home: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourceFace {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub ethnicity: Option<String>,
    pub quality: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_hidden: bool,
    #[serde(alias = "person_info")]
    pub person: Option<SourcePerson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcePerson {
    pub name: Option<String>,
    pub uuid: Option<String>,
}

/// An in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct VecCatalog {
    items: Vec<SourceItem>,
}

impl VecCatalog {
    pub fn new(items: Vec<SourceItem>) -> Self {
        Self { items }
    }

    pub fn items_mut(&mut self) -> &mut Vec<SourceItem> {
        &mut self.items
    }
}

impl CatalogSource for VecCatalog {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn fetch(&mut self, offset: usize, count: usize) -> Result<Vec<CatalogEntry>> {
        Ok(self
            .items
            .iter()
            .skip(offset)
            .take(count)
            .cloned()
            .map(Ok)
            .collect())
    }
}
