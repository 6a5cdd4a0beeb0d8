//! Photo rows: the mirrored scalar attributes of each source item.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, ToSql};
use serde::{Deserialize, Serialize};

use super::{select_list, Store};

column_record! {
    /// Every scalar column written by sync. Text columns are never NULL;
    /// absent source values become empty strings.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct PhotoFields {
        uuid: String,
        original_filename: String,
        filename: String,
        path: String,
        path_edited: String,

        is_photo: bool,
        is_movie: bool,
        is_cloud_photo: bool,
        has_adjustments: bool,
        is_missing: bool,

        date: Option<DateTime<Utc>>,
        date_modified: Option<DateTime<Utc>>,
        date_added: Option<DateTime<Utc>>,
        exif_datetime: Option<DateTime<Utc>>,

        title: String,
        description: String,

        latitude: Option<f64>,
        longitude: Option<f64>,
        place_name: String,
        place_country_code: String,
        place_address: String,
        place_is_home: bool,

        uti: String,
        live_photo: bool,
        live_photo_video_uuid: String,
        live_photo_video_path: String,
        is_burst: bool,
        burst_uuid: String,
        is_hdr: bool,
        is_portrait: bool,
        is_screenshot: bool,
        is_slow_mo: bool,
        is_selfie: bool,
        is_panorama: bool,
        has_raw: bool,
        raw_path: String,

        orientation: Option<i64>,
        height: Option<i64>,
        width: Option<i64>,
        /// Seconds, for videos
        duration: Option<f64>,

        camera_make: String,
        camera_model: String,
        fstop: Option<f64>,
        aperture: Option<f64>,
        iso: Option<i64>,
        focal_length: Option<f64>,
        exposure_time: Option<f64>,

        timezone_name: String,
        timezone_offset: Option<i64>,

        favorite: bool,
        hidden: bool,
        in_trash: bool,
        shared: bool,

        original_file_size: Option<i64>,
    }
}

/// A stored photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    pub id: i64,
    #[serde(flatten)]
    pub fields: PhotoFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Photo {
    pub(crate) fn select_sql(alias: &str) -> String {
        format!(
            "{alias}.id AS id, {}, {alias}.created_at AS created_at, {alias}.updated_at AS updated_at",
            select_list(alias, PhotoFields::COLUMNS)
        )
    }

    pub(crate) fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            fields: PhotoFields::from_row(row)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// What the reconciler needs to know about an existing photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoState {
    pub id: i64,
    pub date_modified: Option<DateTime<Utc>>,
}

impl Store<'_> {
    pub fn find_photo_state(&self, uuid: &str) -> Result<Option<PhotoState>> {
        let result = self.conn.query_row(
            "SELECT id, date_modified FROM photos WHERE uuid = ?",
            [uuid],
            |row| {
                Ok(PhotoState {
                    id: row.get(0)?,
                    date_modified: row.get(1)?,
                })
            },
        );

        match result {
            Ok(state) => Ok(Some(state)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_photo(&self, fields: &PhotoFields) -> Result<i64> {
        let now = Utc::now();
        let columns = PhotoFields::COLUMNS.join(", ");
        let placeholders = vec!["?"; PhotoFields::COLUMNS.len() + 2].join(", ");
        let sql = format!(
            "INSERT INTO photos ({columns}, created_at, updated_at) VALUES ({placeholders})"
        );

        let mut values = fields.sql_values();
        values.push(&now as &dyn ToSql);
        values.push(&now as &dyn ToSql);

        self.conn.execute(&sql, values.as_slice())?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrite every scalar column of an existing photo.
    pub fn update_photo(&self, id: i64, fields: &PhotoFields) -> Result<()> {
        let now = Utc::now();
        let assignments = PhotoFields::COLUMNS
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE photos SET {assignments}, updated_at = ? WHERE id = ?");

        let mut values = fields.sql_values();
        values.push(&now as &dyn ToSql);
        values.push(&id as &dyn ToSql);

        let changed = self.conn.execute(&sql, values.as_slice())?;
        if changed == 0 {
            anyhow::bail!("photo {} does not exist", id);
        }
        Ok(())
    }

    pub fn get_photo(&self, id: i64) -> Result<Option<Photo>> {
        let sql = format!("SELECT {} FROM photos p WHERE p.id = ?", Photo::select_sql("p"));
        let result = self.conn.query_row(&sql, [id], Photo::from_row);

        match result {
            Ok(photo) => Ok(Some(photo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_photo_by_uuid(&self, uuid: &str) -> Result<Option<Photo>> {
        let sql = format!("SELECT {} FROM photos p WHERE p.uuid = ?", Photo::select_sql("p"));
        let result = self.conn.query_row(&sql, [uuid], Photo::from_row);

        match result {
            Ok(photo) => Ok(Some(photo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a photo together with its score, faces and memberships.
    pub fn delete_photo(&self, id: i64) -> Result<bool> {
        let deleted = self.conn.execute("DELETE FROM photos WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    pub fn count_photos(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count)
    }
}
