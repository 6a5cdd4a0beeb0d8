//! Albums and album membership.

use anyhow::Result;
use rusqlite::params;
use serde::Serialize;

use super::Store;

/// An album (collection of photos), private or shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub is_shared: bool,
}

impl Store<'_> {
    /// Look up an album by its natural key `(name, is_shared)`, creating it if absent.
    pub fn get_or_create_album(&self, name: &str, is_shared: bool) -> Result<i64> {
        let existing = self.conn.query_row(
            "SELECT id FROM albums WHERE name = ? AND is_shared = ?",
            params![name, is_shared],
            |row| row.get(0),
        );

        match existing {
            Ok(id) => Ok(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                self.conn.execute(
                    "INSERT INTO albums (name, is_shared) VALUES (?, ?)",
                    params![name, is_shared],
                )?;
                Ok(self.conn.last_insert_rowid())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn add_photo_to_album(&self, album_id: i64, photo_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO album_photos (album_id, photo_id) VALUES (?, ?)",
            params![album_id, photo_id],
        )?;
        Ok(())
    }

    /// Remove a photo from every album of the given scope. Albums themselves stay.
    pub fn clear_album_memberships(&self, photo_id: i64, is_shared: bool) -> Result<usize> {
        let removed = self.conn.execute(
            r#"
            DELETE FROM album_photos
            WHERE photo_id = ?
              AND album_id IN (SELECT id FROM albums WHERE is_shared = ?)
            "#,
            params![photo_id, is_shared],
        )?;
        Ok(removed)
    }

    pub fn albums_for_photo(&self, photo_id: i64) -> Result<Vec<Album>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.name, a.is_shared
            FROM albums a
            JOIN album_photos ap ON ap.album_id = a.id
            WHERE ap.photo_id = ?
            ORDER BY a.name, a.is_shared
            "#,
        )?;
        let albums = stmt
            .query_map([photo_id], |row| {
                Ok(Album {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    is_shared: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(albums)
    }
}
