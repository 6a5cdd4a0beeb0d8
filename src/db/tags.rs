//! Name-keyed tags attached to photos: people, keywords and labels.

use anyhow::Result;
use rusqlite::params;
use serde::Serialize;

use super::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    Person,
    Keyword,
    Label,
}

impl TagKind {
    pub const ALL: [TagKind; 3] = [TagKind::Person, TagKind::Keyword, TagKind::Label];

    pub(crate) fn table(self) -> &'static str {
        match self {
            TagKind::Person => "people",
            TagKind::Keyword => "keywords",
            TagKind::Label => "labels",
        }
    }

    pub(crate) fn join_table(self) -> &'static str {
        match self {
            TagKind::Person => "photo_people",
            TagKind::Keyword => "photo_keywords",
            TagKind::Label => "photo_labels",
        }
    }

    pub(crate) fn key_column(self) -> &'static str {
        match self {
            TagKind::Person => "person_id",
            TagKind::Keyword => "keyword_id",
            TagKind::Label => "label_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Store<'_> {
    pub fn find_tag(&self, kind: TagKind, name: &str) -> Result<Option<i64>> {
        let sql = format!("SELECT id FROM {} WHERE name = ?", kind.table());
        let result = self.conn.query_row(&sql, [name], |row| row.get(0));

        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_or_create_tag(&self, kind: TagKind, name: &str) -> Result<i64> {
        if let Some(id) = self.find_tag(kind, name)? {
            return Ok(id);
        }
        let sql = format!("INSERT INTO {} (name) VALUES (?)", kind.table());
        self.conn.execute(&sql, [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn add_tag_to_photo(&self, kind: TagKind, tag_id: i64, photo_id: i64) -> Result<()> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} ({}, photo_id) VALUES (?, ?)",
            kind.join_table(),
            kind.key_column()
        );
        self.conn.execute(&sql, params![tag_id, photo_id])?;
        Ok(())
    }

    pub fn clear_tag_memberships(&self, kind: TagKind, photo_id: i64) -> Result<usize> {
        let sql = format!("DELETE FROM {} WHERE photo_id = ?", kind.join_table());
        Ok(self.conn.execute(&sql, [photo_id])?)
    }

    pub fn tags_for_photo(&self, kind: TagKind, photo_id: i64) -> Result<Vec<Tag>> {
        let sql = format!(
            r#"
            SELECT t.id, t.name
            FROM {table} t
            JOIN {join} j ON j.{key} = t.id
            WHERE j.photo_id = ?
            ORDER BY t.name
            "#,
            table = kind.table(),
            join = kind.join_table(),
            key = kind.key_column(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tags = stmt
            .query_map([photo_id], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }
}
