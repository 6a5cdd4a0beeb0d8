//! Database functions for faces and people.

use anyhow::Result;
use rusqlite::params;
use serde::Serialize;

use super::tags::TagKind;
use super::Store;

/// A named person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub uuid: Option<String>,
}

/// A face as stored, with the linked person's name when identified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Face {
    pub id: i64,
    pub photo_id: i64,
    pub person_id: Option<i64>,
    pub person_name: Option<String>,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub age: Option<i64>,
    pub gender: String,
    pub ethnicity: String,
    pub quality: Option<f64>,
    pub is_hidden: bool,
}

/// A face about to be inserted. Box coordinates are normalized to the image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewFace {
    pub person_id: Option<i64>,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
    pub age: Option<i64>,
    pub gender: String,
    pub ethnicity: String,
    pub quality: Option<f64>,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FaceBoxError {
    #[error("face {field} = {value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },
}

impl NewFace {
    pub fn validate(&self) -> Result<(), FaceBoxError> {
        let coords = [
            ("center_x", self.center_x),
            ("center_y", self.center_y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (field, value) in coords {
            // NaN fails the range check too
            if !(0.0..=1.0).contains(&value) {
                return Err(FaceBoxError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

impl Store<'_> {
    // ========================================================================
    // People
    // ========================================================================

    /// Find a person by name, or create one carrying `uuid`.
    /// The uuid is only recorded at creation.
    pub fn get_or_create_person(&self, name: &str, uuid: Option<&str>) -> Result<i64> {
        if let Some(id) = self.find_tag(TagKind::Person, name)? {
            return Ok(id);
        }
        self.conn.execute(
            "INSERT INTO people (name, uuid) VALUES (?, ?)",
            params![name, uuid],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_person(&self, person_id: i64) -> Result<Option<Person>> {
        let result = self.conn.query_row(
            "SELECT id, name, uuid FROM people WHERE id = ?",
            [person_id],
            |row| {
                Ok(Person {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    uuid: row.get(2)?,
                })
            },
        );

        match result {
            Ok(person) => Ok(Some(person)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a person (faces will have person_id set to NULL)
    pub fn delete_person(&self, person_id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM people WHERE id = ?", params![person_id])?;
        Ok(())
    }

    // ========================================================================
    // Faces
    // ========================================================================

    /// Replace all faces of a photo. Every box is validated before anything
    /// is deleted.
    pub fn replace_faces(&self, photo_id: i64, faces: &[NewFace]) -> Result<usize> {
        for face in faces {
            face.validate()?;
        }

        self.conn
            .execute("DELETE FROM faces WHERE photo_id = ?", [photo_id])?;

        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO faces (photo_id, person_id, center_x, center_y, width, height,
                               age, gender, ethnicity, quality, is_hidden)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )?;
        for face in faces {
            stmt.execute(params![
                photo_id,
                face.person_id,
                face.center_x,
                face.center_y,
                face.width,
                face.height,
                face.age,
                face.gender,
                face.ethnicity,
                face.quality,
                face.is_hidden,
            ])?;
        }

        Ok(faces.len())
    }

    pub fn faces_for_photo(&self, photo_id: i64) -> Result<Vec<Face>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT f.id, f.photo_id, f.person_id, p.name,
                   f.center_x, f.center_y, f.width, f.height,
                   f.age, f.gender, f.ethnicity, f.quality, f.is_hidden
            FROM faces f
            LEFT JOIN people p ON p.id = f.person_id
            WHERE f.photo_id = ?
            ORDER BY f.id
            "#,
        )?;

        let faces = stmt
            .query_map([photo_id], |row| {
                Ok(Face {
                    id: row.get(0)?,
                    photo_id: row.get(1)?,
                    person_id: row.get(2)?,
                    person_name: row.get(3)?,
                    center_x: row.get(4)?,
                    center_y: row.get(5)?,
                    width: row.get(6)?,
                    height: row.get(7)?,
                    age: row.get(8)?,
                    gender: row.get(9)?,
                    ethnicity: row.get(10)?,
                    quality: row.get(11)?,
                    is_hidden: row.get(12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(faces)
    }
}
