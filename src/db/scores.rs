//! Per-photo quality and aesthetic scores.

use anyhow::Result;
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};

use super::{select_list, Store};

column_record! {
    /// Scores computed by the photo library. Any field may be missing.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct PhotoScore {
        overall: Option<f64>,
        aesthetics: Option<f64>,
        curation: Option<f64>,
        noise: Option<f64>,

        pleasant_camera_tilt: Option<f64>,
        pleasant_composition: Option<f64>,
        pleasant_lighting: Option<f64>,
        pleasant_pattern: Option<f64>,
        pleasant_subject_movement: Option<f64>,
        pleasant_symmetry: Option<f64>,
        pleasant_texture: Option<f64>,
        pleasant_tone: Option<f64>,

        utility_activity: Option<f64>,
        utility_blurry: Option<f64>,
        utility_colorful: Option<f64>,
        utility_interesting_subject: Option<f64>,
        utility_low_light: Option<f64>,
        utility_not_on_tripod: Option<f64>,
        utility_people: Option<f64>,
        utility_pet: Option<f64>,
        utility_poor_contrast: Option<f64>,
        utility_quality: Option<f64>,
        utility_sharply_focused: Option<f64>,
        utility_still_action: Option<f64>,
        utility_uninteresting_subject: Option<f64>,
        utility_vibrance: Option<f64>,

        curation_blurry: Option<f64>,
        curation_noise: Option<f64>,
        curation_interesting_subject: Option<f64>,
        curation_scene: Option<f64>,
        curation_light: Option<f64>,
        curation_activity: Option<f64>,
        curation_animated: Option<f64>,
        curation_face: Option<f64>,
        curation_landscape: Option<f64>,
        curation_time: Option<f64>,
        curation_version: Option<f64>,
    }
}

impl Store<'_> {
    /// Create or fully replace the score row of a photo.
    pub fn upsert_score(&self, photo_id: i64, score: &PhotoScore) -> Result<()> {
        let columns = PhotoScore::COLUMNS.join(", ");
        let placeholders = vec!["?"; PhotoScore::COLUMNS.len() + 1].join(", ");
        let updates = PhotoScore::COLUMNS
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO photo_scores (photo_id, {columns}) VALUES ({placeholders})
             ON CONFLICT(photo_id) DO UPDATE SET {updates}"
        );

        let mut values: Vec<&dyn ToSql> = vec![&photo_id];
        values.extend(score.sql_values());

        self.conn.execute(&sql, values.as_slice())?;
        Ok(())
    }

    pub fn get_score(&self, photo_id: i64) -> Result<Option<PhotoScore>> {
        let sql = format!(
            "SELECT {} FROM photo_scores s WHERE s.photo_id = ?",
            select_list("s", PhotoScore::COLUMNS)
        );
        let result = self.conn.query_row(&sql, [photo_id], PhotoScore::from_row);

        match result {
            Ok(score) => Ok(Some(score)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[test]
    fn test_upsert_replaces_every_field() {
        let db = memory_db();
        let store = db.store();
        let photo_id = store.insert_photo(&fields("SC1")).unwrap();

        let first = PhotoScore {
            overall: Some(0.8),
            aesthetics: Some(0.6),
            curation_version: Some(3.0),
            ..PhotoScore::default()
        };
        store.upsert_score(photo_id, &first).unwrap();
        assert_eq!(store.get_score(photo_id).unwrap(), Some(first));

        // Fields absent from the new snapshot become NULL, not stale values.
        let second = PhotoScore {
            overall: Some(0.2),
            utility_pet: Some(0.9),
            ..PhotoScore::default()
        };
        store.upsert_score(photo_id, &second).unwrap();
        assert_eq!(store.get_score(photo_id).unwrap(), Some(second));

        let rows: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM photo_scores", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_score_deleted_with_photo() {
        let db = memory_db();
        let store = db.store();
        let photo_id = store.insert_photo(&fields("SC2")).unwrap();
        store.upsert_score(photo_id, &PhotoScore::default()).unwrap();

        store.delete_photo(photo_id).unwrap();
        assert!(store.get_score(photo_id).unwrap().is_none());
    }

    #[test]
    fn test_score_deserializes_partial_record() {
        let score: PhotoScore =
            serde_json::from_str(r#"{"overall": 0.5, "utility_blurry": 0.1}"#).unwrap();
        assert_eq!(score.overall, Some(0.5));
        assert_eq!(score.utility_blurry, Some(0.1));
        assert_eq!(score.curation, None);
    }
}
