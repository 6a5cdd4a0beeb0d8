//! Bring the relationship sets of a stored photo in line with its source item.
//!
//! | Relationship   | Source absent    | Source present                     |
//! |----------------|------------------|------------------------------------|
//! | private albums | cleared          | cleared, then re-added             |
//! | shared albums  | untouched        | added to (replaced when pruning)   |
//! | persons        | cleared          | cleared, then re-added             |
//! | keywords       | cleared          | cleared, then re-added             |
//! | labels         | untouched        | cleared, then re-added             |
//! | score          | untouched        | every field replaced               |
//! | faces          | untouched        | all deleted, then inserted         |

use anyhow::Result;
use std::collections::BTreeSet;

use crate::db::{NewFace, Store, TagKind};
use crate::source::{SourceFace, SourceItem};

/// Distinct, non-blank names.
fn unique_names(names: &[String]) -> BTreeSet<&str> {
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect()
}

pub fn sync_relationships(
    store: &Store<'_>,
    photo_id: i64,
    item: &SourceItem,
    prune_shared_albums: bool,
) -> Result<()> {
    sync_albums(store, photo_id, item, prune_shared_albums)?;

    sync_tags(store, TagKind::Person, photo_id, &item.persons)?;
    sync_tags(store, TagKind::Keyword, photo_id, &item.keywords)?;
    if let Some(labels) = &item.labels {
        sync_tags(store, TagKind::Label, photo_id, labels)?;
    }

    if let Some(score) = &item.score {
        store.upsert_score(photo_id, score)?;
    }

    if let Some(faces) = &item.faces {
        sync_faces(store, photo_id, faces)?;
    }

    Ok(())
}

fn sync_albums(
    store: &Store<'_>,
    photo_id: i64,
    item: &SourceItem,
    prune_shared_albums: bool,
) -> Result<()> {
    store.clear_album_memberships(photo_id, false)?;
    for name in unique_names(&item.albums) {
        let album = store.get_or_create_album(name, false)?;
        store.add_photo_to_album(album, photo_id)?;
    }

    // Shared albums only grow unless pruning is enabled
    if let Some(shared) = &item.albums_shared {
        if prune_shared_albums {
            store.clear_album_memberships(photo_id, true)?;
        }
        for name in unique_names(shared) {
            let album = store.get_or_create_album(name, true)?;
            store.add_photo_to_album(album, photo_id)?;
        }
    }

    Ok(())
}

fn sync_tags(store: &Store<'_>, kind: TagKind, photo_id: i64, names: &[String]) -> Result<()> {
    store.clear_tag_memberships(kind, photo_id)?;
    for name in unique_names(names) {
        let tag = if kind == TagKind::Person {
            store.get_or_create_person(name, None)?
        } else {
            store.get_or_create_tag(kind, name)?
        };
        store.add_tag_to_photo(kind, tag, photo_id)?;
    }
    Ok(())
}

fn new_face(face: &SourceFace) -> NewFace {
    NewFace {
        person_id: None,
        center_x: face.center_x,
        center_y: face.center_y,
        width: face.width,
        height: face.height,
        age: face.age,
        gender: face.gender.clone().unwrap_or_default(),
        ethnicity: face.ethnicity.clone().unwrap_or_default(),
        quality: face.quality,
        is_hidden: face.is_hidden,
    }
}

fn sync_faces(store: &Store<'_>, photo_id: i64, faces: &[SourceFace]) -> Result<()> {
    let mut rows = Vec::with_capacity(faces.len());
    for face in faces {
        let row = new_face(face);
        // Reject bad boxes before any person gets created
        row.validate()?;
        rows.push(row);
    }

    for (row, face) in rows.iter_mut().zip(faces) {
        let Some(person) = &face.person else { continue };
        let Some(name) = person.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        row.person_id = Some(store.get_or_create_person(name, person.uuid.as_deref())?);
    }

    store.replace_faces(photo_id, &rows)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::db::{Database, PhotoScore};
    use crate::source::SourcePerson;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn setup(uuid: &str) -> (Database, i64) {
        let db = memory_db();
        let id = db.store().insert_photo(&fields(uuid)).unwrap();
        (db, id)
    }

    fn album_names(store: &Store<'_>, photo: i64, shared: bool) -> Vec<String> {
        store
            .albums_for_photo(photo)
            .unwrap()
            .into_iter()
            .filter(|a| a.is_shared == shared)
            .map(|a| a.name)
            .collect()
    }

    fn tag_names(store: &Store<'_>, kind: TagKind, photo: i64) -> Vec<String> {
        store
            .tags_for_photo(kind, photo)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect()
    }

    fn source_face(x: f64, person: Option<(&str, &str)>) -> SourceFace {
        SourceFace {
            center_x: x,
            center_y: 0.4,
            width: 0.2,
            height: 0.2,
            person: person.map(|(name, uuid)| SourcePerson {
                name: Some(name.to_string()),
                uuid: Some(uuid.to_string()),
            }),
            ..SourceFace::default()
        }
    }

    #[test]
    fn test_private_albums_replaced() {
        let (db, photo) = setup("R1");
        let store = db.store();

        let mut item = SourceItem {
            albums: names(&["Trip", "Best"]),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(album_names(&store, photo, false), vec!["Best", "Trip"]);

        item.albums = names(&["Trip"]);
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(album_names(&store, photo, false), vec!["Trip"]);

        item.albums.clear();
        sync_relationships(&store, photo, &item, false).unwrap();
        assert!(album_names(&store, photo, false).is_empty());
    }

    #[test]
    fn test_shared_albums_additive() {
        let (db, photo) = setup("R2");
        let store = db.store();

        let mut item = SourceItem {
            albums_shared: Some(names(&["Family"])),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();

        item.albums_shared = Some(names(&["Reunion"]));
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(album_names(&store, photo, true), vec!["Family", "Reunion"]);

        item.albums_shared = None;
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(album_names(&store, photo, true), vec!["Family", "Reunion"]);
    }

    #[test]
    fn test_shared_albums_pruned_when_enabled() {
        let (db, photo) = setup("R3");
        let store = db.store();

        let mut item = SourceItem {
            albums_shared: Some(names(&["Family"])),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, true).unwrap();
        item.albums_shared = Some(names(&["Reunion"]));
        sync_relationships(&store, photo, &item, true).unwrap();
        assert_eq!(album_names(&store, photo, true), vec!["Reunion"]);
    }

    #[test]
    fn test_private_and_shared_same_name() {
        let (db, photo) = setup("R4");
        let store = db.store();
        let item = SourceItem {
            albums: names(&["Family"]),
            albums_shared: Some(names(&["Family"])),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(store.albums_for_photo(photo).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_names_collapse() {
        let (db, photo) = setup("R5");
        let store = db.store();
        let item = SourceItem {
            keywords: names(&["beach", "beach", " beach ", ""]),
            persons: names(&["Ann", "Ann"]),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(tag_names(&store, TagKind::Keyword, photo), vec!["beach"]);
        assert_eq!(tag_names(&store, TagKind::Person, photo), vec!["Ann"]);
    }

    #[test]
    fn test_labels_only_touched_when_reported() {
        let (db, photo) = setup("R6");
        let store = db.store();

        let mut item = SourceItem {
            labels: Some(names(&["dog", "grass"])),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(tag_names(&store, TagKind::Label, photo), vec!["dog", "grass"]);

        item.labels = None;
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(tag_names(&store, TagKind::Label, photo), vec!["dog", "grass"]);

        item.labels = Some(vec![]);
        sync_relationships(&store, photo, &item, false).unwrap();
        assert!(tag_names(&store, TagKind::Label, photo).is_empty());
    }

    #[test]
    fn test_score_replaced_or_left_alone() {
        let (db, photo) = setup("R7");
        let store = db.store();

        let mut item = SourceItem {
            score: Some(PhotoScore {
                overall: Some(0.8),
                noise: Some(0.1),
                ..PhotoScore::default()
            }),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();

        item.score = Some(PhotoScore {
            overall: Some(0.3),
            ..PhotoScore::default()
        });
        sync_relationships(&store, photo, &item, false).unwrap();
        let score = store.get_score(photo).unwrap().unwrap();
        assert_eq!(score.overall, Some(0.3));
        assert_eq!(score.noise, None);

        item.score = None;
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(store.get_score(photo).unwrap().unwrap().overall, Some(0.3));
    }

    #[test]
    fn test_faces_replaced_with_people() {
        let (db, photo) = setup("R8");
        let store = db.store();

        let mut item = SourceItem {
            faces: Some(vec![
                source_face(0.1, Some(("Ann", "P-ANN"))),
                source_face(0.2, None),
                source_face(0.3, Some(("Ann", "P-ANN"))),
                source_face(0.4, Some(("Ben", "P-BEN"))),
            ]),
            ..SourceItem::default()
        };
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(store.faces_for_photo(photo).unwrap().len(), 4);

        item.faces = Some(vec![
            source_face(0.5, Some(("Ann", "P-ANN"))),
            source_face(0.6, None),
            source_face(0.7, Some(("Cat", "P-CAT"))),
        ]);
        sync_relationships(&store, photo, &item, false).unwrap();

        let faces = store.faces_for_photo(photo).unwrap();
        assert_eq!(faces.len(), 3);
        let people: Vec<Option<&str>> = faces.iter().map(|f| f.person_name.as_deref()).collect();
        assert_eq!(people, vec![Some("Ann"), None, Some("Cat")]);

        let cat = store.find_tag(TagKind::Person, "Cat").unwrap().unwrap();
        assert_eq!(
            store.get_person(cat).unwrap().unwrap().uuid.as_deref(),
            Some("P-CAT")
        );

        item.faces = None;
        sync_relationships(&store, photo, &item, false).unwrap();
        assert_eq!(store.faces_for_photo(photo).unwrap().len(), 3);
    }

    #[test]
    fn test_bad_face_box_is_an_error() {
        let (db, photo) = setup("R9");
        let store = db.store();
        let item = SourceItem {
            faces: Some(vec![source_face(1.4, Some(("Dee", "P-DEE")))]),
            ..SourceItem::default()
        };

        let err = sync_relationships(&store, photo, &item, false).unwrap_err();
        assert!(err.downcast_ref::<crate::db::FaceBoxError>().is_some());
        assert!(store.find_tag(TagKind::Person, "Dee").unwrap().is_none());
    }
}
