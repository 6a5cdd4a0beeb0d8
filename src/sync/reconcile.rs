//! Create/update/skip decisions for a single source item.

use chrono::{DateTime, Utc};

use crate::db::{PhotoFields, PhotoState};
use crate::source::SourceItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No stored photo has this uuid.
    Create,
    /// Overwrite the stored photo with this id.
    Update(i64),
    /// The stored photo with this id is current.
    Skip(i64),
}

/// Decide what to do with a source item given what is already stored.
///
/// A photo is only skipped when both sides carry a modification date and the
/// stored one is not older than the source's. Missing dates always update.
pub fn decide(
    existing: Option<PhotoState>,
    source_modified: Option<DateTime<Utc>>,
    force: bool,
) -> Decision {
    let Some(existing) = existing else {
        return Decision::Create;
    };
    if force {
        return Decision::Update(existing.id);
    }
    match (existing.date_modified, source_modified) {
        (Some(stored), Some(source)) if stored >= source => Decision::Skip(existing.id),
        _ => Decision::Update(existing.id),
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl From<&SourceItem> for PhotoFields {
    fn from(item: &SourceItem) -> Self {
        let place = item.place.clone().unwrap_or_default();

        PhotoFields {
            uuid: item.uuid.clone(),
            original_filename: text(&item.original_filename),
            filename: text(&item.filename),
            path: text(&item.path),
            path_edited: text(&item.path_edited),

            is_photo: item.is_photo,
            is_movie: item.is_movie,
            is_cloud_photo: item.is_cloud_photo,
            has_adjustments: item.has_adjustments,
            is_missing: item.is_missing,

            date: item.date.map(|d| d.to_utc()),
            date_modified: item.date_modified.map(|d| d.to_utc()),
            date_added: item.date_added.map(|d| d.to_utc()),
            exif_datetime: item.exif_datetime.map(|d| d.to_utc()),

            title: text(&item.title),
            description: text(&item.description),

            latitude: item.latitude,
            longitude: item.longitude,
            place_name: place.name.unwrap_or_default(),
            place_country_code: place.country_code.unwrap_or_default(),
            place_address: place.address.unwrap_or_default(),
            place_is_home: place.is_home,

            uti: text(&item.uti),
            live_photo: item.live_photo,
            live_photo_video_uuid: text(&item.live_photo_video_uuid),
            live_photo_video_path: text(&item.live_photo_video_path),
            is_burst: item.is_burst,
            burst_uuid: text(&item.burst_uuid),
            is_hdr: item.is_hdr,
            is_portrait: item.is_portrait,
            is_screenshot: item.is_screenshot,
            is_slow_mo: item.is_slow_mo,
            is_selfie: item.is_selfie,
            is_panorama: item.is_panorama,
            has_raw: item.has_raw,
            raw_path: text(&item.raw_path),

            orientation: item.orientation,
            height: item.height,
            width: item.width,
            duration: item.duration,

            camera_make: text(&item.camera_make),
            camera_model: text(&item.camera_model),
            fstop: item.fstop,
            aperture: item.aperture,
            iso: item.iso,
            focal_length: item.focal_length,
            exposure_time: item.exposure_time,

            timezone_name: text(&item.timezone_name),
            timezone_offset: item.timezone_offset,

            favorite: item.favorite,
            hidden: item.hidden,
            in_trash: item.in_trash,
            shared: item.shared,

            original_file_size: item.original_file_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourcePlace, SourceTimestamp};
    use chrono::{Duration, TimeZone};

    fn state(modified: Option<DateTime<Utc>>) -> Option<PhotoState> {
        Some(PhotoState {
            id: 7,
            date_modified: modified,
        })
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_create_when_missing() {
        assert_eq!(decide(None, Some(t0()), false), Decision::Create);
        assert_eq!(decide(None, None, true), Decision::Create);
    }

    #[test]
    fn test_skip_when_stored_not_older() {
        assert_eq!(decide(state(Some(t0())), Some(t0()), false), Decision::Skip(7));
        assert_eq!(
            decide(state(Some(t0())), Some(t0() - Duration::hours(1)), false),
            Decision::Skip(7)
        );
    }

    #[test]
    fn test_update_when_source_newer() {
        assert_eq!(
            decide(state(Some(t0())), Some(t0() + Duration::seconds(1)), false),
            Decision::Update(7)
        );
    }

    #[test]
    fn test_missing_dates_never_skip() {
        assert_eq!(decide(state(None), Some(t0()), false), Decision::Update(7));
        assert_eq!(decide(state(Some(t0())), None, false), Decision::Update(7));
        assert_eq!(decide(state(None), None, false), Decision::Update(7));
    }

    #[test]
    fn test_force_always_updates() {
        assert_eq!(decide(state(Some(t0())), Some(t0()), true), Decision::Update(7));
    }

    #[test]
    fn test_offsets_are_normalized() {
        // 11:00+02:00 is the same instant as 09:00Z
        let source: SourceTimestamp = "2024-05-01T11:00:00+02:00".parse().unwrap();
        assert_eq!(
            decide(state(Some(t0())), Some(source.to_utc()), false),
            Decision::Skip(7)
        );
    }

    #[test]
    fn test_fields_default_absent_values() {
        let item = SourceItem {
            uuid: "X".to_string(),
            is_photo: true,
            ..SourceItem::default()
        };
        let fields = PhotoFields::from(&item);

        assert_eq!(fields.uuid, "X");
        assert_eq!(fields.title, "");
        assert_eq!(fields.live_photo_video_uuid, "");
        assert_eq!(fields.raw_path, "");
        assert!(fields.is_photo);
        assert!(!fields.is_burst);
        assert_eq!(fields.latitude, None);
        assert_eq!(fields.date, None);
    }

    #[test]
    fn test_fields_flatten_place() {
        let item = SourceItem {
            uuid: "P".to_string(),
            place: Some(SourcePlace {
                name: Some("Lisbon".to_string()),
                country_code: Some("PT".to_string()),
                address: None,
                is_home: true,
            }),
            date: Some(SourceTimestamp::from(t0())),
            ..SourceItem::default()
        };
        let fields = PhotoFields::from(&item);

        assert_eq!(fields.place_name, "Lisbon");
        assert_eq!(fields.place_country_code, "PT");
        assert_eq!(fields.place_address, "");
        assert!(fields.place_is_home);
        assert_eq!(fields.date, Some(t0()));
    }
}
