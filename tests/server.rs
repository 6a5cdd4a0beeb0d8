//! HTTP routes exercised in-process.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{ImageFormat, RgbImage};
use photomirror::config::Config;
use photomirror::db::Database;
use photomirror::serve::{router, AppState};
use photomirror::source::{SourceItem, VecCatalog};
use photomirror::sync::{SyncOptions, Syncer};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

struct Fixture {
    _dir: TempDir,
    state: AppState,
    ids: Vec<i64>,
}

impl Fixture {
    fn app(&self) -> Router {
        router(self.state.clone())
    }
}

fn item(uuid: &str, path: &Path) -> SourceItem {
    SourceItem {
        uuid: uuid.to_string(),
        filename: Some(format!("{uuid}.png")),
        path: Some(path.display().to_string()),
        is_photo: true,
        ..SourceItem::default()
    }
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();

    let good = dir.path().join("good.png");
    RgbImage::from_pixel(120, 80, image::Rgb([10, 120, 200]))
        .save_with_format(&good, ImageFormat::Png)
        .unwrap();
    let broken = dir.path().join("broken.png");
    std::fs::write(&broken, b"definitely not a png").unwrap();
    let missing = dir.path().join("missing.png");

    let mut first = item("GOOD", &good);
    first.favorite = true;
    first.keywords = vec!["holiday".to_string()];
    first.persons = vec!["Ann".to_string()];
    let items = vec![first, item("BROKEN", &broken), item("MISSING", &missing)];

    let mut db = Database::open(&dir.path().join("mirror.db")).unwrap();
    db.initialize().unwrap();
    Syncer::new(SyncOptions::default())
        .unwrap()
        .run(&mut db, &mut VecCatalog::new(items), None)
        .unwrap();

    let ids = ["GOOD", "BROKEN", "MISSING"]
        .iter()
        .map(|uuid| db.store().get_photo_by_uuid(uuid).unwrap().unwrap().id)
        .collect();

    let config = Config::default();
    Fixture {
        _dir: dir,
        state: AppState::new(db, &config),
        ids,
    }
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, content_type, body)
}

async fn get_json(app: Router, uri: &str) -> Value {
    let (status, _, body) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK, "{uri}");
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_thumbnail_is_jpeg_within_size() {
    let fx = fixture();
    let uri = format!("/photo/{}/thumbnail?size=60", fx.ids[0]);
    let (status, content_type, body) = get(fx.app(), &uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
    let thumb = image::load_from_memory_with_format(&body, ImageFormat::Jpeg).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (60, 40));
}

#[tokio::test]
async fn test_thumbnail_missing_file_is_404() {
    let fx = fixture();
    let (status, _, body) = get(fx.app(), &format!("/photo/{}/thumbnail", fx.ids[2])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(String::from_utf8(body).unwrap(), "Photo not found");

    let (status, _, _) = get(fx.app(), "/photo/9999/thumbnail").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_thumbnail_undecodable_file_is_500() {
    let fx = fixture();
    let (status, _, body) = get(fx.app(), &format!("/photo/{}/thumbnail", fx.ids[1])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body)
        .unwrap()
        .starts_with("Error generating thumbnail"));
}

#[tokio::test]
async fn test_full_image_served_inline() {
    let fx = fixture();
    let response = fx
        .app()
        .oneshot(
            Request::builder()
                .uri(format!("/photo/{}/full?edited=1", fx.ids[0]))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"GOOD.png\""
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(body.len(), std::fs::metadata(fx._dir.path().join("good.png")).unwrap().len() as usize);
}

#[tokio::test]
async fn test_list_and_detail() {
    let fx = fixture();

    let page = get_json(fx.app(), "/api/photos").await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["page_size"], 50);

    let favorites = get_json(fx.app(), "/api/photos?favorites=1&sort=bogus").await;
    assert_eq!(favorites["total"], 1);
    assert_eq!(favorites["items"][0]["uuid"], "GOOD");

    let detail = get_json(fx.app(), &format!("/api/photos/{}", fx.ids[0])).await;
    assert_eq!(detail["uuid"], "GOOD");
    assert_eq!(detail["keywords"][0]["name"], "holiday");
    assert_eq!(detail["persons"][0]["name"], "Ann");

    let (status, _, _) = get(fx.app(), "/api/photos/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bad_filter_value_is_rejected() {
    let fx = fixture();
    let (status, _, _) = get(fx.app(), "/api/photos?album=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_filters_and_stats() {
    let fx = fixture();

    let short = get_json(fx.app(), "/api/search?q=h").await;
    assert_eq!(short["suggestions"], serde_json::json!([]));

    let found = get_json(fx.app(), "/api/search?q=hol").await;
    assert_eq!(
        found["suggestions"],
        serde_json::json!([{"type": "keyword", "value": "holiday"}])
    );

    let filters = get_json(fx.app(), "/api/filters").await;
    assert_eq!(filters["keywords"][0]["photo_count"], 1);

    let stats = get_json(fx.app(), "/api/stats").await;
    assert_eq!(stats["total_photos"], 3);
    assert_eq!(stats["total_favorites"], 1);
    assert_eq!(stats["top_persons"][0]["name"], "Ann");
}
