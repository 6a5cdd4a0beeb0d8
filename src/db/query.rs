//! Read-side queries used by the browsing server and the CLI: filtered and
//! paginated photo listings, photo detail, filter facets, library statistics
//! and search suggestions.

use anyhow::Result;
use chrono::{DateTime, Days, NaiveDate, Utc};
use rusqlite::ToSql;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::{Album, Face, Photo, PhotoScore, Store, Tag, TagKind};

// ============================================================================
// Listing
// ============================================================================

/// Filters accepted by the photo listing. Flags are set by any non-empty
/// value other than `0` or `false`; empty values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PhotoQuery {
    #[serde(deserialize_with = "empty_as_none")]
    pub search: Option<String>,

    #[serde(deserialize_with = "truthy")]
    pub favorites: bool,
    #[serde(deserialize_with = "truthy")]
    pub videos: bool,
    #[serde(deserialize_with = "truthy")]
    pub photos: bool,
    #[serde(deserialize_with = "truthy")]
    pub screenshots: bool,
    #[serde(deserialize_with = "truthy")]
    pub selfies: bool,
    #[serde(deserialize_with = "truthy")]
    pub portraits: bool,
    #[serde(deserialize_with = "truthy")]
    pub panoramas: bool,
    #[serde(deserialize_with = "truthy")]
    pub live_photos: bool,
    #[serde(deserialize_with = "truthy")]
    pub bursts: bool,
    #[serde(deserialize_with = "truthy")]
    pub hdr: bool,
    #[serde(deserialize_with = "truthy")]
    pub has_location: bool,

    #[serde(deserialize_with = "empty_as_none")]
    pub album: Option<i64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub person: Option<i64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub keyword: Option<i64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub label: Option<i64>,

    #[serde(deserialize_with = "empty_as_none")]
    pub camera_make: Option<String>,
    #[serde(deserialize_with = "empty_as_none")]
    pub camera_model: Option<String>,

    /// First day included, as `YYYY-MM-DD`.
    #[serde(deserialize_with = "empty_as_none")]
    pub date_from: Option<NaiveDate>,
    /// Last day included, as `YYYY-MM-DD`.
    #[serde(deserialize_with = "empty_as_none")]
    pub date_to: Option<NaiveDate>,

    #[serde(deserialize_with = "empty_as_none")]
    pub sort: Option<String>,
    /// 1-based.
    #[serde(deserialize_with = "empty_as_none")]
    pub page: Option<usize>,
}

pub(crate) fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let raw = raw.trim();
    Ok(!(raw.is_empty() || raw == "0" || raw.eq_ignore_ascii_case("false")))
}

pub(crate) fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Orderings the listing accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    DateAsc,
    #[default]
    DateDesc,
    TitleAsc,
    TitleDesc,
    FilenameAsc,
    FilenameDesc,
    ScoreDesc,
    CreatedAsc,
    CreatedDesc,
}

impl SortKey {
    /// Parse a sort parameter; anything unrecognized sorts newest first.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "date" => SortKey::DateAsc,
            "-date" => SortKey::DateDesc,
            "title" => SortKey::TitleAsc,
            "-title" => SortKey::TitleDesc,
            "filename" => SortKey::FilenameAsc,
            "-filename" => SortKey::FilenameDesc,
            "-score__overall" => SortKey::ScoreDesc,
            "created_at" => SortKey::CreatedAsc,
            "-created_at" => SortKey::CreatedDesc,
            _ => SortKey::DateDesc,
        }
    }

    fn order_by(self) -> &'static str {
        match self {
            SortKey::DateAsc => "p.date ASC, p.id ASC",
            SortKey::DateDesc => "p.date DESC, p.id DESC",
            SortKey::TitleAsc => "p.title ASC, p.id ASC",
            SortKey::TitleDesc => "p.title DESC, p.id DESC",
            SortKey::FilenameAsc => "p.filename ASC, p.id ASC",
            SortKey::FilenameDesc => "p.filename DESC, p.id DESC",
            SortKey::ScoreDesc => "s.overall DESC, p.id DESC",
            SortKey::CreatedAsc => "p.created_at ASC, p.id ASC",
            SortKey::CreatedDesc => "p.created_at DESC, p.id DESC",
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub num_pages: usize,
}

/// `%needle%` for LIKE, with wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// WHERE clause plus its positional parameters.
#[derive(Default)]
struct Filter {
    conditions: Vec<String>,
    params: Vec<Box<dyn ToSql>>,
}

impl Filter {
    fn push(&mut self, condition: impl Into<String>) {
        self.conditions.push(condition.into());
    }

    fn push_with(&mut self, condition: impl Into<String>, value: impl ToSql + 'static) {
        self.conditions.push(condition.into());
        self.params.push(Box::new(value));
    }

    fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn build(query: &PhotoQuery) -> Self {
        let mut filter = Filter::default();

        if let Some(search) = &query.search {
            let pattern = like_pattern(search);
            let mut alternatives = vec![
                "p.title LIKE ? ESCAPE '\\'".to_string(),
                "p.description LIKE ? ESCAPE '\\'".to_string(),
                "p.filename LIKE ? ESCAPE '\\'".to_string(),
            ];
            for kind in [TagKind::Keyword, TagKind::Label, TagKind::Person] {
                alternatives.push(format!(
                    "EXISTS (SELECT 1 FROM {join} j JOIN {table} t ON t.id = j.{key} \
                     WHERE j.photo_id = p.id AND t.name LIKE ? ESCAPE '\\')",
                    join = kind.join_table(),
                    table = kind.table(),
                    key = kind.key_column(),
                ));
            }
            alternatives.push(
                "EXISTS (SELECT 1 FROM album_photos ap JOIN albums a ON a.id = ap.album_id \
                 WHERE ap.photo_id = p.id AND a.name LIKE ? ESCAPE '\\')"
                    .to_string(),
            );

            for _ in &alternatives {
                filter.params.push(Box::new(pattern.clone()));
            }
            filter.push(format!("({})", alternatives.join(" OR ")));
        }

        if query.favorites {
            filter.push("p.favorite = 1");
        }
        if query.videos {
            filter.push("p.is_movie = 1");
        } else if query.photos {
            filter.push("p.is_photo = 1");
        }

        let flags = [
            (query.screenshots, "p.is_screenshot = 1"),
            (query.selfies, "p.is_selfie = 1"),
            (query.portraits, "p.is_portrait = 1"),
            (query.panoramas, "p.is_panorama = 1"),
            (query.live_photos, "p.live_photo = 1"),
            (query.bursts, "p.is_burst = 1"),
            (query.hdr, "p.is_hdr = 1"),
        ];
        for (enabled, condition) in flags {
            if enabled {
                filter.push(condition);
            }
        }

        if let Some(album) = query.album {
            filter.push_with(
                "EXISTS (SELECT 1 FROM album_photos ap WHERE ap.photo_id = p.id AND ap.album_id = ?)",
                album,
            );
        }
        let memberships = [
            (TagKind::Person, query.person),
            (TagKind::Keyword, query.keyword),
            (TagKind::Label, query.label),
        ];
        for (kind, id) in memberships {
            if let Some(id) = id {
                filter.push_with(
                    format!(
                        "EXISTS (SELECT 1 FROM {join} j WHERE j.photo_id = p.id AND j.{key} = ?)",
                        join = kind.join_table(),
                        key = kind.key_column(),
                    ),
                    id,
                );
            }
        }

        if let Some(make) = &query.camera_make {
            filter.push_with("p.camera_make = ?", make.clone());
        }
        if let Some(model) = &query.camera_model {
            filter.push_with("p.camera_model = ?", model.clone());
        }

        if let Some(from) = query.date_from {
            filter.push_with("p.date >= ?", day_start(from));
        }
        if let Some(to) = query.date_to {
            // The whole last day is included
            match to.checked_add_days(Days::new(1)) {
                Some(next) => filter.push_with("p.date < ?", day_start(next)),
                None => filter.push("p.date IS NOT NULL"),
            }
        }

        if query.has_location {
            filter.push("(p.latitude IS NOT NULL OR p.longitude IS NOT NULL)");
        }

        filter
    }
}

impl Store<'_> {
    /// Filtered, sorted, paginated photo listing.
    pub fn list_photos(&self, query: &PhotoQuery, page_size: usize) -> Result<Page<Photo>> {
        let page_size = page_size.max(1);
        let page = query.page.unwrap_or(1).max(1);
        let sort = query.sort.as_deref().map(SortKey::parse).unwrap_or_default();

        let filter = Filter::build(query);
        let where_sql = filter.sql();

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM photos p {where_sql}"),
            rusqlite::params_from_iter(filter.params.iter()),
            |row| row.get(0),
        )?;

        let total = total as usize;
        let num_pages = total.div_ceil(page_size);

        // Pages past the end are empty; below that the offset stays within total
        let items = if page > num_pages.max(1) {
            Vec::new()
        } else {
            let sql = format!(
                "SELECT {columns} FROM photos p \
                 LEFT JOIN photo_scores s ON s.photo_id = p.id \
                 {where_sql} ORDER BY {order} LIMIT {limit} OFFSET {offset}",
                columns = Photo::select_sql("p"),
                order = sort.order_by(),
                limit = page_size,
                offset = (page - 1) * page_size,
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(filter.params.iter()), Photo::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        Ok(Page {
            items,
            total,
            page,
            page_size,
            num_pages,
        })
    }

    // ========================================================================
    // Detail
    // ========================================================================

    pub fn photo_detail(&self, id: i64) -> Result<Option<PhotoDetail>> {
        let Some(photo) = self.get_photo(id)? else {
            return Ok(None);
        };

        Ok(Some(PhotoDetail {
            albums: self.albums_for_photo(id)?,
            persons: self.tags_for_photo(TagKind::Person, id)?,
            keywords: self.tags_for_photo(TagKind::Keyword, id)?,
            labels: self.tags_for_photo(TagKind::Label, id)?,
            faces: self.faces_for_photo(id)?,
            score: self.get_score(id)?,
            photo,
        }))
    }

    // ========================================================================
    // Facets
    // ========================================================================

    pub fn filter_options(&self) -> Result<FilterOptions> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.name, a.is_shared, COUNT(ap.photo_id)
            FROM albums a
            LEFT JOIN album_photos ap ON ap.album_id = a.id
            GROUP BY a.id
            ORDER BY a.name, a.is_shared
            "#,
        )?;
        let albums = stmt
            .query_map([], |row| {
                Ok(AlbumCount {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    is_shared: row.get(2)?,
                    photo_count: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(FilterOptions {
            albums,
            persons: self.tag_counts(TagKind::Person, "t.name ASC", None)?,
            keywords: self.tag_counts(TagKind::Keyword, "t.name ASC", None)?,
            labels: self.tag_counts(TagKind::Label, "t.name ASC", None)?,
            camera_makes: self.distinct_values("camera_make")?,
            camera_models: self.distinct_values("camera_model")?,
        })
    }

    fn tag_counts(&self, kind: TagKind, order: &str, limit: Option<usize>) -> Result<Vec<TagCount>> {
        let limit = limit.map(|n| format!("LIMIT {n}")).unwrap_or_default();
        let sql = format!(
            "SELECT t.id, t.name, COUNT(j.photo_id) AS photo_count \
             FROM {table} t LEFT JOIN {join} j ON j.{key} = t.id \
             GROUP BY t.id ORDER BY {order} {limit}",
            table = kind.table(),
            join = kind.join_table(),
            key = kind.key_column(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let counts = stmt
            .query_map([], |row| {
                Ok(TagCount {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    photo_count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(counts)
    }

    fn distinct_values(&self, column: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM photos WHERE {column} != '' ORDER BY {column}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    fn count(&self, sql: &str) -> Result<i64> {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    pub fn library_stats(&self) -> Result<LibraryStats> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT camera_make, camera_model, COUNT(*) AS n
            FROM photos
            WHERE camera_model != ''
            GROUP BY camera_make, camera_model
            ORDER BY n DESC, camera_make, camera_model
            LIMIT 10
            "#,
        )?;
        let top_cameras = stmt
            .query_map([], |row| {
                Ok(CameraCount {
                    camera_make: row.get(0)?,
                    camera_model: row.get(1)?,
                    count: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(LibraryStats {
            total_photos: self.count("SELECT COUNT(*) FROM photos WHERE is_photo = 1")?,
            total_videos: self.count("SELECT COUNT(*) FROM photos WHERE is_movie = 1")?,
            total_favorites: self.count("SELECT COUNT(*) FROM photos WHERE favorite = 1")?,
            total_persons: self.count("SELECT COUNT(*) FROM people")?,
            total_albums: self.count("SELECT COUNT(*) FROM albums")?,
            total_keywords: self.count("SELECT COUNT(*) FROM keywords")?,
            total_labels: self.count("SELECT COUNT(*) FROM labels")?,
            photos_with_location: self.count(
                "SELECT COUNT(*) FROM photos WHERE latitude IS NOT NULL OR longitude IS NOT NULL",
            )?,
            photos_with_faces: self.count("SELECT COUNT(DISTINCT photo_id) FROM faces")?,
            top_cameras,
            top_persons: self.tag_counts(TagKind::Person, "photo_count DESC, t.name ASC", Some(10))?,
            top_keywords: self.tag_counts(TagKind::Keyword, "photo_count DESC, t.name ASC", Some(10))?,
        })
    }

    // ========================================================================
    // Suggestions
    // ========================================================================

    /// Up to five name matches per category. Queries shorter than two
    /// characters match nothing.
    pub fn autocomplete(&self, query: &str) -> Result<Vec<Suggestion>> {
        if query.chars().count() < 2 {
            return Ok(Vec::new());
        }

        let pattern = like_pattern(query);
        let sources = [
            (SuggestionKind::Keyword, "keywords"),
            (SuggestionKind::Person, "people"),
            (SuggestionKind::Album, "albums"),
            (SuggestionKind::Label, "labels"),
        ];

        let mut suggestions = Vec::new();
        for (kind, table) in sources {
            let sql = format!(
                "SELECT name FROM {table} WHERE name LIKE ? ESCAPE '\\' ORDER BY name LIMIT 5"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let names = stmt
                .query_map([&pattern], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            suggestions.extend(names.into_iter().map(|value| Suggestion { kind, value }));
        }

        Ok(suggestions)
    }
}

// ============================================================================
// Result types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PhotoDetail {
    #[serde(flatten)]
    pub photo: Photo,
    pub albums: Vec<Album>,
    pub persons: Vec<Tag>,
    pub keywords: Vec<Tag>,
    pub labels: Vec<Tag>,
    pub faces: Vec<Face>,
    pub score: Option<PhotoScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumCount {
    pub id: i64,
    pub name: String,
    pub is_shared: bool,
    pub photo_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub id: i64,
    pub name: String,
    pub photo_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterOptions {
    pub albums: Vec<AlbumCount>,
    pub persons: Vec<TagCount>,
    pub keywords: Vec<TagCount>,
    pub labels: Vec<TagCount>,
    pub camera_makes: Vec<String>,
    pub camera_models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraCount {
    pub camera_make: String,
    pub camera_model: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibraryStats {
    pub total_photos: i64,
    pub total_videos: i64,
    pub total_favorites: i64,
    pub total_persons: i64,
    pub total_albums: i64,
    pub total_keywords: i64,
    pub total_labels: i64,
    pub photos_with_location: i64,
    pub photos_with_faces: i64,
    pub top_cameras: Vec<CameraCount>,
    pub top_persons: Vec<TagCount>,
    pub top_keywords: Vec<TagCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Keyword,
    Person,
    Album,
    Label,
}

impl SuggestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SuggestionKind::Keyword => "keyword",
            SuggestionKind::Person => "person",
            SuggestionKind::Album => "album",
            SuggestionKind::Label => "label",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub value: String,
}
