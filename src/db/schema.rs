pub const SCHEMA: &str = r#"
-- Photos table: one row per source item, keyed by the library uuid
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid TEXT NOT NULL UNIQUE,
    original_filename TEXT NOT NULL DEFAULT '',
    filename TEXT NOT NULL DEFAULT '',
    path TEXT NOT NULL DEFAULT '',
    path_edited TEXT NOT NULL DEFAULT '',

    -- Type flags
    is_photo INTEGER NOT NULL DEFAULT 1,
    is_movie INTEGER NOT NULL DEFAULT 0,
    is_cloud_photo INTEGER NOT NULL DEFAULT 0,
    has_adjustments INTEGER NOT NULL DEFAULT 0,
    is_missing INTEGER NOT NULL DEFAULT 0,

    -- Dates, stored as UTC
    date TEXT,
    date_modified TEXT,
    date_added TEXT,
    exif_datetime TEXT,

    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',

    -- Location
    latitude REAL,
    longitude REAL,
    place_name TEXT NOT NULL DEFAULT '',
    place_country_code TEXT NOT NULL DEFAULT '',
    place_address TEXT NOT NULL DEFAULT '',
    place_is_home INTEGER NOT NULL DEFAULT 0,

    -- Capture technique
    uti TEXT NOT NULL DEFAULT '',
    live_photo INTEGER NOT NULL DEFAULT 0,
    live_photo_video_uuid TEXT NOT NULL DEFAULT '',
    live_photo_video_path TEXT NOT NULL DEFAULT '',
    is_burst INTEGER NOT NULL DEFAULT 0,
    burst_uuid TEXT NOT NULL DEFAULT '',
    is_hdr INTEGER NOT NULL DEFAULT 0,
    is_portrait INTEGER NOT NULL DEFAULT 0,
    is_screenshot INTEGER NOT NULL DEFAULT 0,
    is_slow_mo INTEGER NOT NULL DEFAULT 0,
    is_selfie INTEGER NOT NULL DEFAULT 0,
    is_panorama INTEGER NOT NULL DEFAULT 0,
    has_raw INTEGER NOT NULL DEFAULT 0,
    raw_path TEXT NOT NULL DEFAULT '',

    -- Image properties
    orientation INTEGER,
    height INTEGER,
    width INTEGER,
    duration REAL,

    -- EXIF data
    camera_make TEXT NOT NULL DEFAULT '',
    camera_model TEXT NOT NULL DEFAULT '',
    fstop REAL,
    aperture REAL,
    iso INTEGER,
    focal_length REAL,
    exposure_time REAL,

    timezone_name TEXT NOT NULL DEFAULT '',
    timezone_offset INTEGER,

    -- Library categorization
    favorite INTEGER NOT NULL DEFAULT 0,
    hidden INTEGER NOT NULL DEFAULT 0,
    in_trash INTEGER NOT NULL DEFAULT 0,
    shared INTEGER NOT NULL DEFAULT 0,

    original_file_size INTEGER,

    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_photos_date ON photos(date);
CREATE INDEX IF NOT EXISTS idx_photos_date_added ON photos(date_added);
CREATE INDEX IF NOT EXISTS idx_photos_favorite ON photos(favorite);
CREATE INDEX IF NOT EXISTS idx_photos_date_favorite ON photos(date, favorite);
CREATE INDEX IF NOT EXISTS idx_photos_camera ON photos(camera_make, camera_model);
CREATE INDEX IF NOT EXISTS idx_photos_location ON photos(latitude, longitude);

-- Albums: the same name may exist once private and once shared
CREATE TABLE IF NOT EXISTS albums (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    is_shared INTEGER NOT NULL DEFAULT 0,
    UNIQUE (name, is_shared)
);

CREATE TABLE IF NOT EXISTS album_photos (
    album_id INTEGER NOT NULL,
    photo_id INTEGER NOT NULL,
    PRIMARY KEY (album_id, photo_id),
    FOREIGN KEY (album_id) REFERENCES albums(id) ON DELETE CASCADE,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_album_photos_photo ON album_photos(photo_id);

-- People: named individuals, optionally carrying the library's person uuid
CREATE TABLE IF NOT EXISTS people (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    uuid TEXT UNIQUE
);

CREATE TABLE IF NOT EXISTS photo_people (
    person_id INTEGER NOT NULL,
    photo_id INTEGER NOT NULL,
    PRIMARY KEY (person_id, photo_id),
    FOREIGN KEY (person_id) REFERENCES people(id) ON DELETE CASCADE,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_photo_people_photo ON photo_people(photo_id);

-- Keywords: user-assigned tags
CREATE TABLE IF NOT EXISTS keywords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS photo_keywords (
    keyword_id INTEGER NOT NULL,
    photo_id INTEGER NOT NULL,
    PRIMARY KEY (keyword_id, photo_id),
    FOREIGN KEY (keyword_id) REFERENCES keywords(id) ON DELETE CASCADE,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_photo_keywords_photo ON photo_keywords(photo_id);

-- Labels: machine-learning classifications
CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS photo_labels (
    label_id INTEGER NOT NULL,
    photo_id INTEGER NOT NULL,
    PRIMARY KEY (label_id, photo_id),
    FOREIGN KEY (label_id) REFERENCES labels(id) ON DELETE CASCADE,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_photo_labels_photo ON photo_labels(photo_id);

-- Quality scores: one row per photo, replaced wholesale on sync
CREATE TABLE IF NOT EXISTS photo_scores (
    photo_id INTEGER PRIMARY KEY,
    overall REAL,
    aesthetics REAL,
    curation REAL,
    noise REAL,
    pleasant_camera_tilt REAL,
    pleasant_composition REAL,
    pleasant_lighting REAL,
    pleasant_pattern REAL,
    pleasant_subject_movement REAL,
    pleasant_symmetry REAL,
    pleasant_texture REAL,
    pleasant_tone REAL,
    utility_activity REAL,
    utility_blurry REAL,
    utility_colorful REAL,
    utility_interesting_subject REAL,
    utility_low_light REAL,
    utility_not_on_tripod REAL,
    utility_people REAL,
    utility_pet REAL,
    utility_poor_contrast REAL,
    utility_quality REAL,
    utility_sharply_focused REAL,
    utility_still_action REAL,
    utility_uninteresting_subject REAL,
    utility_vibrance REAL,
    curation_blurry REAL,
    curation_noise REAL,
    curation_interesting_subject REAL,
    curation_scene REAL,
    curation_light REAL,
    curation_activity REAL,
    curation_animated REAL,
    curation_face REAL,
    curation_landscape REAL,
    curation_time REAL,
    curation_version REAL,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

-- Faces: normalized boxes (0-1), replaced wholesale on sync
CREATE TABLE IF NOT EXISTS faces (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    photo_id INTEGER NOT NULL,
    person_id INTEGER,          -- NULL for unidentified faces
    center_x REAL NOT NULL CHECK (center_x BETWEEN 0 AND 1),
    center_y REAL NOT NULL CHECK (center_y BETWEEN 0 AND 1),
    width REAL NOT NULL CHECK (width BETWEEN 0 AND 1),
    height REAL NOT NULL CHECK (height BETWEEN 0 AND 1),
    age INTEGER,
    gender TEXT NOT NULL DEFAULT '',
    ethnicity TEXT NOT NULL DEFAULT '',
    quality REAL,
    is_hidden INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
    FOREIGN KEY (person_id) REFERENCES people(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_faces_photo ON faces(photo_id);
CREATE INDEX IF NOT EXISTS idx_faces_person ON faces(person_id);
"#;

