use image::codecs::jpeg::JpegEncoder;
use image::ImageResult;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ThumbnailConfig;

/// Renders JPEG thumbnails, optionally caching them on disk.
#[derive(Debug, Clone)]
pub struct ThumbnailRenderer {
    cache_dir: Option<PathBuf>,
    default_size: u32,
    max_size: u32,
    quality: u8,
}

impl ThumbnailRenderer {
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            default_size: config.default_size,
            max_size: config.max_size,
            quality: config.quality.clamp(1, 100),
        }
    }

    /// The edge length to render for a requested size.
    pub fn size_for(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_size)
            .clamp(1, self.max_size.max(1))
    }

    /// Cache file for an original at a given size. The key covers the
    /// original's length and mtime so edits invalidate it.
    fn cache_path(&self, original: &Path, size: u32) -> Option<PathBuf> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let cache_dir = self.cache_dir.as_ref()?;
        let meta = fs::metadata(original).ok()?;

        let mut hasher = DefaultHasher::new();
        original.to_string_lossy().hash(&mut hasher);
        meta.len().hash(&mut hasher);
        meta.modified().ok().hash(&mut hasher);
        self.quality.hash(&mut hasher);
        let hash = hasher.finish();

        Some(cache_dir.join(format!("{:016x}_{}.jpg", hash, size)))
    }

    /// Render `original` to fit inside `size`×`size`, keeping the aspect ratio.
    pub fn render(&self, original: &Path, size: u32) -> ImageResult<Vec<u8>> {
        let cache_path = self.cache_path(original, size);
        if let Some(cached) = cache_path.as_ref().and_then(|p| fs::read(p).ok()) {
            return Ok(cached);
        }

        let img = image::open(original)?;
        let thumbnail = img.thumbnail(size, size).to_rgb8();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode_image(&thumbnail)?;

        if let Some(path) = cache_path {
            if let Err(e) = write_cache(&path, &bytes) {
                tracing::warn!(path = %path.display(), error = %e, "Failed to cache thumbnail");
            }
        }

        Ok(bytes)
    }
}

fn write_cache(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, bytes)
}

/// MIME type for serving an original file.
pub fn content_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn config(cache_dir: Option<PathBuf>) -> ThumbnailConfig {
        ThumbnailConfig {
            cache_dir,
            ..ThumbnailConfig::default()
        }
    }

    fn write_png(dir: &Path, w: u32, h: u32) -> PathBuf {
        let path = dir.join("photo.png");
        RgbImage::from_pixel(w, h, image::Rgb([200, 40, 40]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_size_for() {
        let renderer = ThumbnailRenderer::new(&config(None));
        assert_eq!(renderer.size_for(None), 300);
        assert_eq!(renderer.size_for(Some(64)), 64);
        assert_eq!(renderer.size_for(Some(100_000)), 2048);
        assert_eq!(renderer.size_for(Some(0)), 1);
    }

    #[test]
    fn test_render_fits_box() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_png(dir.path(), 400, 200);
        let renderer = ThumbnailRenderer::new(&config(None));

        let bytes = renderer.render(&original, 100).unwrap();
        let thumb = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (100, 50));
    }

    #[test]
    fn test_render_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        let original = write_png(dir.path(), 50, 50);
        let renderer = ThumbnailRenderer::new(&config(Some(cache.clone())));

        let first = renderer.render(&original, 32).unwrap();
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 1);
        let second = renderer.render(&original, 32).unwrap();
        assert_eq!(first, second);

        renderer.render(&original, 16).unwrap();
        assert_eq!(fs::read_dir(&cache).unwrap().count(), 2);
    }

    #[test]
    fn test_render_not_an_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"not a jpeg").unwrap();
        let renderer = ThumbnailRenderer::new(&config(None));
        assert!(renderer.render(&path, 100).is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type(Path::new("b.png")), "image/png");
        assert_eq!(content_type(Path::new("c.unknownext")), "application/octet-stream");
    }
}
