//! Decoded symbol images, keyed by image path.

use crate::renderer::{RenderResult, RendererError};
use std::collections::HashMap;
use std::sync::Arc;

/// State of one image path.
#[derive(Debug, Clone)]
pub enum ImageEntry {
    /// Decoded and ready to draw.
    Ready(peniko::ImageData),
    /// Could not be fetched or decoded; drawn as a placeholder.
    Failed,
}

/// Decodes image bytes once per path and hands out `peniko::ImageData`.
///
/// Cloning is cheap: pixel buffers are shared.
#[derive(Debug, Clone, Default)]
pub struct ImageCache {
    entries: HashMap<String, ImageEntry>,
}

/// Decode PNG/JPEG/WebP bytes into RGBA image data.
pub fn decode_image(bytes: &[u8]) -> RenderResult<peniko::ImageData> {
    let decoded =
        ::image::load_from_memory(bytes).map_err(|e| RendererError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let blob = peniko::Blob::new(Arc::new(rgba.into_vec()));
    Ok(peniko::ImageData {
        data: blob,
        format: peniko::ImageFormat::Rgba8,
        width,
        height,
        alpha_type: peniko::ImageAlphaType::Alpha,
    })
}

impl ImageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and store the bytes for `path`. A decode failure marks the
    /// path as failed.
    pub fn insert_bytes(&mut self, path: &str, bytes: &[u8]) -> RenderResult<()> {
        match decode_image(bytes) {
            Ok(data) => {
                log::debug!("Decoded {} ({}x{})", path, data.width, data.height);
                self.entries.insert(path.to_string(), ImageEntry::Ready(data));
                Ok(())
            }
            Err(e) => {
                log::warn!("Failed to decode {}: {}", path, e);
                self.entries.insert(path.to_string(), ImageEntry::Failed);
                Err(e)
            }
        }
    }

    /// Remember that `path` could not be loaded.
    pub fn mark_failed(&mut self, path: &str) {
        self.entries.insert(path.to_string(), ImageEntry::Failed);
    }

    /// The decoded image for `path`.
    pub fn get(&self, path: &str) -> Option<&peniko::ImageData> {
        match self.entries.get(path) {
            Some(ImageEntry::Ready(data)) => Some(data),
            _ => None,
        }
    }

    /// Check whether `path` has been attempted, successfully or not.
    pub fn is_settled(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Check whether `path` failed to load.
    pub fn is_failed(&self, path: &str) -> bool {
        matches!(self.entries.get(path), Some(ImageEntry::Failed))
    }

    /// Paths from `paths` that have not been attempted yet.
    pub fn missing<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for path in paths {
            if !self.is_settled(path) && !missing.iter().any(|p| p == path) {
                missing.push(path.to_string());
            }
        }
        missing
    }

    /// Number of decoded images.
    pub fn ready_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, ImageEntry::Ready(_)))
            .count()
    }

    /// Take over every settled entry from another cache.
    pub fn merge(&mut self, other: &ImageCache) {
        for (path, entry) in &other.entries {
            self.entries.insert(path.clone(), entry.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba([255, 0, 0, 255]));
        let mut bytes = Vec::new();
        ::image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ::image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png() {
        let data = decode_image(&png_bytes(3, 2)).unwrap();
        assert_eq!((data.width, data.height), (3, 2));
        assert_eq!(data.data.data().len(), 3 * 2 * 4);
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = ImageCache::new();
        cache.insert_bytes("/assets/bath.png", &png_bytes(4, 4)).unwrap();

        assert!(cache.get("/assets/bath.png").is_some());
        assert!(cache.is_settled("/assets/bath.png"));
        assert_eq!(cache.ready_count(), 1);
        assert!(cache.get("/assets/car.png").is_none());
    }

    #[test]
    fn test_bad_bytes_mark_failed() {
        let mut cache = ImageCache::new();
        let result = cache.insert_bytes("/assets/bath.png", b"not an image");

        assert!(matches!(result, Err(RendererError::Decode(_))));
        assert!(cache.is_failed("/assets/bath.png"));
        assert!(cache.get("/assets/bath.png").is_none());
    }

    #[test]
    fn test_missing() {
        let mut cache = ImageCache::new();
        cache.insert_bytes("/assets/bath.png", &png_bytes(1, 1)).unwrap();
        cache.mark_failed("/assets/car.png");

        let missing = cache.missing([
            "/assets/bath.png",
            "/assets/car.png",
            "/assets/toilet.png",
            "/assets/toilet.png",
        ]);
        assert_eq!(missing, vec!["/assets/toilet.png"]);
    }

    #[test]
    fn test_merge() {
        let mut a = ImageCache::new();
        let mut b = ImageCache::new();
        b.insert_bytes("/assets/bath.png", &png_bytes(1, 1)).unwrap();
        b.mark_failed("/assets/car.png");

        a.merge(&b);
        assert_eq!(a.ready_count(), 1);
        assert!(a.is_failed("/assets/car.png"));
    }
}
