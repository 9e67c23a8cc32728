//! Texture cache for inline image previews, keyed by URL.

use std::collections::HashMap;

use eframe::egui;

#[derive(Clone)]
pub enum ImagePreview {
    /// Requested from the backend, not back yet
    Loading,
    Ready {
        texture: egui::TextureHandle,
        size: egui::Vec2,
    },
    /// Fetch or decode failed; shown as a plain link
    Failed,
}

#[derive(Default)]
pub struct PreviewCache {
    entries: HashMap<String, ImagePreview>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&ImagePreview> {
        self.entries.get(url)
    }

    /// Mark `url` as loading. Returns true the first time only, when the
    /// caller should ask the backend for it.
    pub fn request(&mut self, url: &str) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_string(), ImagePreview::Loading);
        true
    }

    /// Upload a finished preview, or remember that it failed.
    pub fn insert(&mut self, ctx: &egui::Context, url: String, image: Option<egui::ColorImage>) {
        let preview = match image {
            Some(image) => {
                let size = egui::vec2(image.size[0] as f32, image.size[1] as f32);
                let texture = ctx.load_texture(
                    format!("preview:{}", url),
                    image,
                    egui::TextureOptions::LINEAR,
                );
                ImagePreview::Ready { texture, size }
            }
            None => ImagePreview::Failed,
        };
        self.entries.insert(url, preview);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_only_once() {
        let mut cache = PreviewCache::new();
        assert!(cache.request("https://x.com/a.png"));
        assert!(!cache.request("https://x.com/a.png"));
        assert!(matches!(cache.get("https://x.com/a.png"), Some(ImagePreview::Loading)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_ready_and_failed() {
        let ctx = egui::Context::default();
        let mut cache = PreviewCache::new();
        cache.request("https://x.com/a.png");

        let image = egui::ColorImage::new([4, 2], egui::Color32::WHITE);
        cache.insert(&ctx, "https://x.com/a.png".into(), Some(image));
        match cache.get("https://x.com/a.png") {
            Some(ImagePreview::Ready { size, .. }) => assert_eq!(*size, egui::vec2(4.0, 2.0)),
            _ => panic!("expected a ready preview"),
        }

        cache.insert(&ctx, "https://x.com/b.gif".into(), None);
        assert!(matches!(cache.get("https://x.com/b.gif"), Some(ImagePreview::Failed)));
        // A failed URL is never requested again
        assert!(!cache.request("https://x.com/b.gif"));
    }
}
