//! Decoding of inline image previews.
//!
//! Runs on the backend thread. The UI only turns the finished
//! [`ColorImage`] into a texture.

use eframe::egui::ColorImage;
use image::GenericImageView;

use crate::error::{ChatError, Result};

/// Widest preview we ever display
pub const PREVIEW_MAX_WIDTH: u32 = 220;

/// Downloads above this size are refused before decoding
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

/// Decode `bytes` (first frame for GIFs) and shrink it to at most
/// `max_width` pixels wide, keeping the aspect ratio.
pub fn decode_preview(bytes: &[u8], max_width: u32) -> Result<ColorImage> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ChatError::ImageTooLarge(bytes.len()));
    }

    let decoded = image::load_from_memory(bytes)?;
    let (orig_w, orig_h) = decoded.dimensions();
    let resized = if orig_w > max_width {
        let scale = max_width as f32 / orig_w as f32;
        decoded.resize(
            max_width,
            ((orig_h as f32 * scale).round() as u32).max(1),
            image::imageops::FilterType::Triangle,
        )
    } else {
        decoded
    };

    let rgba = resized.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}
