//! Message rendering for the central chat panel.

mod bubble;
mod format;
mod previews;
mod render;

pub use bubble::{bubble_view, BubbleBody, BubbleView, DELETED_PLACEHOLDER};
pub use format::{is_image_url, parse_segments, Segment};
pub use previews::{ImagePreview, PreviewCache};
pub use render::{render_messages, BubbleAction};
