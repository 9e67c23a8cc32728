//! Color themes and global styling for the chat window.
//!
//! Two palettes share the same roles: a surface pair for the window and the
//! chat panel, bubble fills for our own and other people's messages, and a
//! small set of text colors. `apply_app_style` sets the egui-wide spacing
//! and widget rounding once at startup.

use eframe::egui::{self, Color32, FontFamily, FontId, TextStyle};
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct ChatTheme {
    pub name: String,
    /// Window background, chat panel background, input background
    pub surface: [Color32; 3],
    pub accent: Color32,
    pub bubble_me: Color32,
    pub bubble_other: Color32,
    pub text_on_me: Color32,
    pub text_primary: Color32,
    pub text_muted: Color32,
    pub link: Color32,
    pub error: Color32,
    pub success: Color32,
    pub border: Color32,
}

impl ChatTheme {
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            surface: [
                Color32::from_rgb(10, 10, 15),
                Color32::from_rgb(19, 19, 26),
                Color32::from_rgb(28, 28, 38),
            ],
            accent: Color32::from_rgb(88, 101, 242),
            bubble_me: Color32::from_rgb(88, 101, 242),
            bubble_other: Color32::from_rgb(46, 46, 62),
            text_on_me: Color32::WHITE,
            text_primary: Color32::WHITE,
            text_muted: Color32::from_rgb(114, 118, 125),
            link: Color32::from_rgb(96, 165, 250),
            error: Color32::from_rgb(240, 71, 71),
            success: Color32::from_rgb(67, 181, 129),
            border: Color32::from_rgb(47, 49, 54),
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            surface: [
                Color32::from_rgb(255, 255, 255),
                Color32::from_rgb(246, 246, 247),
                Color32::from_rgb(242, 243, 245),
            ],
            accent: Color32::from_rgb(88, 101, 242),
            bubble_me: Color32::from_rgb(88, 101, 242),
            bubble_other: Color32::from_rgb(227, 229, 232),
            text_on_me: Color32::WHITE,
            text_primary: Color32::from_rgb(6, 6, 7),
            text_muted: Color32::from_rgb(116, 127, 141),
            link: Color32::from_rgb(37, 99, 235),
            error: Color32::from_rgb(240, 71, 71),
            success: Color32::from_rgb(67, 181, 129),
            border: Color32::from_rgb(210, 213, 219),
        }
    }

    /// Pick a palette by settings name, defaulting to dark.
    pub fn by_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }
}

fn text_styles() -> BTreeMap<TextStyle, FontId> {
    use FontFamily::{Monospace, Proportional};

    [
        (TextStyle::Small, FontId::new(10.0, Proportional)),
        (TextStyle::Body, FontId::new(14.0, Proportional)),
        (TextStyle::Button, FontId::new(13.0, Proportional)),
        (TextStyle::Heading, FontId::new(18.0, Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, Monospace)),
    ]
    .into()
}

/// Apply spacing, typography and widget rounding to the egui context.
pub fn apply_app_style(ctx: &egui::Context, theme: &ChatTheme) {
    match theme.name.as_str() {
        "Light" => ctx.set_visuals(egui::Visuals::light()),
        _ => ctx.set_visuals(egui::Visuals::dark()),
    }

    let mut style = (*ctx.style()).clone();
    style.text_styles = text_styles();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);

    for widget in [
        &mut style.visuals.widgets.inactive,
        &mut style.visuals.widgets.hovered,
        &mut style.visuals.widgets.active,
    ] {
        widget.corner_radius = egui::CornerRadius::same(8);
        widget.bg_stroke = egui::Stroke::NONE;
    }
    style.visuals.widgets.active.bg_fill = theme.accent;
    style.visuals.widgets.active.weak_bg_fill = theme.accent;
    style.visuals.selection.bg_fill = theme.accent.linear_multiply(0.4);
    style.visuals.hyperlink_color = theme.link;

    ctx.set_style(style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(ChatTheme::by_name("light").name, "Light");
        assert_eq!(ChatTheme::by_name("dark").name, "Dark");
        assert_eq!(ChatTheme::by_name("").name, "Dark");
    }

    #[test]
    fn test_dark_link_color() {
        // #60a5fa
        assert_eq!(ChatTheme::dark().link, Color32::from_rgb(0x60, 0xa5, 0xfa));
    }
}
