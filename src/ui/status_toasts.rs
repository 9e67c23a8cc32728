//! Floating status toasts in the top-right corner.

use std::time::Instant;

use eframe::egui;

use super::theme::ChatTheme;

/// Render request failures and feed notices, newest last.
pub fn render_status_toasts(
    ctx: &egui::Context,
    status_messages: &[(String, Instant)],
    theme: &ChatTheme,
) {
    if status_messages.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("status_toast_area"))
        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 50.0]) // Below the header
        .show(ctx, |ui| {
            egui::Frame::new()
                .fill(egui::Color32::from_rgba_unmultiplied(30, 30, 30, 230))
                .corner_radius(6.0)
                .inner_margin(egui::Margin::symmetric(12, 8))
                .show(ui, |ui| {
                    for (msg, _) in status_messages {
                        ui.label(egui::RichText::new(msg).color(theme.error));
                    }
                });
        });
}
