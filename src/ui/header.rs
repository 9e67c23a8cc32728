//! Top header: room label, who we are, and live feed state.

use eframe::egui::{self, Color32, RichText, Stroke};

use crate::session::FeedStatus;

use super::theme::ChatTheme;

pub fn render_header(
    ctx: &egui::Context,
    room_label: &str,
    display_name: Option<&str>,
    feed: &FeedStatus,
    theme: &ChatTheme,
) {
    egui::TopBottomPanel::top("header")
        .frame(
            egui::Frame::new()
                .fill(theme.surface[1])
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("# {}", room_label))
                        .size(16.0)
                        .strong()
                        .color(theme.text_primary),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    feed_indicator(ui, feed, theme);
                    ui.add_space(8.0);
                    if let Some(name) = display_name {
                        ui.label(
                            RichText::new(format!("Logged in as {}", name))
                                .small()
                                .color(theme.text_muted),
                        );
                    }
                });
            });
        });
}

fn feed_indicator(ui: &mut egui::Ui, feed: &FeedStatus, theme: &ChatTheme) {
    let (rect, response) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
    let center = rect.center();
    let painter = ui.painter();

    match feed {
        FeedStatus::Live => {
            painter.circle_filled(center, 6.0, theme.success.linear_multiply(0.2));
            painter.circle_filled(center, 4.0, theme.success);
            response.on_hover_text("Live");
        }
        FeedStatus::Connecting => {
            painter.circle_stroke(center, 4.0, Stroke::new(1.5, theme.success));
            response.on_hover_text("Connecting...");
        }
        FeedStatus::Closed(reason) => {
            painter.circle_filled(center, 4.0, theme.error);
            response.on_hover_text(reason.as_deref().unwrap_or("Live updates stopped"));
        }
        FeedStatus::Idle => {
            painter.circle_stroke(center, 4.0, Stroke::new(1.5, Color32::from_rgb(100, 100, 100)));
        }
    }
}
