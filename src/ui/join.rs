//! Join screen: pick a display name before entering the room.

use eframe::egui::{self, RichText};

use crate::input_state::InputState;

use super::theme::ChatTheme;

const JOIN_CARD_WIDTH: f32 = 320.0;

/// Render the centered join card. Returns true when the user submits a
/// non-blank name (button or Enter).
pub fn render_join_screen(ctx: &egui::Context, input: &mut InputState, theme: &ChatTheme) -> bool {
    let mut submitted = false;
    let can_join = input.can_join();

    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(theme.surface[0]))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                let top_gap = (ui.available_height() * 0.3).max(24.0);
                ui.add_space(top_gap);

                egui::Frame::new()
                    .fill(theme.surface[1])
                    .stroke(egui::Stroke::new(1.0, theme.border))
                    .corner_radius(12.0)
                    .inner_margin(egui::Margin::same(24))
                    .show(ui, |ui| {
                        ui.set_width(JOIN_CARD_WIDTH);
                        ui.vertical_centered(|ui| {
                            ui.label(
                                RichText::new("Join Oomfie Chat")
                                    .size(22.0)
                                    .strong()
                                    .color(theme.text_primary),
                            );
                            ui.add_space(16.0);

                            let response = ui.add(
                                egui::TextEdit::singleline(&mut input.draft_name)
                                    .hint_text("Enter your name...")
                                    .desired_width(JOIN_CARD_WIDTH),
                            );
                            let enter = response.lost_focus()
                                && ui.input(|i| i.key_pressed(egui::Key::Enter));
                            ui.add_space(12.0);

                            let button = egui::Button::new(
                                RichText::new("Join Chat").color(egui::Color32::WHITE),
                            )
                            .fill(theme.accent)
                            .min_size(egui::vec2(JOIN_CARD_WIDTH, 32.0));

                            if ui.add_enabled(can_join, button).clicked() || (enter && can_join) {
                                submitted = true;
                            }
                        });
                    });
            });
        });

    submitted
}
