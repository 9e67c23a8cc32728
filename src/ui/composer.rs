//! Bottom composer row.

use eframe::egui::{self, RichText};

use crate::input_state::InputState;

use super::theme::ChatTheme;

/// Render the message input and Send button. Returns true when the user
/// submits (button or Enter). The row is disabled while `sending`.
pub fn render_composer(
    ctx: &egui::Context,
    input: &mut InputState,
    placeholder: &str,
    sending: bool,
    theme: &ChatTheme,
) -> bool {
    let mut submitted = false;

    egui::TopBottomPanel::bottom("composer")
        .frame(
            egui::Frame::new()
                .fill(theme.surface[1])
                .inner_margin(egui::Margin::symmetric(12, 10)),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let can_send = input.can_send(sending);
                let button_width = 72.0;
                let field_width = ui.available_width() - button_width - 8.0;

                let response = ui.add_enabled(
                    !sending,
                    egui::TextEdit::singleline(&mut input.message_input)
                        .hint_text(placeholder)
                        .desired_width(field_width),
                );
                let enter =
                    response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

                let label = if sending { "Sending..." } else { "Send" };
                let button = egui::Button::new(RichText::new(label).color(egui::Color32::WHITE))
                    .fill(theme.accent)
                    .min_size(egui::vec2(button_width, 0.0));

                if ui.add_enabled(can_send, button).clicked() || (enter && can_send) {
                    submitted = true;
                    // Keep typing without re-clicking the field
                    response.request_focus();
                }
            });
        });

    submitted
}
