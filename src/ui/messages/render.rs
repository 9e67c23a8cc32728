//! Message list rendering: bubbles, inline links/images, edit affordances.

use eframe::egui;

use crate::input_state::InputState;
use crate::model::Message;
use crate::ui::theme::ChatTheme;

use super::bubble::{bubble_view, BubbleBody, BubbleView, DELETED_PLACEHOLDER};
use super::format::Segment;
use super::previews::{ImagePreview, PreviewCache};

/// Max width of inline image previews
const IMAGE_MAX_WIDTH: f32 = crate::images::PREVIEW_MAX_WIDTH as f32;
/// Bubbles never take more than this share of the panel
const BUBBLE_WIDTH_RATIO: f32 = 0.7;

/// Something the user clicked inside the list
#[derive(Debug, Clone, PartialEq)]
pub enum BubbleAction {
    BeginEdit(i64),
    SaveEdit,
    CancelEdit,
    Delete(i64),
    /// An image URL scrolled into view for the first time
    LoadImage(String),
}

/// Render the scrollable message list.
///
/// `scroll_to_bottom` jumps to the newest message; pass it whenever the
/// list changed since the last frame.
#[allow(clippy::too_many_arguments)]
pub fn render_messages(
    ui: &mut egui::Ui,
    messages: &[Message],
    display_name: Option<&str>,
    loading: bool,
    input: &mut InputState,
    previews: &mut PreviewCache,
    theme: &ChatTheme,
    scroll_to_bottom: bool,
) -> Vec<BubbleAction> {
    let mut actions = Vec::new();

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            ui.add_space(8.0);

            if loading {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new("Loading...").color(theme.text_muted));
                });
            } else {
                for msg in messages {
                    let view = bubble_view(msg, display_name, input.editing);
                    render_bubble(ui, &view, input, previews, theme, &mut actions);
                    ui.add_space(6.0);
                }
            }

            ui.add_space(8.0);
            if scroll_to_bottom {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    actions
}

fn render_bubble(
    ui: &mut egui::Ui,
    view: &BubbleView<'_>,
    input: &mut InputState,
    previews: &mut PreviewCache,
    theme: &ChatTheme,
    actions: &mut Vec<BubbleAction>,
) {
    let layout = if view.own {
        egui::Layout::right_to_left(egui::Align::TOP)
    } else {
        egui::Layout::left_to_right(egui::Align::TOP)
    };
    let max_width = ui.available_width() * BUBBLE_WIDTH_RATIO;
    let (fill, text_color) = if view.own {
        (theme.bubble_me, theme.text_on_me)
    } else {
        (theme.bubble_other, theme.text_primary)
    };

    ui.with_layout(layout, |ui| {
        ui.add_space(12.0);
        egui::Frame::new()
            .fill(fill)
            .corner_radius(12.0)
            .inner_margin(egui::Margin::symmetric(12, 8))
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.vertical(|ui| {
                    if let Some(sender) = view.sender {
                        ui.label(
                            egui::RichText::new(sender)
                                .size(12.0)
                                .strong()
                                .color(theme.link),
                        );
                    }

                    match &view.body {
                        BubbleBody::Deleted => {
                            ui.label(
                                egui::RichText::new(DELETED_PLACEHOLDER)
                                    .italics()
                                    .color(text_color.linear_multiply(0.5)),
                            );
                        }
                        BubbleBody::Editing => {
                            let response = ui.add(
                                egui::TextEdit::singleline(&mut input.edit_text)
                                    .desired_width(max_width),
                            );
                            let enter = response.lost_focus()
                                && ui.input(|i| i.key_pressed(egui::Key::Enter));
                            ui.horizontal(|ui| {
                                if ui.small_button("Save").clicked() || enter {
                                    actions.push(BubbleAction::SaveEdit);
                                }
                                if ui.small_button("Cancel").clicked() {
                                    actions.push(BubbleAction::CancelEdit);
                                }
                            });
                        }
                        BubbleBody::Content(segments) => {
                            render_segments(ui, segments, text_color, previews, theme, actions);
                        }
                    }

                    ui.horizontal(|ui| {
                        if let Some(time) = &view.time {
                            ui.label(
                                egui::RichText::new(time)
                                    .size(10.0)
                                    .color(text_color.linear_multiply(0.6)),
                            );
                        }
                        if view.show_actions {
                            if ui.small_button("Edit").clicked() {
                                actions.push(BubbleAction::BeginEdit(view.id));
                            }
                            if ui.small_button("Delete").clicked() {
                                actions.push(BubbleAction::Delete(view.id));
                            }
                        }
                    });
                });
            });
    });
}

/// Render body segments inline: text as labels, links as hyperlinks,
/// images as previews capped at `IMAGE_MAX_WIDTH`.
fn render_segments(
    ui: &mut egui::Ui,
    segments: &[Segment<'_>],
    color: egui::Color32,
    previews: &mut PreviewCache,
    theme: &ChatTheme,
    actions: &mut Vec<BubbleAction>,
) {
    ui.horizontal_wrapped(|ui| {
        ui.spacing_mut().item_spacing.x = 0.0;
        for segment in segments {
            match segment {
                Segment::Text(text) => {
                    ui.label(egui::RichText::new(*text).size(14.0).color(color));
                }
                Segment::Link(url) => link(ui, url, theme),
                Segment::Image(url) => {
                    ui.end_row();
                    render_image(ui, url, previews, theme, actions);
                    ui.end_row();
                }
            }
        }
    });
}

fn link(ui: &mut egui::Ui, url: &str, theme: &ChatTheme) {
    ui.hyperlink_to(egui::RichText::new(url).size(14.0).color(theme.link), url);
}

fn render_image(
    ui: &mut egui::Ui,
    url: &str,
    previews: &mut PreviewCache,
    theme: &ChatTheme,
    actions: &mut Vec<BubbleAction>,
) {
    match previews.get(url).cloned() {
        Some(ImagePreview::Ready { texture, size }) => {
            let response = ui
                .add(
                    egui::Image::new((texture.id(), size))
                        .max_width(IMAGE_MAX_WIDTH)
                        .corner_radius(6.0)
                        .sense(egui::Sense::click()),
                )
                .on_hover_text(url);
            if response.clicked() {
                ui.ctx().open_url(egui::OpenUrl::new_tab(url));
            }
        }
        Some(ImagePreview::Failed) => link(ui, url, theme),
        Some(ImagePreview::Loading) => {
            ui.spinner();
        }
        None => {
            if previews.request(url) {
                actions.push(BubbleAction::LoadImage(url.to_string()));
            }
            ui.spinner();
        }
    }
}
