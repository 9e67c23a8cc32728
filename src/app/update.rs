//! Main update loop

use eframe::egui::{self, RichText};
use std::time::Duration;

use crate::config::ROOM_LABEL;
use crate::session::STATUS_TTL_SECS;
use crate::ui;

use super::ChatApp;

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Request repaint to keep checking for events
        ctx.request_repaint_after(Duration::from_millis(100));

        if let Some(error) = &self.startup_error {
            render_startup_error(ctx, error, &self.theme);
            return;
        }

        if !self.has_joined() {
            if let Some(session) = self.session.as_mut() {
                session.process_events();
                session.purge_old_status_messages(STATUS_TTL_SECS);
            }
            if ui::render_join_screen(ctx, &mut self.input, &self.theme) {
                self.handle_join();
            }
            self.render_toasts(ctx);
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_mounted() {
            session.mount();
        }
        session.process_events();
        session.purge_old_status_messages(STATUS_TTL_SECS);
        for (url, image) in session.take_loaded_images() {
            self.previews.insert(ctx, url, image);
        }

        let revision = session.reconciler().revision();
        let scroll_to_bottom = revision != self.last_revision;
        self.last_revision = revision;

        ui::render_header(
            ctx,
            ROOM_LABEL,
            session.display_name(),
            session.feed_status(),
            &self.theme,
        );

        let placeholder = format!("Message #{}", ROOM_LABEL);
        let submitted = ui::render_composer(
            ctx,
            &mut self.input,
            &placeholder,
            session.is_sending(),
            &self.theme,
        );

        let actions = egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(self.theme.surface[0]))
            .show(ctx, |ui| {
                ui::render_messages(
                    ui,
                    session.messages(),
                    session.display_name(),
                    session.is_loading(),
                    &mut self.input,
                    &mut self.previews,
                    &self.theme,
                    scroll_to_bottom,
                )
            })
            .inner;

        if submitted {
            self.handle_send();
        }
        for action in actions {
            self.handle_bubble_action(action);
        }

        self.render_toasts(ctx);
    }
}

impl ChatApp {
    fn render_toasts(&self, ctx: &egui::Context) {
        if let Some(session) = &self.session {
            ui::render_status_toasts(ctx, &session.status_messages, &self.theme);
        }
    }
}

fn render_startup_error(ctx: &egui::Context, error: &str, theme: &ui::ChatTheme) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(48.0);
            ui.label(
                RichText::new("Cannot reach the chat backend")
                    .size(18.0)
                    .strong()
                    .color(theme.text_primary),
            );
            ui.add_space(8.0);
            ui.label(RichText::new(error).color(theme.error));
            ui.add_space(8.0);
            ui.label(
                RichText::new(format!(
                    "Set {} and {} and restart.",
                    crate::config::ENV_BACKEND_URL,
                    crate::config::ENV_ANON_KEY
                ))
                .color(theme.text_muted),
            );
        });
    });
}
