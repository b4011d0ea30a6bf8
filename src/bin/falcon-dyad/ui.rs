use egui::{Align2, Color32, FontId, Rect, vec2};

use crate::model::Model;

const BACKGROUND: Color32 = Color32::BLACK;
const WORKSPACE: Color32 = Color32::from_rgb(20, 20, 20);
const STATUS_TEXT: Color32 = Color32::GRAY;

fn host_colour() -> Color32 {
    Color32::from_rgba_unmultiplied(255, 0, 0, 127)
}

fn client_colour() -> Color32 {
    Color32::from_rgba_unmultiplied(0, 0, 255, 127)
}

pub fn render_ui(ctx: &egui::Context, model: &mut Model) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(BACKGROUND))
        .show(ctx, |ui| {
            let screen = ui.max_rect();
            model.centre = screen.center();
            let painter = ui.painter();

            // Workspace square, with room for a cursor at the extremes
            let workspace_size = (model.workspace_scale + model.cursor_radius) * 2.;
            painter.rect_filled(
                Rect::from_center_size(model.centre, vec2(workspace_size, workspace_size)),
                0.,
                WORKSPACE,
            );

            let role = model.session.role();
            let cursors = *model.session.cursors();
            painter.circle_filled(
                model.to_screen(&cursors.client(role)),
                model.cursor_radius,
                client_colour(),
            );
            painter.circle_filled(
                model.to_screen(&cursors.host(role)),
                model.cursor_radius,
                host_colour(),
            );

            let touching = model
                .last_interaction
                .map(|i| i.touching)
                .unwrap_or_default();
            painter.text(
                screen.left_top() + vec2(8., 8.),
                Align2::LEFT_TOP,
                format!(
                    "{} | tick {}{}",
                    role,
                    model.session.ticks(),
                    if touching { " | touching" } else { "" }
                ),
                FontId::monospace(12.),
                STATUS_TEXT,
            );
        });
}
