//! Status bar

use eframe::egui;

use crate::app::DraftroomApp;

pub struct StatusBar;

impl StatusBar {
    pub fn show(ui: &mut egui::Ui, app: &mut DraftroomApp) {
        ui.horizontal(|ui| {
            if let Some(doc) = &app.document {
                let title = if doc.modified {
                    format!("{}*", doc.title())
                } else {
                    doc.title()
                };
                ui.strong(title);
                ui.separator();
            }

            if let Some(message) = &app.status {
                ui.label(message);
            }

            if !app.missing_tools.is_empty() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.colored_label(ui.visuals().warn_fg_color, "Missing tools")
                        .on_hover_text(app.missing_tools.join(", "));
                });
            }
        });
    }
}
