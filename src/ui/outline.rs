//! Outline sidebar: heading tree with word counts

use eframe::egui;

use crate::app::DraftroomApp;
use crate::core::outline::OutlineDocument;
use crate::core::wordcount;

pub struct OutlinePanel;

impl OutlinePanel {
    pub fn show(ui: &mut egui::Ui, app: &mut DraftroomApp) {
        ui.heading("Outline");
        ui.separator();

        let Some(doc) = app.document.as_ref() else {
            ui.label("No document open");
            return;
        };

        let counts = wordcount::heading_word_counts(doc.outline.text(), doc.syntax());
        if counts.is_empty() {
            ui.label("No headings");
            return;
        }

        let current = doc
            .outline
            .find_enclosing_heading(app.cursor.position)
            .map(|h| h.offset);
        let mut jump = None;

        egui::ScrollArea::vertical()
            .id_salt("outline_scroll")
            .show(ui, |ui| {
                for count in &counts {
                    let heading = &count.heading;
                    ui.horizontal(|ui| {
                        ui.add_space(12.0 * (heading.level - 1) as f32);
                        let selected = current == Some(heading.offset);
                        if ui.selectable_label(selected, heading.title.as_str()).clicked() {
                            jump = Some(heading.offset);
                        }
                        ui.weak(count.subtree_words.to_string());
                    });
                }
            });

        if jump.is_some() {
            app.cursor.pending = jump;
        }
    }
}
