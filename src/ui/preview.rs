//! Document preview panel using egui_commonmark

use eframe::egui;
use egui_commonmark::CommonMarkViewer;

use crate::app::DraftroomApp;
use crate::core::outline::OutlineSyntax;

/// Read-only preview with folded drawers collapsed
pub struct PreviewPanel;

impl PreviewPanel {
    /// Show the preview panel
    pub fn show(ui: &mut egui::Ui, app: &mut DraftroomApp) {
        // Get content first to avoid borrow conflicts
        let content = app
            .document
            .as_ref()
            .map(|doc| (doc.syntax(), doc.preview_text()));

        egui::ScrollArea::vertical()
            .id_salt("preview_scroll")
            .show(ui, |ui| match content {
                Some((OutlineSyntax::Markdown, text)) => {
                    CommonMarkViewer::new().show(ui, &mut app.commonmark_cache, &text);
                }
                Some((OutlineSyntax::Org, text)) => {
                    ui.add(egui::Label::new(egui::RichText::new(text).monospace()).wrap());
                }
                None => Self::show_empty(ui),
            });
    }

    /// Show empty state
    fn show_empty(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.label("No document open");
            ui.label("Open a note to see the preview");
        });
    }
}
