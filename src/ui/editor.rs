//! Outline editor panel

use eframe::egui;
use egui::text::{CCursor, CCursorRange};

use crate::app::DraftroomApp;
use crate::core::outline::OutlineDocument;

/// Plain-text editor for the open document
pub struct EditorPanel;

impl EditorPanel {
    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut DraftroomApp) {
        let font_size = app.config.editor.font_size;

        egui::ScrollArea::vertical()
            .id_salt("editor_scroll")
            .show(ui, |ui| {
                let Some(doc) = app.document.as_mut() else {
                    Self::show_welcome(ui);
                    return;
                };

                let mut output = egui::TextEdit::multiline(doc.outline.text_mut())
                    .id_salt("editor_text")
                    .code_editor()
                    .font(egui::FontId::monospace(font_size))
                    .desired_width(f32::INFINITY)
                    .desired_rows(30)
                    .show(ui);

                if output.response.changed() {
                    doc.modified = true;
                    doc.outline.retain_valid_folds();
                    // The drawer hint only lasts until the user types
                    app.status = None;
                }

                let text = doc.outline.text();
                if let Some(byte) = app.cursor.pending.take() {
                    let index = byte_to_char(text, byte);
                    output
                        .state
                        .cursor
                        .set_char_range(Some(CCursorRange::one(CCursor::new(index))));
                    output.state.clone().store(ui.ctx(), output.response.id);
                    output.response.request_focus();
                    output.response.scroll_to_me(Some(egui::Align::Center));
                    app.cursor.position = byte.min(text.len());
                } else if let Some(range) = output.state.cursor.char_range() {
                    app.cursor.position = char_to_byte(text, range.primary.index);
                }
            });
    }

    /// Show welcome screen when no document is open
    fn show_welcome(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(100.0);

            ui.heading("Draftroom");
            ui.add_space(20.0);

            ui.label("Open an .org or .md document to get started.");
            ui.add_space(10.0);

            ui.label("Keyboard shortcuts:");
            ui.label("  F11 - Focus mode");
            ui.label("  Ctrl+Shift+N - Notes drawer for the current heading");
            ui.label("  Ctrl+Shift+J - Jump back");
            ui.label("  Ctrl+S - Save");
            ui.label("  Ctrl+B - Toggle outline");
        });
    }
}

/// Byte offset of the `index`-th character
pub fn char_to_byte(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Character index of the character at byte offset `byte`
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    let mut byte = byte.min(text.len());
    while !text.is_char_boundary(byte) {
        byte -= 1;
    }
    text[..byte].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_conversion() {
        let text = "* Café\nnotes";
        let byte = text.find("notes").unwrap();
        let index = byte_to_char(text, byte);
        assert_eq!(index, 7);
        assert_eq!(char_to_byte(text, index), byte);
        assert_eq!(char_to_byte(text, 100), text.len());
        // Inside the two-byte 'é'
        assert_eq!(byte_to_char(text, 6), 5);
    }
}
