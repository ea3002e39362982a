//! Main application state and UI coordination

use std::path::PathBuf;

use eframe::egui;

use crate::core::capture::{self, ScreenCapture};
use crate::core::config::AppConfig;
use crate::core::deps::{self, PathResolver};
use crate::core::document::Document;
use crate::core::drawer;
use crate::core::focus::{FocusSession, FocusTransition, ViewHost, DEFAULT_ZOOM};
use crate::core::outline::OutlineDocument;
use crate::core::wordcount;
use crate::ui::{editor::EditorPanel, outline::OutlinePanel, preview::PreviewPanel, status::StatusBar};

/// View mode for the editor area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Editor,
    Preview,
    #[default]
    Split,
}

/// Pane arrangement saved while focus mode is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub view_mode: ViewMode,
    pub outline_visible: bool,
}

/// Window layout: which panes are shown, zoom and presentation
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub view_mode: ViewMode,
    /// Whether the outline sidebar is visible
    pub outline_visible: bool,
    pub zoom: f32,
    /// Centered column without menu bar or sidebar
    pub focused: bool,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::default(),
            outline_visible: true,
            zoom: DEFAULT_ZOOM,
            focused: false,
        }
    }
}

impl ViewHost for Workspace {
    type Layout = LayoutSnapshot;

    fn capture_layout(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            view_mode: self.view_mode,
            outline_visible: self.outline_visible,
        }
    }

    fn restore_layout(&mut self, layout: LayoutSnapshot) {
        self.view_mode = layout.view_mode;
        self.outline_visible = layout.outline_visible;
    }

    fn collapse_to_single_pane(&mut self) {
        self.view_mode = ViewMode::Editor;
        self.outline_visible = false;
    }

    fn pane_count(&self) -> usize {
        let content = match self.view_mode {
            ViewMode::Split => 2,
            ViewMode::Editor | ViewMode::Preview => 1,
        };
        content + usize::from(self.outline_visible)
    }

    fn set_zoom_level(&mut self, level: f32) {
        self.zoom = level;
    }

    fn set_focused_presentation(&mut self, enabled: bool) {
        self.focused = enabled;
    }
}

/// Editor cursor bookkeeping, in byte offsets
#[derive(Debug, Clone, Default)]
pub struct EditorCursor {
    /// Cursor position reported by the editor widget last frame
    pub position: usize,
    /// Position to move the cursor to on the next frame
    pub pending: Option<usize>,
    /// Saved before opening a notes drawer
    pub return_marker: Option<usize>,
}

/// Main application state
pub struct DraftroomApp {
    /// The open document
    pub document: Option<Document>,
    /// Pane layout, driven by the focus session
    pub workspace: Workspace,
    pub focus: FocusSession<LayoutSnapshot>,
    pub cursor: EditorCursor,
    /// Application configuration
    pub config: AppConfig,
    /// Message shown in the status bar
    pub status: Option<String>,
    /// Unmet dependencies from the startup check
    pub missing_tools: Vec<String>,
    /// Set after warning that the file changed on disk; the next save overwrites it
    pub overwrite_armed: bool,
    /// Commonmark cache for preview
    pub commonmark_cache: egui_commonmark::CommonMarkCache,
}

impl DraftroomApp {
    /// Create a new application instance
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        missing_tools: Vec<String>,
        initial: Option<PathBuf>,
    ) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let mut app = Self::with_config(config);
        app.status = deps::missing_message(&missing_tools);
        app.missing_tools = missing_tools;
        if let Some(path) = initial.or_else(|| app.config.last_document.clone()) {
            app.open_document(path);
        }
        app
    }

    fn with_config(config: AppConfig) -> Self {
        Self {
            document: None,
            workspace: Workspace::default(),
            focus: FocusSession::new(config.focus.zoom_level),
            cursor: EditorCursor::default(),
            config,
            status: None,
            missing_tools: Vec::new(),
            overwrite_armed: false,
            commonmark_cache: egui_commonmark::CommonMarkCache::default(),
        }
    }

    /// Report configured external tools that cannot be found
    pub fn check_dependencies(&mut self) {
        self.missing_tools = deps::find_missing(&self.config.dependencies, &PathResolver::from_env());
        match deps::missing_message(&self.missing_tools) {
            Some(message) => {
                tracing::warn!("{}", message);
                self.status = Some(message);
            }
            None => tracing::info!("All external tools found"),
        }
    }

    /// Open a document
    pub fn open_document(&mut self, path: PathBuf) {
        match Document::open(&path) {
            Ok(mut doc) => {
                if self.config.editor.fold_drawers_on_open {
                    doc.outline.collapse_drawers();
                }
                tracing::info!("Opened document: {}", path.display());
                self.document = Some(doc);
                self.cursor = EditorCursor::default();
                self.overwrite_armed = false;
                self.config.add_recent_document(path);
                if let Err(e) = self.config.save() {
                    tracing::error!("Failed to save config: {:#}", e);
                }
            }
            Err(e) => {
                tracing::error!("Failed to open document: {:#}", e);
                self.status = Some(format!("{e:#}"));
            }
        }
    }

    /// Save the open document
    pub fn save_document(&mut self) {
        if let Some(doc) = self.document.as_mut() {
            if doc.changed_on_disk() && !self.overwrite_armed {
                tracing::warn!("{} changed on disk since it was opened", doc.path.display());
                self.overwrite_armed = true;
                self.status = Some(format!(
                    "{} changed on disk; save again to overwrite",
                    doc.title()
                ));
                return;
            }
            self.overwrite_armed = false;
            match doc.save() {
                Ok(()) => self.status = Some(format!("Saved {}", doc.title())),
                Err(e) => {
                    tracing::error!("Failed to save document: {:#}", e);
                    self.status = Some(format!("{e:#}"));
                }
            }
        }
    }

    pub fn pick_document(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Notes", &["org", "md", "markdown"]);
        if let Some(dir) = &self.config.paths.notes_dir {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.open_document(path);
        }
    }

    pub fn toggle_focus(&mut self) {
        if self.focus.toggle(&mut self.workspace) == FocusTransition::Entered {
            self.status = None;
        }
    }

    /// Open or create the notes drawer of the heading at the cursor
    pub fn open_notes_drawer(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            self.status = Some("No document open".to_string());
            return;
        };

        let position = self.cursor.position;
        let name = self.config.drawer.name.clone();
        match doc.edit(|outline| drawer::ensure_drawer(outline, position, &name)) {
            Ok(handle) => {
                // Text inserted at or above the saved position pushes it down
                let marker = match &handle.inserted {
                    Some(span) if position >= span.start => position + span.len(),
                    _ => position,
                };
                self.cursor.return_marker = Some(marker);
                self.cursor.pending = Some(handle.cursor);
                self.status = Some(handle.hint().to_string());
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    /// Return to the position saved before the last drawer jump
    pub fn jump_back(&mut self) {
        match self.cursor.return_marker.take() {
            Some(position) => {
                let len = self.document.as_ref().map_or(0, |d| d.outline.text().len());
                self.cursor.pending = Some(position.min(len));
                self.status = None;
            }
            None => self.status = Some("No position to jump back to".to_string()),
        }
    }

    pub fn annotate_word_counts(&mut self) {
        if let Some(doc) = self.document.as_mut() {
            let count = doc.edit(wordcount::annotate_word_counts);
            self.status = Some(format!("Updated word counts on {count} headings"));
        }
    }

    pub fn fold_drawers(&mut self) {
        if let Some(doc) = self.document.as_mut() {
            doc.outline.collapse_drawers();
        }
    }

    /// Capture part of the screen and link the image at the cursor
    pub fn insert_screenshot(&mut self) {
        let Some(doc) = self.document.as_mut() else {
            self.status = Some("No document open".to_string());
            return;
        };

        let dir = self.config.attachment_dir_for(&doc.path);
        match ScreenCapture::new(self.config.capture.command.clone()).capture(&dir) {
            Ok(image) => {
                let link = capture::image_link(&image, doc.path.parent(), doc.syntax());
                let at = self.cursor.position.min(doc.outline.text().len());
                doc.edit(|outline| outline.insert_text(at, &link));
                self.cursor.pending = Some(at + link.len());
                self.status = Some(format!("Inserted {}", image.display()));
            }
            Err(e) => {
                tracing::error!("Screen capture failed: {:#}", e);
                self.status = Some(format!("{e:#}"));
            }
        }
    }

    /// Flip between split and single editor view
    pub fn toggle_split(&mut self) {
        self.workspace.view_mode = match self.workspace.view_mode {
            ViewMode::Split => ViewMode::Editor,
            ViewMode::Editor | ViewMode::Preview => ViewMode::Split,
        };
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, Modifiers};

        let ctrl_shift = Modifiers::COMMAND | Modifiers::SHIFT;
        let (focus, drawer, back, save, outline, split) = ctx.input_mut(|i| {
            (
                i.consume_key(Modifiers::NONE, Key::F11),
                i.consume_key(ctrl_shift, Key::N),
                i.consume_key(ctrl_shift, Key::J),
                i.consume_key(Modifiers::COMMAND, Key::S),
                i.consume_key(Modifiers::COMMAND, Key::B),
                i.consume_key(Modifiers::COMMAND, Key::Backslash),
            )
        });

        if focus {
            self.toggle_focus();
        }
        if drawer {
            self.open_notes_drawer();
        }
        if back {
            self.jump_back();
        }
        if save {
            self.save_document();
        }
        if outline {
            self.workspace.outline_visible = !self.workspace.outline_visible;
        }
        if split {
            self.toggle_split();
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open...").clicked() {
                        self.pick_document();
                        ui.close();
                    }
                    let recent = self.config.recent_documents.clone();
                    ui.menu_button("Open Recent", |ui| {
                        for path in recent {
                            if ui.button(path.display().to_string()).clicked() {
                                self.open_document(path);
                                ui.close();
                            }
                        }
                    });
                    if ui.button("Save").clicked() {
                        self.save_document();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("Notes", |ui| {
                    if ui.button("Open Notes Drawer").clicked() {
                        self.open_notes_drawer();
                        ui.close();
                    }
                    if ui.button("Jump Back").clicked() {
                        self.jump_back();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Insert Screenshot").clicked() {
                        self.insert_screenshot();
                        ui.close();
                    }
                    if ui.button("Update Word Counts").clicked() {
                        self.annotate_word_counts();
                        ui.close();
                    }
                    if ui.button("Fold Drawers").clicked() {
                        self.fold_drawers();
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Focus Mode").clicked() {
                        self.toggle_focus();
                        ui.close();
                    }
                    if ui.button("Toggle Outline").clicked() {
                        self.workspace.outline_visible = !self.workspace.outline_visible;
                        ui.close();
                    }
                    ui.separator();
                    let modes = [
                        (ViewMode::Editor, "Editor Only"),
                        (ViewMode::Preview, "Preview Only"),
                        (ViewMode::Split, "Split View"),
                    ];
                    for (mode, label) in modes {
                        if ui.selectable_label(self.workspace.view_mode == mode, label).clicked() {
                            self.workspace.view_mode = mode;
                            ui.close();
                        }
                    }
                });

                ui.menu_button("Tools", |ui| {
                    if ui.button("Check Dependencies").clicked() {
                        self.check_dependencies();
                        if self.missing_tools.is_empty() {
                            self.status = Some("All external tools found".to_string());
                        }
                        ui.close();
                    }
                });
            });
        });
    }

    fn render_focused(&mut self, ctx: &egui::Context) {
        let column_width = self.config.focus.column_width;
        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_width();
            let width = column_width.min(available);
            ui.horizontal_top(|ui| {
                ui.add_space((available - width) / 2.0);
                ui.vertical(|ui| {
                    ui.set_width(width);
                    EditorPanel::show(ui, self);
                });
            });
        });
    }

    fn render_panes(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| match self.workspace.view_mode {
            ViewMode::Editor => EditorPanel::show(ui, self),
            ViewMode::Preview => PreviewPanel::show(ui, self),
            ViewMode::Split => {
                // Split view: editor on left, preview on right
                let available_width = ui.available_width();
                ui.horizontal(|ui| {
                    ui.set_min_width(available_width);

                    ui.vertical(|ui| {
                        ui.set_width(available_width / 2.0 - 4.0);
                        EditorPanel::show(ui, self);
                    });

                    ui.separator();

                    ui.vertical(|ui| {
                        ui.set_width(available_width / 2.0 - 4.0);
                        PreviewPanel::show(ui, self);
                    });
                });
            }
        });
    }
}

impl eframe::App for DraftroomApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        if ctx.zoom_factor() != self.workspace.zoom {
            ctx.set_zoom_factor(self.workspace.zoom);
        }

        if !self.workspace.focused {
            self.render_menu_bar(ctx);
        }

        if !self.workspace.focused || self.status.is_some() {
            egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
                StatusBar::show(ui, self);
            });
        }

        if self.workspace.outline_visible {
            egui::SidePanel::left("outline")
                .resizable(true)
                .default_width(250.0)
                .min_width(150.0)
                .show(ctx, |ui| {
                    OutlinePanel::show(ui, self);
                });
        }

        if self.workspace.focused && self.workspace.pane_count() == 1 {
            self.render_focused(ctx);
        } else {
            self.render_panes(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outline::{OutlineSyntax, TextOutline};
    use pretty_assertions::assert_eq;

    fn app_with(text: &str) -> DraftroomApp {
        let mut app = DraftroomApp::with_config(AppConfig::default());
        let mut doc = Document::new(PathBuf::from("draft.org"));
        doc.outline = TextOutline::new(text, OutlineSyntax::Org);
        app.document = Some(doc);
        app
    }

    #[test]
    fn test_workspace_pane_count() {
        let mut workspace = Workspace::default();
        assert_eq!(workspace.pane_count(), 3);
        workspace.collapse_to_single_pane();
        assert_eq!(workspace.pane_count(), 1);
        workspace.view_mode = ViewMode::Split;
        assert_eq!(workspace.pane_count(), 2);
    }

    #[test]
    fn test_focus_round_trip_restores_workspace() {
        let mut app = app_with("");
        app.workspace.view_mode = ViewMode::Preview;
        let before = app.workspace.clone();

        app.toggle_focus();
        assert!(app.workspace.focused);
        assert_eq!(app.workspace.zoom, app.config.focus.zoom_level);
        assert_eq!(app.workspace.pane_count(), 1);

        app.toggle_focus();
        assert_eq!(app.workspace, before);
        assert!(!app.focus.is_active());
    }

    #[test]
    fn test_split_while_focused_is_kept() {
        let mut app = app_with("");
        app.workspace.view_mode = ViewMode::Preview;
        app.workspace.outline_visible = false;
        app.toggle_focus();
        app.toggle_split();
        app.toggle_focus();

        assert_eq!(app.workspace.view_mode, ViewMode::Split);
        assert_eq!(app.workspace.zoom, DEFAULT_ZOOM);
        assert!(!app.workspace.focused);
        assert!(!app.focus.is_active());
    }

    #[test]
    fn test_drawer_command_and_jump_back() {
        let mut app = app_with("* Chapter\nprose\n");
        app.cursor.position = 12;

        app.open_notes_drawer();
        let doc = app.document.as_ref().unwrap();
        assert_eq!(doc.outline.text(), "* Chapter\n:NOTES:\n\n:END:\nprose\n");
        assert!(doc.modified);
        assert_eq!(app.cursor.pending, Some(18));
        assert_eq!(app.status.as_deref(), Some(drawer::RETURN_HINT));

        app.cursor.position = 18;
        app.jump_back();
        // "prose" moved down by the inserted drawer
        assert_eq!(app.cursor.pending, Some(12 + ":NOTES:\n\n:END:\n".len()));
        assert_eq!(app.cursor.return_marker, None);
    }

    #[test]
    fn test_jump_back_from_inside_existing_drawer() {
        let mut app = app_with("* A\n:NOTES:\nhello world\n:END:\n");
        let position = "* A\n:NOTES:\nhello".len();
        app.cursor.position = position;

        app.open_notes_drawer();
        let doc = app.document.as_ref().unwrap();
        assert_eq!(doc.outline.text(), "* A\n:NOTES:\nhello world\n\n:END:\n");
        assert_eq!(app.cursor.return_marker, Some(position));

        app.jump_back();
        let text = app.document.as_ref().unwrap().outline.text();
        assert_eq!(&text[app.cursor.pending.unwrap()..], " world\n\n:END:\n");
    }

    #[test]
    fn test_jump_back_from_below_reopened_drawer() {
        let mut app = app_with("* A\n:NOTES:\nx\n:END:\nprose\n");
        let position = "* A\n:NOTES:\nx\n:END:\npr".len();
        app.cursor.position = position;

        app.open_notes_drawer();
        app.jump_back();
        let text = app.document.as_ref().unwrap().outline.text();
        assert_eq!(&text[app.cursor.pending.unwrap()..], "ose\n");
    }

    #[test]
    fn test_save_warns_before_overwriting_external_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.org");
        std::fs::write(&path, "* Chapter\n").unwrap();

        let mut app = DraftroomApp::with_config(AppConfig::default());
        app.document = Some(Document::open(&path).unwrap());
        app.document.as_mut().unwrap().edit(|outline| outline.insert_text(0, "#+TITLE: Mine\n"));

        std::fs::write(&path, "* Someone else\n").unwrap();
        let seen = app.document.as_ref().unwrap().last_modified.unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(seen + std::time::Duration::from_secs(60))
            .unwrap();

        app.save_document();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "* Someone else\n");
        assert_eq!(
            app.status.as_deref(),
            Some("Mine changed on disk; save again to overwrite")
        );

        app.save_document();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "#+TITLE: Mine\n* Chapter\n");
        assert!(!app.overwrite_armed);
        assert_eq!(app.status.as_deref(), Some("Saved Mine"));
    }

    #[test]
    fn test_drawer_command_without_heading() {
        let mut app = app_with("no headings here\n");
        app.open_notes_drawer();

        let doc = app.document.as_ref().unwrap();
        assert_eq!(doc.outline.text(), "no headings here\n");
        assert!(!doc.modified);
        assert_eq!(app.status.as_deref(), Some("no heading found"));
        assert_eq!(app.cursor.pending, None);
    }
}
