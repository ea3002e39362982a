//! File-backed outline documents

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

use super::outline::{OutlineDocument, OutlineSyntax, TextOutline};

/// An outline document opened from disk
#[derive(Debug, Clone)]
pub struct Document {
    /// File path
    pub path: PathBuf,
    /// Document text and folding state
    pub outline: TextOutline,
    /// Whether the document has unsaved changes
    pub modified: bool,
    /// Modification time of the file as last read or written by us
    pub last_modified: Option<SystemTime>,
}

impl Document {
    /// Create a new empty document
    pub fn new(path: PathBuf) -> Self {
        let syntax = OutlineSyntax::from_path(&path);
        Self {
            path,
            outline: TextOutline::new(String::new(), syntax),
            modified: false,
            last_modified: None,
        }
    }

    /// Open a document from a file
    pub fn open(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            outline: TextOutline::new(content, OutlineSyntax::from_path(path)),
            modified: false,
            last_modified: disk_modified(path),
        })
    }

    /// Whether another program wrote the file since we opened or saved it
    pub fn changed_on_disk(&self) -> bool {
        match (self.last_modified, disk_modified(&self.path)) {
            (Some(seen), Some(current)) => current != seen,
            _ => false,
        }
    }

    /// Save the document and clear the modified flag
    pub fn save(&mut self) -> Result<()> {
        fs::write(&self.path, self.outline.text())
            .with_context(|| format!("Failed to save file: {}", self.path.display()))?;
        tracing::info!("Saved document: {}", self.path.display());
        self.modified = false;
        self.last_modified = disk_modified(&self.path);
        Ok(())
    }

    pub fn syntax(&self) -> OutlineSyntax {
        self.outline.syntax()
    }

    /// `#+title:` for Org files, otherwise the file name without extension
    pub fn title(&self) -> String {
        let keyword = match self.syntax() {
            OutlineSyntax::Org => self.outline.text().lines().find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.eq_ignore_ascii_case("#+title").then(|| value.trim().to_string())
            }),
            OutlineSyntax::Markdown => None,
        };
        keyword.filter(|t| !t.is_empty()).unwrap_or_else(|| {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Untitled".to_string())
        })
    }

    /// Text for the preview pane: folded drawers elided, Markdown frontmatter dropped
    pub fn preview_text(&self) -> String {
        let text = self.outline.folded_view();
        if self.syntax() != OutlineSyntax::Markdown || !text.starts_with("---") {
            return text;
        }
        match text[3..].find("\n---") {
            Some(end) => text[3 + end + 4..].trim_start().to_string(),
            None => text,
        }
    }

    /// Run `edit` on the outline and mark the document modified if the text changed
    pub fn edit<T>(&mut self, edit: impl FnOnce(&mut TextOutline) -> T) -> T {
        let snapshot = self.outline.text().to_string();
        let result = edit(&mut self.outline);
        if self.outline.text() != snapshot {
            self.modified = true;
        }
        result
    }
}

fn disk_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
