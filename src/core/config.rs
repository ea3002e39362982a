//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::deps::{self, Requirement};
use super::drawer::NOTES_DRAWER;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Last opened document
    pub last_document: Option<PathBuf>,
    /// Recently opened documents, most recent first
    pub recent_documents: Vec<PathBuf>,
    pub editor: EditorConfig,
    pub focus: FocusConfig,
    pub drawer: DrawerConfig,
    pub paths: PathsConfig,
    pub capture: CaptureConfig,
    /// External tools checked at startup
    pub dependencies: Vec<Requirement>,
}

/// Editor-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font size in pixels
    pub font_size: f32,
    /// Fold every drawer when a document is opened
    pub fold_drawers_on_open: bool,
}

/// Focus mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Zoom factor applied while focused
    pub zoom_level: f32,
    /// Width of the centered text column while focused
    pub column_width: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawerConfig {
    pub name: String,
}

/// File-system locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory offered by the open dialog
    pub notes_dir: Option<PathBuf>,
    /// BibTeX database used for citations
    pub bibliography: Option<PathBuf>,
    /// Where screenshots are stored; defaults to `images/` next to the document
    pub attachment_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Command template; `{path}` is replaced with the image path
    pub command: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_document: None,
            recent_documents: Vec::new(),
            editor: EditorConfig::default(),
            focus: FocusConfig::default(),
            drawer: DrawerConfig::default(),
            paths: PathsConfig::default(),
            capture: CaptureConfig::default(),
            dependencies: deps::default_requirements(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            fold_drawers_on_open: false,
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            zoom_level: 1.25,
            column_width: 720.0,
        }
    }
}

impl Default for DrawerConfig {
    fn default() -> Self {
        Self {
            name: NOTES_DRAWER.to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let command = if cfg!(target_os = "macos") {
            "screencapture -i {path}"
        } else {
            "scrot -s {path}"
        };
        Self {
            command: command.to_string(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "draftroom", "Draftroom")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, falling back to defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Record `path` as the most recent document
    pub fn add_recent_document(&mut self, path: PathBuf) {
        self.recent_documents.retain(|p| p != &path);
        self.recent_documents.insert(0, path.clone());
        self.recent_documents.truncate(10);
        self.last_document = Some(path);
    }

    /// Screenshot directory for a document at `document`
    pub fn attachment_dir_for(&self, document: &Path) -> PathBuf {
        self.paths.attachment_dir.clone().unwrap_or_else(|| {
            document
                .parent()
                .map(|dir| dir.join("images"))
                .unwrap_or_else(|| PathBuf::from("images"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.drawer.name, "NOTES");
        assert_eq!(config.focus.zoom_level, 1.25);
        assert_eq!(config.dependencies, deps::default_requirements());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"focus": {"zoom_level": 2.0}, "dependencies": ["pandoc"]}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.focus.zoom_level, 2.0);
        assert_eq!(config.focus.column_width, 720.0);
        assert_eq!(config.dependencies, vec![Requirement::Single("pandoc".to_string())]);
        assert_eq!(config.editor.font_size, 14.0);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::default();
        config.add_recent_document(PathBuf::from("/notes/a.org"));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.last_document, Some(PathBuf::from("/notes/a.org")));
        assert_eq!(loaded.recent_documents, config.recent_documents);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_recent_documents_are_capped_and_deduplicated() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_document(PathBuf::from(format!("/notes/{i}.md")));
        }
        config.add_recent_document(PathBuf::from("/notes/5.md"));
        assert_eq!(config.recent_documents.len(), 10);
        assert_eq!(config.recent_documents[0], PathBuf::from("/notes/5.md"));
        assert_eq!(
            config.recent_documents.iter().filter(|p| p.ends_with("5.md")).count(),
            1
        );
    }

    #[test]
    fn test_attachment_dir() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.attachment_dir_for(Path::new("/notes/a.org")),
            PathBuf::from("/notes/images")
        );
        config.paths.attachment_dir = Some(PathBuf::from("/shots"));
        assert_eq!(config.attachment_dir_for(Path::new("/notes/a.org")), PathBuf::from("/shots"));
    }
}
