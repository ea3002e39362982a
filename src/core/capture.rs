//! Screen capture through an external tool and image link insertion

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use thiserror::Error;

use super::outline::OutlineSyntax;

/// Placeholder replaced with the target image path
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen capture command is empty")]
    EmptyCommand,
    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },
    #[error("{program} did not write {}", .path.display())]
    NoImage { program: String, path: PathBuf },
}

/// Runs a configured capture command such as `scrot -s {path}`
#[derive(Debug, Clone)]
pub struct ScreenCapture {
    command: String,
}

impl ScreenCapture {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Program and arguments for capturing into `path`.
    ///
    /// Without a `{path}` placeholder the path is appended as the last argument.
    pub fn command_line(&self, path: &Path) -> Result<Vec<String>, CaptureError> {
        let path = path.to_string_lossy();
        let mut args: Vec<String> = self
            .command
            .split_whitespace()
            .map(|arg| arg.replace(PATH_PLACEHOLDER, &path))
            .collect();
        if args.is_empty() {
            return Err(CaptureError::EmptyCommand);
        }
        if !self.command.contains(PATH_PLACEHOLDER) {
            args.push(path.into_owned());
        }
        Ok(args)
    }

    /// Capture into a new timestamped file under `dir` and return its path
    pub fn capture(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create attachment directory: {}", dir.display()))?;

        let path = dir.join(screenshot_file_name(SystemTime::now()));
        let args = self.command_line(&path)?;
        let program = args[0].clone();

        tracing::info!("Capturing screen with {}", program);
        let status = Command::new(&program)
            .args(&args[1..])
            .status()
            .with_context(|| format!("Failed to run screen capture command: {program}"))?;

        if !status.success() {
            return Err(CaptureError::Failed { program, status }.into());
        }
        if !path.is_file() {
            return Err(CaptureError::NoImage { program, path }.into());
        }
        Ok(path)
    }
}

fn screenshot_file_name(now: SystemTime) -> String {
    let stamp = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("screenshot-{stamp}.png")
}

/// Link to `image` in the document's syntax, relative to `base` when possible
pub fn image_link(image: &Path, base: Option<&Path>, syntax: OutlineSyntax) -> String {
    let shown = base
        .and_then(|base| image.strip_prefix(base).ok())
        .map(|rel| Path::new(".").join(rel))
        .unwrap_or_else(|| image.to_path_buf());
    let shown = shown.to_string_lossy().replace('\\', "/");
    match syntax {
        OutlineSyntax::Org => format!("[[file:{shown}]]"),
        OutlineSyntax::Markdown => format!("![]({shown})"),
    }
}
