//! External tool availability checks

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One required tool, or a group where any member will do.
///
/// In configuration a string is a single tool and an array is a group:
/// `["git", ["scrot", "import"]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Single(String),
    AnyOf(Vec<String>),
}

impl Requirement {
    /// The report token if this requirement is unmet
    fn missing_token<R>(&self, resolver: &R) -> Option<String>
    where
        R: CapabilityResolver + ?Sized,
    {
        match self {
            Self::Single(name) => (!resolver.resolve(name)).then(|| name.clone()),
            Self::AnyOf(names) => {
                (!names.iter().any(|name| resolver.resolve(name)))
                    .then(|| format!("({})", names.join(" or ")))
            }
        }
    }
}

/// Looks up whether a named capability exists in the host environment
pub trait CapabilityResolver {
    fn resolve(&self, name: &str) -> bool;
}

impl<F> CapabilityResolver for F
where
    F: Fn(&str) -> bool,
{
    fn resolve(&self, name: &str) -> bool {
        self(name)
    }
}

/// Resolves capabilities as executables on the search path
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    dirs: Vec<PathBuf>,
    extensions: Vec<OsString>,
}

impl PathResolver {
    /// Resolver over the current `PATH` (and `PATHEXT` on Windows)
    pub fn from_env() -> Self {
        let dirs = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();

        #[cfg(windows)]
        let extensions = std::env::var_os("PATHEXT")
            .map(|exts| {
                exts.to_string_lossy()
                    .split(';')
                    .filter(|ext| !ext.is_empty())
                    .map(OsString::from)
                    .collect()
            })
            .unwrap_or_else(|| vec![OsString::from(".EXE"), OsString::from(".CMD")]);
        #[cfg(not(windows))]
        let extensions = Vec::new();

        Self { dirs, extensions }
    }

    /// Resolver over an explicit list of directories
    #[cfg(test)]
    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            extensions: Vec::new(),
        }
    }

    /// Full path of `name`, if found
    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        let candidate = Path::new(name);
        if candidate.components().count() > 1 {
            return is_executable(candidate).then(|| candidate.to_path_buf());
        }

        self.dirs.iter().find_map(|dir| {
            let plain = dir.join(name);
            if is_executable(&plain) {
                return Some(plain);
            }
            self.extensions.iter().find_map(|ext| {
                let mut file = OsString::from(name);
                file.push(ext);
                let with_ext = dir.join(file);
                is_executable(&with_ext).then_some(with_ext)
            })
        })
    }
}

impl CapabilityResolver for PathResolver {
    fn resolve(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Unmet requirements in input order.
///
/// A group is reported once as `(a or b)`, never member by member.
pub fn find_missing<R>(spec: &[Requirement], resolver: &R) -> Vec<String>
where
    R: CapabilityResolver + ?Sized,
{
    spec.iter()
        .filter_map(|requirement| requirement.missing_token(resolver))
        .collect()
}

/// Human-readable report, or `None` when nothing is missing
pub fn missing_message(missing: &[String]) -> Option<String> {
    if missing.is_empty() {
        return None;
    }
    Some(format!("Missing external tools: {}", missing.join(", ")))
}

/// Tools the application integrates with out of the box
pub fn default_requirements() -> Vec<Requirement> {
    vec![
        Requirement::Single("git".to_string()),
        Requirement::AnyOf(vec![
            "scrot".to_string(),
            "import".to_string(),
            "screencapture".to_string(),
        ]),
        Requirement::AnyOf(vec!["latexmk".to_string(), "pdflatex".to_string()]),
        Requirement::Single("bibtex".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(name: &str) -> Requirement {
        Requirement::Single(name.to_string())
    }

    fn any_of(names: &[&str]) -> Requirement {
        Requirement::AnyOf(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_group_reported_once() {
        let spec = vec![single("A"), any_of(&["B", "C"]), single("D")];
        let resolver = |name: &str| name == "A" || name == "D";
        assert_eq!(find_missing(&spec, &resolver), vec!["(B or C)"]);
    }

    #[test]
    fn test_group_satisfied_by_any_member() {
        let spec = vec![any_of(&["B", "C"])];
        assert!(find_missing(&spec, &|name: &str| name == "C").is_empty());
    }

    #[test]
    fn test_all_missing_in_order() {
        let spec = vec![single("A"), single("B")];
        assert_eq!(find_missing(&spec, &|_: &str| false), vec!["A", "B"]);
    }

    #[test]
    fn test_nothing_missing() {
        let spec = vec![single("A"), any_of(&["B", "C"])];
        let missing = find_missing(&spec, &|_: &str| true);
        assert!(missing.is_empty());
        assert_eq!(missing_message(&missing), None);
    }

    #[test]
    fn test_missing_message() {
        let missing = vec!["pandoc".to_string(), "(scrot or import)".to_string()];
        assert_eq!(
            missing_message(&missing).as_deref(),
            Some("Missing external tools: pandoc, (scrot or import)")
        );
    }

    #[test]
    fn test_requirement_config_shape() {
        let spec: Vec<Requirement> = serde_json::from_str(r#"["git", ["scrot", "import"]]"#).unwrap();
        assert_eq!(spec, vec![single("git"), any_of(&["scrot", "import"])]);
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"["git",["scrot","import"]]"#
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_path_resolver_checks_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("mytool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o644)).unwrap();

        let resolver = PathResolver::with_dirs(vec![dir.path().to_path_buf()]);
        assert!(!resolver.resolve("mytool"));

        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(resolver.resolve("mytool"));
        assert_eq!(resolver.locate("mytool"), Some(tool.clone()));
        assert!(resolver.resolve(tool.to_str().unwrap()));
        assert!(!resolver.resolve("othertool"));
    }
}
