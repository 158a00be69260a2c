//! Path utilities and XDG directory discovery for node-level overrides.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::ConfigError;

/// XDG-compliant paths the loader checks in addition to the project
/// directory's own `gateway.toml` / `gateway.local.toml`.
pub struct Paths {
    project_dirs: Option<ProjectDirs>,
}

impl Paths {
    pub fn new() -> Self {
        Self {
            project_dirs: ProjectDirs::from("com", "FixGateway", "fixgw"),
        }
    }

    /// `~/.config/fixgw/config.toml`.
    pub fn user_config_file(&self) -> Result<PathBuf, ConfigError> {
        self.project_dirs
            .as_ref()
            .map(|p| p.config_dir().join("config.toml"))
            .ok_or_else(|| ConfigError::Xdg("failed to determine user config directory".to_string()))
    }

    /// `<project_dir>/gateway.toml`, git-tracked.
    pub fn project_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join("gateway.toml")
    }

    /// `<project_dir>/gateway.local.toml`, gitignored overrides.
    pub fn local_config_file(project_dir: impl AsRef<Path>) -> PathBuf {
        project_dir.as_ref().join("gateway.local.toml")
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn project_and_local_config_paths() {
        let dir = tempdir().unwrap();
        assert_eq!(Paths::project_config_file(dir.path()), dir.path().join("gateway.toml"));
        assert_eq!(
            Paths::local_config_file(dir.path()),
            dir.path().join("gateway.local.toml")
        );
    }
}
