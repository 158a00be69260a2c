//! Multi-source configuration loading with layered precedence.

use std::env;
use std::path::{Path, PathBuf};

use crate::{ConfigError, GatewayConfig, Paths};

/// Builder for [`GatewayConfig`] loading, following the same four-source
/// precedence as the teacher workspace's configuration loader, renamed to
/// this project's `GATEWAY_` environment prefix.
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "GATEWAY".to_string(),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Loads configuration from, in increasing precedence: built-in
    /// defaults, the user's XDG config file, the project's `gateway.toml`,
    /// `gateway.local.toml`, then `GATEWAY_*` environment variables.
    /// Validates the result before returning it.
    pub fn load(self) -> Result<GatewayConfig, ConfigError> {
        let mut builder = config::Config::builder();

        let defaults = GatewayConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        let paths = Paths::new();
        if let Ok(user_config_file) = paths.user_config_file() {
            if user_config_file.exists() {
                builder = builder.add_source(
                    config::File::from(user_config_file)
                        .required(false)
                        .format(config::FileFormat::Toml),
                );
            }
        }

        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("_")
                .try_parsing(true),
        );

        let built = builder.build()?;
        let mut gateway_config: GatewayConfig = built.try_deserialize()?;
        gateway_config.resolve_paths(&self.project_dir);
        gateway_config.validate()?;
        Ok(gateway_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_defaults_when_no_files_present() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new().with_project_dir(dir.path()).load().unwrap();
        assert_eq!(config.fix.begin_string, "FIX.4.4");
        assert_eq!(config.replication.cluster_size, 3);
    }

    #[test]
    fn project_config_overrides_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("gateway.toml"),
            r#"
[fix]
begin_string = "FIX.4.2"

[replication]
cluster_size = 5
"#,
        )
        .unwrap();

        let config = ConfigLoader::new().with_project_dir(dir.path()).load().unwrap();
        assert_eq!(config.fix.begin_string, "FIX.4.2");
        assert_eq!(config.replication.cluster_size, 5);
    }

    #[test]
    fn local_config_overrides_project_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gateway.toml"), "[node]\nnode_id = 1\n").unwrap();
        fs::write(dir.path().join("gateway.local.toml"), "[node]\nnode_id = 2\n").unwrap();

        let config = ConfigLoader::new().with_project_dir(dir.path()).load().unwrap();
        assert_eq!(config.node.node_id, 2);
    }

    #[test]
    fn invalid_cluster_size_fails_validation_at_load_time() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("gateway.toml"), "[replication]\ncluster_size = 4\n").unwrap();

        let err = ConfigLoader::new().with_project_dir(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn data_dir_is_resolved_to_an_absolute_path() {
        let dir = tempdir().unwrap();
        let config = ConfigLoader::new().with_project_dir(dir.path()).load().unwrap();
        assert!(config.node.data_dir.is_absolute());
    }
}
