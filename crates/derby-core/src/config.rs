//! derby.toml configuration parser.
//!
//! Every setting is optional. The CLI layers flags and environment
//! variables on top of whatever the file provides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "derby.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerbyConfig {
    pub project: ProjectConfig,
    pub rollout: RolloutConfig,
    pub snapshot: SnapshotConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloutConfig {
    pub zone: Option<String>,
    pub group: Option<String>,
    pub min_ready_sec: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Directory metadata snapshots are written to.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the compute API.
    pub endpoint: Option<String>,
}

impl DerbyConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DerbyConfig = toml::from_str(&content)?;
        debug!(?path, "config loaded");
        Ok(config)
    }

    /// Load `explicit` if given (it must exist), else `derby.toml` in the
    /// working directory if present, else the empty config.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let toml_str = r#"
[project]
id = "prod-eu"

[rollout]
zone = "europe-west1-b"
group = "web"
min_ready_sec = 90

[snapshot]
dir = "/var/backups/derby"

[api]
endpoint = "http://localhost:9090/compute/beta/"
"#;
        let config: DerbyConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.project.id.as_deref(), Some("prod-eu"));
        assert_eq!(config.rollout.min_ready_sec, Some(90));
        assert_eq!(
            config.snapshot.dir.as_deref(),
            Some(Path::new("/var/backups/derby"))
        );
    }

    #[test]
    fn test_parse_empty() {
        let config: DerbyConfig = toml::from_str("").unwrap();
        assert_eq!(config, DerbyConfig::default());
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(DerbyConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("derby.toml");
        let mut config = DerbyConfig::default();
        config.rollout.group = Some("api".to_string());
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = DerbyConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.rollout.group.as_deref(), Some("api"));
    }
}
