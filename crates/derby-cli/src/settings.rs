//! Resolved invocation settings.
//!
//! Precedence: command-line flag, then environment variable (both via clap),
//! then derby.toml, then built-in default.

use std::path::{Path, PathBuf};

use anyhow::Context;
use derby_compute::{ComputeRestClient, DEFAULT_ENDPOINT};
use derby_core::{BuildInfo, DerbyConfig, RolloutRequest};
use tracing::info;

use crate::{GlobalArgs, RolloutArgs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub project: String,
    pub endpoint: String,
    pub access_token: Option<String>,
    pub credentials: Option<PathBuf>,
    pub config: DerbyConfig,
}

impl Settings {
    pub fn resolve(global: &GlobalArgs) -> anyhow::Result<Self> {
        let config = DerbyConfig::load(global.config.as_deref()).context("failed to load config")?;
        Ok(Self::from_parts(global, config))
    }

    fn from_parts(global: &GlobalArgs, config: DerbyConfig) -> Self {
        let project = global
            .project
            .clone()
            .or_else(|| config.project.id.clone())
            .unwrap_or_default();
        let endpoint = global
            .endpoint
            .clone()
            .or_else(|| config.api.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self {
            project,
            endpoint,
            access_token: global.access_token.clone(),
            credentials: global.credentials.clone(),
            config,
        }
    }

    /// Snapshot directory: flag, then config, then the working directory.
    pub fn snapshot_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.config.snapshot.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn rollout_request(&self, args: &RolloutArgs) -> RolloutRequest {
        let rollout = &self.config.rollout;
        let zone = args.zone.clone().or_else(|| rollout.zone.clone()).unwrap_or_default();
        let group = args.group.clone().or_else(|| rollout.group.clone()).unwrap_or_default();
        let min_ready_sec = args.min_ready_sec.or(rollout.min_ready_sec).unwrap_or(0);
        RolloutRequest::new(&self.project, &zone, &group, min_ready_sec)
    }

    pub fn client(&self) -> anyhow::Result<ComputeRestClient> {
        ComputeRestClient::new(&self.endpoint, self.access_token.as_deref())
            .context("failed to build compute client")
    }

    /// Report what this invocation is about to act on.
    pub fn log_target(&self, build: &BuildInfo) {
        let auth = match &self.credentials {
            Some(path) => path.display().to_string(),
            None => "<default credentials>".to_string(),
        };
        info!(
            version = %build.version,
            source = %build.source,
            %auth,
            project = %self.project,
            endpoint = %self.endpoint,
            "target"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(project: Option<&str>) -> GlobalArgs {
        GlobalArgs {
            project: project.map(str::to_string),
            config: None,
            endpoint: None,
            access_token: None,
            credentials: None,
        }
    }

    fn config() -> DerbyConfig {
        toml::from_str(
            r#"
[project]
id = "from-config"

[rollout]
zone = "europe-west1-b"
group = "web"
min_ready_sec = 60

[snapshot]
dir = "/var/backups/derby"
"#,
        )
        .unwrap()
    }

    #[test]
    fn flag_beats_config() {
        let settings = Settings::from_parts(&global(Some("from-flag")), config());
        assert_eq!(settings.project, "from-flag");
    }

    #[test]
    fn config_fills_missing_flags() {
        let settings = Settings::from_parts(&global(None), config());
        assert_eq!(settings.project, "from-config");
        assert_eq!(settings.endpoint, DEFAULT_ENDPOINT);

        let request = settings.rollout_request(&RolloutArgs {
            zone: None,
            group: Some("api".to_string()),
            min_ready_sec: None,
        });
        assert_eq!(request, RolloutRequest::new("from-config", "europe-west1-b", "api", 60));
    }

    #[test]
    fn snapshot_dir_precedence() {
        let settings = Settings::from_parts(&global(None), config());
        assert_eq!(settings.snapshot_dir(Some(Path::new("/tmp/x"))), PathBuf::from("/tmp/x"));
        assert_eq!(settings.snapshot_dir(None), PathBuf::from("/var/backups/derby"));

        let bare = Settings::from_parts(&global(None), DerbyConfig::default());
        assert_eq!(bare.snapshot_dir(None), PathBuf::from("."));
    }

    #[test]
    fn nothing_configured_leaves_blanks_for_validation() {
        let settings = Settings::from_parts(&global(None), DerbyConfig::default());
        let request = settings.rollout_request(&RolloutArgs {
            zone: None,
            group: None,
            min_ready_sec: None,
        });
        assert!(request.validate().is_err());
        assert_eq!(request.min_ready_sec, 0);
    }

    #[test]
    fn resolve_reads_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("derby.toml");
        std::fs::write(&path, "[project]\nid = \"from-file\"\n").unwrap();

        let mut args = global(None);
        args.config = Some(path);
        let settings = Settings::resolve(&args).unwrap();
        assert_eq!(settings.project, "from-file");
    }
}
