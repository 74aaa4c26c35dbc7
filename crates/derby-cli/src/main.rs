use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use derby_core::BuildInfo;
use tracing::error;

mod commands;
mod settings;

use settings::Settings;

#[derive(Parser)]
#[command(
    name = "derby",
    about = "rollerderby: project metadata sync and rolling instance replacement",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Cloud project ID
    #[arg(long, global = true, env = "GOOGLE_PROJECT_ID")]
    pub project: Option<String>,
    /// Config file (default: ./derby.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Compute API base URL
    #[arg(long, global = true, env = "DERBY_API_ENDPOINT")]
    pub endpoint: Option<String>,
    /// OAuth2 bearer token for the compute API
    #[arg(long, global = true, env = "DERBY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,
    /// Service account credentials in use (reported only)
    #[arg(long, global = true, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct RolloutArgs {
    /// Zone of the managed instance group
    #[arg(long)]
    pub zone: Option<String>,
    /// Managed instance group name
    #[arg(long)]
    pub group: Option<String>,
    /// Seconds an instance must stay healthy before the next one is replaced
    #[arg(long)]
    pub min_ready_sec: Option<u32>,
}

#[derive(Args)]
pub(crate) struct KeyArgs {
    /// Metadata key to update
    #[arg(long, default_value = "")]
    pub key: String,
    /// Metadata value to set
    #[arg(long, default_value = "")]
    pub value: String,
    /// Directory for the pre-update metadata snapshot
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Set one common metadata key, snapshotting the current metadata first
    SetKey(KeyArgs),
    /// Roll a managed instance group onto a new version of its template
    Replace(RolloutArgs),
    /// Set a metadata key, then roll the group
    Deploy {
        #[command(flatten)]
        key: KeyArgs,
        #[command(flatten)]
        rollout: RolloutArgs,
    },
    /// List the project's common metadata
    ListKeys {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// List managed instance groups and their instances
    ListGroups {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Compare the project's metadata with another project's
    Compare {
        /// Project to compare against
        #[arg(long, default_value = "")]
        other: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Print version and source revision
    Version,
}

fn build_info() -> BuildInfo {
    BuildInfo::new(
        env!("CARGO_PKG_VERSION"),
        option_env!("DERBY_BUILD_SOURCE").unwrap_or("unknown"),
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let build = build_info();
    if let Commands::Version = cli.command {
        commands::print_version(&build);
        return Ok(());
    }

    let settings = Settings::resolve(&cli.global)?;
    settings.log_target(&build);

    match cli.command {
        Commands::SetKey(key) => commands::metadata::set_key(&settings, &key),
        Commands::Replace(rollout) => commands::rollout::replace(&settings, &rollout),
        Commands::Deploy { key, rollout } => {
            commands::metadata::set_key(&settings, &key)?;
            commands::rollout::replace(&settings, &rollout)
        }
        Commands::ListKeys { format } => commands::metadata::list_keys(&settings, &format),
        Commands::ListGroups { format } => commands::rollout::list_groups(&settings, &format),
        Commands::Compare { other, format } => {
            commands::metadata::compare(&settings, &other, &format)
        }
        Commands::Version => Ok(()),
    }
}
