//! electiond — runs one election over newline-delimited JSON on stdin/stdout.

use clap::Parser;
use election_core::Identity;
use election_host::{init_logging, serve, ElectionHost, HostConfig, LogFormat};
use election_storage::{FileStorage, InMemoryStorage, Storage};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "electiond", about = "Single-election voting registry")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "ELECTION_CONFIG")]
    config: Option<PathBuf>,

    /// Identity that administers the election.
    #[arg(long, env = "ELECTION_ADMIN")]
    admin: Option<String>,

    /// Data directory for election state. In-memory when neither this nor the config sets one.
    #[arg(long, env = "ELECTION_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "ELECTION_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format.
    #[arg(long, value_enum, env = "ELECTION_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<HostConfig> {
        let mut config = match &self.config {
            Some(path) => HostConfig::from_toml_file(path)?,
            None => HostConfig::default(),
        };

        if let Some(admin) = self.admin {
            config.administrator = Identity::new(admin);
        }
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;
    init_logging(config.log_format, &config.log_level);

    let storage: Box<dyn Storage + Send> = match &config.data_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using file storage");
            Box::new(FileStorage::new(dir)?)
        }
        None => {
            tracing::info!("using in-memory storage, state is lost on exit");
            Box::new(InMemoryStorage::new())
        }
    };

    let host = ElectionHost::open_or_create(config.administrator.clone(), storage)?;
    tracing::info!(owner = %host.owner(), voting_active = host.voting_active(), "election ready");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let handled = serve(&host, stdin.lock(), stdout.lock())?;

    tracing::info!(handled, "input closed, shutting down");
    Ok(())
}
