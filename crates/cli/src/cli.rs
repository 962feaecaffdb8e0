use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use comfy_table::{Cell, Color, Table};
use eyre::{bail, Report as EyreReport, Result};
use nihao_primitives::address::PeerAddress;
use nihao_relay::{RelayConfig, RelayPool, RelaySession, WsConnector};
use serde::{Serialize, Serializer};
use thiserror::Error as ThisError;

use crate::output::{Format, Output, Report};

mod backup;
mod check;
mod discover;
mod fetch;
mod score;

use backup::BackupCommand;
use check::CheckCommand;
use discover::DiscoverCommand;
use fetch::FetchCommand;
use score::ScoreCommand;

pub const EXAMPLES: &str = r"
  # Find popular relays and pick a working set
  $ nihao discover --max 5

  # Export identity documents of an account
  $ nihao --output-format json backup 3bf0c63fcb93463407af97a5e5ee64fa883d107ef9e558472c4eb9aaaefa459d
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = format!(
    "Environment variables:\n  \
       NIHAO_SEED_RELAYS, NIHAO_DEFAULT_RELAYS, NIHAO_PROBE_TIMEOUT_SECS,\n  \
       NIHAO_DISCOVERY_DEADLINE_SECS, NIHAO_MAX_RELAYS\n\nExamples:{EXAMPLES}"
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Discover(DiscoverCommand),
    Score(ScoreCommand),
    Fetch(FetchCommand),
    Backup(BackupCommand),
    Check(CheckCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// TOML file overriding the built-in relay tables and timeouts
    #[arg(long, value_name = "PATH")]
    #[arg(env = "NIHAO_CONFIG", hide_env_values = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "FORMAT", default_value_t, value_enum)]
    pub output_format: Format,
}

#[derive(Debug)]
pub struct Environment {
    pub output: Output,
    pub config: RelayConfig,
}

impl Environment {
    pub const fn new(output: Output, config: RelayConfig) -> Self {
        Self { output, config }
    }

    /// Open one session per relay, falling back to the configured defaults.
    pub async fn connect(&self, relays: &[PeerAddress]) -> Result<RelayPool<RelaySession>> {
        let relays: &[PeerAddress] = if relays.is_empty() {
            &self.config.default_relays
        } else {
            relays
        };

        let connector = WsConnector::new(self.config.timeouts.probe());
        let pool = RelayPool::connect_all(&connector, relays).await;

        if pool.is_empty() {
            bail!("could not connect to any relay");
        }

        Ok(pool)
    }
}

impl RootCommand {
    pub async fn run(self) -> Result<(), CliError> {
        let output = Output::new(self.args.output_format);

        let config = match load_config(&self.args) {
            Ok(config) => config,
            Err(err) => {
                let err = CliError::Other(err);
                output.write(&err);
                return Err(err);
            }
        };

        let environment = Environment::new(output, config);

        let result = match self.action {
            SubCommands::Discover(discover) => discover.run(&environment).await,
            SubCommands::Score(score) => score.run(&environment).await,
            SubCommands::Fetch(fetch) => fetch.run(&environment).await,
            SubCommands::Backup(backup) => backup.run(&environment).await,
            SubCommands::Check(check) => check.run(&environment).await,
        };

        if let Err(err) = result {
            let err = CliError::Other(err);
            environment.output.write(&err);
            return Err(err);
        }

        Ok(())
    }
}

fn load_config(args: &RootArgs) -> Result<RelayConfig> {
    let config = match &args.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::default(),
    };

    Ok(config.apply_env()?)
}

#[derive(Debug, Serialize, ThisError)]
pub enum CliError {
    #[error(transparent)]
    Other(
        #[from]
        #[serde(serialize_with = "serialize_eyre_report")]
        EyreReport,
    ),
}

impl From<CliError> for ExitCode {
    fn from(error: CliError) -> Self {
        match error {
            CliError::Other(_) => Self::FAILURE,
        }
    }
}

impl Report for CliError {
    fn report(&self) {
        let mut table = Table::new();
        let _ignored = table.set_header(vec![Cell::new("ERROR").fg(Color::Red)]);
        let _ignored = table.add_row(vec![match self {
            Self::Other(err) => format!("Error: {err:?}"),
        }]);
        eprintln!("{table}");
    }
}

fn serialize_eyre_report<S>(report: &EyreReport, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(report.chain().map(ToString::to_string))
}
