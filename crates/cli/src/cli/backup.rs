use clap::Parser;
use comfy_table::{Cell, Color, Table};
use eyre::{Result, WrapErr};
use nihao_primitives::account::PublicKey;
use nihao_relay::backup::{backup, Backup};
use serde::Serialize;
use tokio::time::timeout;

use crate::cli::Environment;
use crate::output::Report;

#[derive(Clone, Copy, Debug, Parser)]
#[command(about = "Export the identity documents of an account")]
pub struct BackupCommand {
    /// Account public key, hex encoded
    #[arg(value_name = "ACCOUNT")]
    pub account: PublicKey,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct BackupResponse(Backup);

impl Report for BackupResponse {
    fn report(&self) {
        let mut table = Table::new();
        let _ignored = table.set_header(vec![
            Cell::new("Kind").fg(Color::Blue),
            Cell::new("Label").fg(Color::Blue),
            Cell::new("Created at").fg(Color::Blue),
            Cell::new("Source").fg(Color::Blue),
        ]);

        for entry in &self.0.events {
            let _ignored = table.add_row(vec![
                entry.kind.to_string(),
                entry.kind_label.clone(),
                entry.event.created_at.to_string(),
                entry.source.to_string(),
            ]);
        }

        println!("{table}");
        println!(
            "{} event(s) backed up from {} relay(s) at {}",
            self.0.events.len(),
            self.0.meta.relays_queried.len(),
            self.0.meta.created_at
        );
    }
}

impl BackupCommand {
    pub async fn run(self, environment: &Environment) -> Result<()> {
        let timeouts = environment.config.timeouts;
        let mut pool = environment.connect(&[]).await?;

        let result = timeout(
            timeouts.run(),
            backup(&mut pool, self.account, timeouts.resolve()),
        )
        .await;

        pool.close_all().await;

        let backup = result.wrap_err("backup did not finish in time")?;

        environment.output.write(&BackupResponse(backup));

        Ok(())
    }
}
