use clap::Parser;
use comfy_table::{Cell, Color, Table};
use eyre::{Result, WrapErr};
use nihao_primitives::account::PublicKey;
use nihao_relay::check::{check_relays, CheckReport, CheckStatus};
use nihao_relay::Prober;
use serde::Serialize;
use tokio::time::timeout;

use crate::cli::Environment;
use crate::output::{relay_table, Report};

#[derive(Clone, Copy, Debug, Parser)]
#[command(about = "Check the relay configuration an account publishes")]
pub struct CheckCommand {
    /// Account public key, hex encoded
    #[arg(value_name = "ACCOUNT")]
    pub account: PublicKey,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct CheckResponse(CheckReport);

const fn status_color(status: CheckStatus) -> Color {
    match status {
        CheckStatus::Pass => Color::Green,
        CheckStatus::Warn => Color::Yellow,
        CheckStatus::Fail => Color::Red,
    }
}

impl Report for CheckResponse {
    fn report(&self) {
        let mut table = Table::new();
        let _ignored = table.set_header(vec![
            Cell::new("Check").fg(Color::Blue),
            Cell::new("Status").fg(Color::Blue),
            Cell::new("Detail").fg(Color::Blue),
        ]);

        for item in &self.0.checks {
            let _ignored = table.add_row(vec![
                Cell::new(item.name),
                Cell::new(item.status).fg(status_color(item.status)),
                Cell::new(&item.detail),
            ]);
        }

        println!("{table}");

        if !self.0.relays.is_empty() {
            println!("{}", relay_table(&self.0.relays));
        }
    }
}

impl CheckCommand {
    pub async fn run(self, environment: &Environment) -> Result<()> {
        let config = &environment.config;
        let prober = Prober::new(config);
        let mut pool = environment.connect(&[]).await?;

        let result = timeout(
            config.timeouts.run(),
            check_relays(&mut pool, self.account, &prober, config.timeouts.resolve()),
        )
        .await;

        pool.close_all().await;

        let report = result.wrap_err("check did not finish in time")?;

        environment.output.write(&CheckResponse(report));

        Ok(())
    }
}
