use clap::Parser;
use eyre::Result;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityRecord;
use nihao_relay::Prober;
use serde::Serialize;

use crate::cli::Environment;
use crate::output::{relay_table, Report};

#[derive(Debug, Parser)]
#[command(about = "Probe and score relays")]
pub struct ScoreCommand {
    /// Relays to score, the configured defaults when omitted
    #[arg(value_name = "RELAY")]
    pub relays: Vec<PeerAddress>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub relays: Vec<CapabilityRecord>,
}

impl Report for ScoreResponse {
    fn report(&self) {
        println!("{}", relay_table(&self.relays));
    }
}

impl ScoreCommand {
    pub async fn run(self, environment: &Environment) -> Result<()> {
        let relays = if self.relays.is_empty() {
            environment.config.default_relays.clone()
        } else {
            self.relays
        };

        let records = Prober::new(&environment.config).score_all(&relays).await;

        environment.output.write(&ScoreResponse { relays: records });

        Ok(())
    }
}
