use clap::Parser;
use eyre::Result;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::capability::CapabilityRecord;
use nihao_relay::{Discovery, Prober, Selector, WsConnector};
use serde::Serialize;
use tracing::info;

use crate::cli::Environment;
use crate::output::{relay_table, Report};

#[derive(Clone, Copy, Debug, Parser)]
#[command(about = "Discover popular relays and select a working set")]
pub struct DiscoverCommand {
    /// Upper bound on the selected set, the fallback outbox aside
    #[arg(long, value_name = "N")]
    pub max: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub candidates: Vec<CapabilityRecord>,
    pub selected: Vec<PeerAddress>,
}

impl Report for DiscoverResponse {
    fn report(&self) {
        if self.candidates.is_empty() {
            println!("No relays discovered");
        } else {
            println!("{}", relay_table(&self.candidates));
        }

        println!("\nSelected relays:");
        for address in &self.selected {
            println!("  {address}");
        }
    }
}

impl DiscoverCommand {
    pub async fn run(self, environment: &Environment) -> Result<()> {
        let config = &environment.config;

        let discovery = Discovery::new(
            WsConnector::new(config.timeouts.probe()),
            Prober::new(config),
            &config.discovery,
        );

        let candidates = discovery.discover(&config.discovery.seeds).await;
        let max = self.max.unwrap_or(config.max_relays);
        let selected = Selector::new(config).select(&candidates, max);

        info!(candidates = candidates.len(), selected = selected.len(), "Discovery finished");

        environment.output.write(&DiscoverResponse {
            candidates,
            selected,
        });

        Ok(())
    }
}
