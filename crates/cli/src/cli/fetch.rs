use clap::Parser;
use eyre::Result;
use nihao_primitives::account::PublicKey;
use nihao_primitives::address::PeerAddress;
use nihao_primitives::event::{Event, Kind, Sourced};
use serde::Serialize;

use crate::cli::Environment;
use crate::output::Report;

#[derive(Debug, Parser)]
#[command(about = "Fetch the newest document of a kind for an account")]
pub struct FetchCommand {
    /// Account public key, hex encoded
    #[arg(value_name = "ACCOUNT")]
    pub account: PublicKey,

    /// Event kind to resolve
    #[arg(long, value_name = "KIND")]
    pub kind: u16,

    /// Relay to query, repeatable; the configured defaults when omitted
    #[arg(long = "relay", value_name = "RELAY")]
    pub relays: Vec<PeerAddress>,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub kind: Kind,
    pub found: Option<Sourced<Event>>,
}

impl Report for FetchResponse {
    fn report(&self) {
        let Some(found) = &self.found else {
            println!("No kind {} document found", self.kind);
            return;
        };

        println!("kind {} ({}) from {}", self.kind, self.kind.label(), found.source);
        match serde_json::to_string_pretty(&found.value) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("Failed to serialize event: {err}"),
        }
    }
}

impl FetchCommand {
    pub async fn run(self, environment: &Environment) -> Result<()> {
        let kind = Kind(self.kind);
        let mut pool = environment.connect(&self.relays).await?;

        let found = pool
            .resolve(self.account, kind, environment.config.timeouts.resolve())
            .await;

        pool.close_all().await;

        environment.output.write(&FetchResponse { kind, found });

        Ok(())
    }
}
