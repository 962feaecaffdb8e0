#![warn(unused_extern_crates)]
#![deny(unused_crate_dependencies)]

use std::env::var;
use std::io::stderr;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod output;

use cli::RootCommand;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = setup() {
        eprintln!("Failed to initialise: {err}");
        return ExitCode::FAILURE;
    }

    let command = RootCommand::parse();

    match command.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => err.into(),
    }
}

fn setup() -> eyre::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::builder().parse(format!(
            "warn,nihao=info,{}",
            var("RUST_LOG").unwrap_or_default()
        ))?)
        .with(fmt::layer().with_writer(stderr))
        .init();

    color_eyre::install()
}
