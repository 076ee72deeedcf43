// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Polarity: light/dark page inversion for fixed-layout PDF books
//
// Entry point. Parses arguments, initialises logging, runs the selected
// pipeline, and reports failures on stderr with a non-zero exit status.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use polarity_core::error::Result;
use polarity_core::hints::hint_for;
use polarity_pipeline::RunReport;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialise tracing (RUST_LOG wins over -v/-q)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli).await {
        Ok(report) => {
            tracing::info!("{report}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(hint) = hint_for(&err) {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<RunReport> {
    let config = cli.resolve_config()?;
    tracing::debug!(?config, "Configuration resolved");
    polarity_pipeline::run(
        &config,
        cli.strategy.into(),
        cli.mode(),
        &cli.input,
        &cli.output,
    )
    .await
}
