// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folioscan: scan an online e-book reader into a PDF.
//
// Entry point. Initialises logging, resolves configuration, launches the
// browser bridge and runs one scan session.

mod cli;
mod viewer;

use std::process::ExitCode;

use clap::Parser;
use folioscan_bridge::ChromiumReader;
use folioscan_core::error::Result;
use folioscan_core::human_errors::humanize_error;
use folioscan_scan::{ScanOutcome, scan_to_pdf};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(url = %cli.url, "Folioscan starting");

    match run(&cli).await {
        Ok(outcome) => {
            println!(
                "Saved {} pages to {}",
                outcome.page_count,
                outcome.output_path.display()
            );
            if let Some(manifest) = &outcome.manifest_path {
                println!("Captures kept; manifest at {}", manifest.display());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Scan failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<ScanOutcome> {
    let config = cli.resolve_config()?;

    let mut reader = ChromiumReader::launch(config.browser.clone()).await?;
    let scanned = scan_to_pdf(&mut reader, &config, &cli.url).await;
    if let Err(err) = reader.close().await {
        tracing::warn!(error = %err, "Browser did not shut down cleanly");
    }
    let outcome = scanned?;

    if config.open_output {
        if let Err(err) = viewer::open_with_system_viewer(&outcome.output_path) {
            tracing::warn!(error = %err, "Could not open the PDF");
        }
    }
    Ok(outcome)
}
