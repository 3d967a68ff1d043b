// SPDX-FileCopyrightText: 2026 Relaio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Relaio - relays conversations between web visitors, an admin panel,
//! and a Telegram bot.
//!
//! This is the binary entry point.

mod serve;

use clap::{Parser, Subcommand};

/// Relaio - web chat to Telegram message relay.
#[derive(Parser, Debug)]
#[command(name = "relaio", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay server.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match relaio_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            relaio_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("relaio: fatal: {e}");
                std::process::exit(1);
            }
        }
    }
}
