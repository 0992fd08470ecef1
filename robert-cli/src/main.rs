// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! ROBERT Keytool
//!
//! Operator command line for the crypto server keystore: provisioning,
//! inspection and bundle diagnostics.

mod commands;
mod config;
mod display;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use robert_core::api::{ENV_KEYSTORE_DIR, ENV_KEYSTORE_PIN, ENV_SERVICE_START_DATE};

use config::CliConfig;

#[derive(Parser)]
#[command(name = "robert-keytool")]
#[command(version, about = "Keystore tooling for the ROBERT crypto server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Keystore directory
    #[arg(long, global = true, env = ENV_KEYSTORE_DIR, default_value = "./keystore")]
    keystore_dir: PathBuf,

    /// Keystore PIN
    #[arg(long, global = true, env = ENV_KEYSTORE_PIN, hide_env_values = true)]
    pin: Option<String>,

    /// First day of epoch 0
    #[arg(long, global = true, env = ENV_SERVICE_START_DATE, default_value = "2020-06-01")]
    start_date: NaiveDate,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a keystore with global keys and daily server keys
    Init {
        /// First day to provision (default: today, UTC)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Number of daily server keys
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// Add daily server keys, keeping existing ones
    AddServerKeys {
        /// First day to provision (default: today, UTC)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Number of daily server keys
        #[arg(long, default_value_t = 7)]
        days: u32,
    },

    /// List keystore aliases
    List,

    /// Load every key and report cached aliases and gaps
    Status,

    /// Decrypt a tuples bundle and print its tuples
    Bundle {
        /// Tuples key of the application, base64
        #[arg(long)]
        tuples_key: String,

        /// Encrypted bundle, base64
        data: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig {
        keystore_dir: cli.keystore_dir,
        pin: cli.pin,
        start_date: cli.start_date,
    };

    match cli.command {
        Commands::Init { from, days } => commands::init::run(&config, from, days),
        Commands::AddServerKeys { from, days } => {
            commands::keys::add_server_keys(&config, from, days)
        }
        Commands::List => commands::keys::list(&config),
        Commands::Status => commands::keys::status(&config),
        Commands::Bundle {
            tuples_key,
            data,
            json,
        } => commands::bundle::run(&config, &tuples_key, &data, json),
    }
}

fn main() {
    init_logging();

    if let Err(e) = run(Cli::parse()) {
        display::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
