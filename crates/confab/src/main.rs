// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confab - a credit-metered conversational Telegram assistant.
//!
//! This is the binary entry point for the Confab agent.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;

use clap::{Parser, Subcommand};

/// Confab - a credit-metered conversational Telegram assistant.
#[derive(Parser, Debug)]
#[command(name = "confab", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Confab agent.
    Serve,
    /// Run diagnostic checks against the Confab environment.
    Doctor {
        /// Run additional intensive checks.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Show the effective configuration.
    Config {
        /// Print the config file search paths instead of the config itself.
        #[arg(long)]
        show_path: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match confab_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            confab_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run(config).await,
        Some(Commands::Doctor { deep, plain }) => doctor::run_doctor(&config, deep, plain).await,
        Some(Commands::Config { show_path }) => {
            show_config(&config, show_path);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Prints the effective configuration, or the paths it is assembled from.
fn show_config(config: &confab_config::model::ConfabConfig, show_path: bool) {
    if show_path {
        println!("/etc/confab/confab.toml");
        if let Some(dir) = dirs::config_dir() {
            println!("{}", dir.join("confab/confab.toml").display());
        }
        println!("./confab.toml");
        return;
    }

    match toml::to_string_pretty(config) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => eprintln!("error: failed to render config: {e}"),
    }
}
