//! tg - Twingate import/export CLI
//!
//! Reconciles Remote Networks and Resources described in an Excel workbook
//! against a Twingate account, creating only what is missing.

use std::process::ExitCode;

use clap::Parser;
use colored::*;

mod api;
mod cli;
mod config;
mod console;
mod excel;
mod import;

use cli::Cli;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}
