//! Command line interface

pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};

use crate::api::TwingateClient;
use crate::config::{self, Config, Credentials};
use commands::export::ExportArgs;
use commands::import::ImportArgs;
use commands::network::NetworkCommands;
use commands::resource::ResourceCommands;

/// Import and export Twingate Remote Networks and Resources
#[derive(Parser, Debug)]
#[command(name = "tg", version, about, long_about = None)]
pub struct Cli {
    /// Twingate account name, e.g. `acme` for acme.twingate.com
    #[arg(short = 'a', long, global = true)]
    pub account_name: Option<String>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create missing Remote Networks and Resources from an Excel file
    Import(ImportArgs),

    /// Export Remote Networks and Resources to an Excel file
    Export(ExportArgs),

    /// Manage Remote Networks
    #[command(subcommand)]
    Network(NetworkCommands),

    /// Manage Resources
    #[command(subcommand)]
    Resource(ResourceCommands),
}

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let account = cli.account_name.as_deref();
    match cli.command {
        Commands::Import(args) => commands::import::handle_import_command(args, account).await,
        Commands::Export(args) => commands::export::handle_export_command(args, account).await,
        Commands::Network(cmd) => commands::network::handle_network_command(cmd, account).await,
        Commands::Resource(cmd) => commands::resource::handle_resource_command(cmd, account).await,
    }
}

/// Resolve credentials and build a client for the account
pub fn connect(account_flag: Option<&str>) -> Result<(Credentials, TwingateClient)> {
    let config = Config::load()?;
    let credentials = config::resolve_credentials(account_flag, &config)?;
    let client = TwingateClient::new(
        &credentials.account,
        credentials.api_key.clone(),
        config.client_config(),
    )?;
    log::info!("Connecting to {}", client.endpoint());
    Ok((credentials, client))
}

/// `{account}-{timestamp}.xlsx`, or `{account}-{kind}-{timestamp}.xlsx` with a kind
pub fn default_output_path(account: &str, kind: Option<&str>, now: DateTime<Local>) -> PathBuf {
    let timestamp = now.format("%Y-%m-%d_%H-%M-%S");
    match kind {
        Some(kind) => PathBuf::from(format!("{}-{}-{}.xlsx", account, kind, timestamp)),
        None => PathBuf::from(format!("{}-{}.xlsx", account, timestamp)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::import::EntityType;

    #[test]
    fn test_default_output_path() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(
            default_output_path("acme", None, now),
            PathBuf::from("acme-2024-03-09_14-05-07.xlsx")
        );
        assert_eq!(
            default_output_path("acme", Some("import"), now),
            PathBuf::from("acme-import-2024-03-09_14-05-07.xlsx")
        );
    }

    #[test]
    fn test_parse_import_with_global_flags() {
        let cli = Cli::try_parse_from([
            "tg", "import", "-a", "acme", "--file", "in.xlsx", "-n", "--dry-run", "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.account_name.as_deref(), Some("acme"));
        assert!(cli.no_color);
        match cli.command {
            Commands::Import(args) => {
                assert_eq!(args.file, PathBuf::from("in.xlsx"));
                assert!(args.dry_run);
                assert!(!args.yes);
                assert_eq!(args.entity_types(), vec![EntityType::RemoteNetwork]);
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_import_defaults_to_all_types() {
        let cli = Cli::try_parse_from(["tg", "import", "-f", "in.xlsx", "-y"]).unwrap();
        match cli.command {
            Commands::Import(args) => {
                assert!(args.yes);
                assert_eq!(args.output, None);
                assert_eq!(
                    args.entity_types(),
                    vec![EntityType::RemoteNetwork, EntityType::Resource]
                );
            }
            other => panic!("expected import, got {:?}", other),
        }
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(["tg", "import"]).is_err());
    }

    #[test]
    fn test_parse_network_create() {
        let cli = Cli::try_parse_from(["tg", "-v", "network", "create", "Office"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Network(NetworkCommands::Create { ref name }) if name == "Office"
        ));
    }

    #[test]
    fn test_parse_export_output() {
        let cli = Cli::try_parse_from(["tg", "export", "-o", "out.xlsx"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Export(ref args) if args.output == Some(PathBuf::from("out.xlsx"))
        ));
    }
}
