//! `tg network`

use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;

use crate::api::LiveSnapshot;
use crate::cli::connect;
use crate::console::render_table;
use crate::import::{EntityType, RemoteStore};

#[derive(Subcommand, Debug)]
pub enum NetworkCommands {
    /// List Remote Networks
    List,

    /// Create a Remote Network
    Create {
        /// Name of the new Remote Network
        name: String,
    },
}

pub async fn handle_network_command(cmd: NetworkCommands, account_flag: Option<&str>) -> Result<ExitCode> {
    let (_, client) = connect(account_flag)?;

    match cmd {
        NetworkCommands::List => {
            let snapshot = client.fetch_all(&EntityType::ALL).await?;
            print!("{}", render_table(&["ID", "NAME", "RESOURCES"], &network_rows(&snapshot)));
        }
        NetworkCommands::Create { name } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("Remote Network name must not be empty");
            }
            let existing = client.remote_networks().await?;
            if let Some(network) = existing.iter().find(|n| n.name == name) {
                bail!("Remote Network '{}' already exists with id '{}'", name, network.id);
            }

            let id = client.create_remote_network(name).await?;
            println!("{} Created Remote Network '{}' with id '{}'", "✓".green(), name, id);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Table rows sorted by name: id, name, resource count
pub fn network_rows(snapshot: &LiveSnapshot) -> Vec<Vec<String>> {
    let mut networks: Vec<_> = snapshot.remote_networks.iter().collect();
    networks.sort_by(|a, b| a.name.cmp(&b.name));
    networks
        .into_iter()
        .map(|n| vec![n.id.clone(), n.name.clone(), n.resource_ids.len().to_string()])
        .collect()
}
