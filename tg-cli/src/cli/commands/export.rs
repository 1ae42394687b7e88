//! `tg export`

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::Local;
use clap::Args;
use colored::*;
use serde_json::{Map, Value};

use crate::api::LiveSnapshot;
use crate::cli::{connect, default_output_path};
use crate::excel::XlsxCodec;
use crate::import::{EntityType, RemoteStore, Sheet, TableCodec, TableDocument, columns};

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// File to write (default: `<account>-<timestamp>.xlsx`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn handle_export_command(args: ExportArgs, account_flag: Option<&str>) -> Result<ExitCode> {
    let (credentials, client) = connect(account_flag)?;
    let output = args
        .output
        .unwrap_or_else(|| default_output_path(&credentials.account, None, Local::now()));

    let snapshot = client.fetch_all(&EntityType::ALL).await?;
    let document = build_export_document(&snapshot);
    XlsxCodec.write(&document, &output)?;

    println!(
        "Exported {} remote network(s) and {} resource(s) to {}",
        snapshot.remote_networks.len(),
        snapshot.resources.len(),
        output.display().to_string().cyan()
    );
    Ok(ExitCode::SUCCESS)
}

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

/// Build an importable workbook from live state. Networks and resources keep API order.
pub fn build_export_document(snapshot: &LiveSnapshot) -> TableDocument {
    let network_names: HashMap<&str, &str> = snapshot
        .remote_networks
        .iter()
        .map(|n| (n.id.as_str(), n.name.as_str()))
        .collect();
    let resource_names: HashMap<&str, &str> = snapshot
        .resources
        .iter()
        .map(|r| (r.id.as_str(), r.name.as_str()))
        .collect();

    let mut networks = Sheet::new(
        EntityType::RemoteNetwork.sheet_name(),
        vec![
            columns::ID.to_string(),
            columns::NAME.to_string(),
            columns::RESOURCES_LABELS.to_string(),
        ],
    );
    for network in &snapshot.remote_networks {
        let labels: Vec<&str> = network
            .resource_ids
            .iter()
            .filter_map(|id| resource_names.get(id.as_str()).copied())
            .collect();

        let mut row = Map::new();
        row.insert(columns::ID.to_string(), text(&network.id));
        row.insert(columns::NAME.to_string(), text(&network.name));
        if !labels.is_empty() {
            row.insert(columns::RESOURCES_LABELS.to_string(), text(&labels.join(", ")));
        }
        networks.push_row(row);
    }

    let mut resources = Sheet::new(
        EntityType::Resource.sheet_name(),
        vec![
            columns::ID.to_string(),
            columns::NAME.to_string(),
            columns::ADDRESS.to_string(),
            columns::ALIAS.to_string(),
            columns::REMOTE_NETWORK_LABEL.to_string(),
        ],
    );
    for resource in &snapshot.resources {
        let mut row = Map::new();
        row.insert(columns::ID.to_string(), text(&resource.id));
        row.insert(columns::NAME.to_string(), text(&resource.name));
        if let Some(address) = &resource.address {
            row.insert(columns::ADDRESS.to_string(), text(address));
        }
        if let Some(alias) = &resource.alias {
            row.insert(columns::ALIAS.to_string(), text(alias));
        }
        match network_names.get(resource.remote_network_id.as_str()) {
            Some(name) => {
                row.insert(columns::REMOTE_NETWORK_LABEL.to_string(), text(name));
            }
            None => log::warn!(
                "Resource '{}' belongs to unknown Remote Network '{}'",
                resource.name,
                resource.remote_network_id
            ),
        }
        resources.push_row(row);
    }

    let mut document = TableDocument::new();
    document.push(networks);
    document.push(resources);
    document
}
