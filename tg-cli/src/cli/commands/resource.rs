//! `tg resource`

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;

use crate::api::LiveSnapshot;
use crate::cli::connect;
use crate::console::render_table;
use crate::import::{EntityType, RemoteStore};

#[derive(Subcommand, Debug)]
pub enum ResourceCommands {
    /// List Resources with their Remote Network
    List,
}

pub async fn handle_resource_command(cmd: ResourceCommands, account_flag: Option<&str>) -> Result<ExitCode> {
    let (_, client) = connect(account_flag)?;

    match cmd {
        ResourceCommands::List => {
            let snapshot = client.fetch_all(&EntityType::ALL).await?;
            print!(
                "{}",
                render_table(
                    &["ID", "NAME", "ADDRESS", "ALIAS", "REMOTE NETWORK"],
                    &resource_rows(&snapshot)
                )
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Table rows sorted by name, then network name
pub fn resource_rows(snapshot: &LiveSnapshot) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = snapshot
        .resources
        .iter()
        .map(|r| {
            let network = snapshot
                .remote_network(&r.remote_network_id)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| r.remote_network_id.clone());
            vec![
                r.id.clone(),
                r.name.clone(),
                r.address.clone().unwrap_or_default(),
                r.alias.clone().unwrap_or_default(),
                network,
            ]
        })
        .collect();
    rows.sort_by(|a, b| a[1].cmp(&b[1]).then_with(|| a[4].cmp(&b[4])));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::testing::MemoryStore;

    #[test]
    fn test_resource_rows_show_network_name() {
        let store = MemoryStore::new()
            .with_network("n1", "Office")
            .with_network("n2", "AWS")
            .with_resource("r1", "web", "n1")
            .with_resource("r2", "web", "n2")
            .with_resource("r3", "db", "n1");

        let rows = resource_rows(&store.snapshot());

        let names: Vec<(&str, &str)> = rows.iter().map(|r| (r[1].as_str(), r[4].as_str())).collect();
        assert_eq!(names, vec![("db", "Office"), ("web", "AWS"), ("web", "Office")]);
        assert_eq!(rows[0][2], "db.internal");
    }
}
