//! Live records as returned by the Twingate API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A Remote Network and the ids of the Resources it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNetworkRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub resource_ids: Vec<String>,
}

/// A Resource and the id of its owning Remote Network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub alias: Option<String>,
    pub remote_network_id: String,
}

/// Everything fetched from the account in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub remote_networks: Vec<RemoteNetworkRecord>,
    pub resources: Vec<ResourceRecord>,
}

impl LiveSnapshot {
    /// Fill each network's `resource_ids` from the resources' owning network ids,
    /// keeping resource order
    pub fn link_resources(&mut self) {
        let mut by_network: HashMap<&str, Vec<String>> = HashMap::new();
        for resource in &self.resources {
            by_network
                .entry(resource.remote_network_id.as_str())
                .or_default()
                .push(resource.id.clone());
        }
        for network in &mut self.remote_networks {
            network.resource_ids = by_network.remove(network.id.as_str()).unwrap_or_default();
        }
    }

    pub fn remote_network(&self, id: &str) -> Option<&RemoteNetworkRecord> {
        self.remote_networks.iter().find(|n| n.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(id: &str, network: &str) -> ResourceRecord {
        ResourceRecord {
            id: id.to_string(),
            name: format!("res-{}", id),
            address: None,
            alias: None,
            remote_network_id: network.to_string(),
        }
    }

    #[test]
    fn test_link_resources_groups_by_network() {
        let mut snapshot = LiveSnapshot {
            remote_networks: vec![
                RemoteNetworkRecord {
                    id: "n1".to_string(),
                    name: "A".to_string(),
                    resource_ids: vec!["stale".to_string()],
                },
                RemoteNetworkRecord {
                    id: "n2".to_string(),
                    name: "B".to_string(),
                    resource_ids: vec![],
                },
            ],
            resources: vec![resource("r1", "n1"), resource("r2", "n2"), resource("r3", "n1")],
        };

        snapshot.link_resources();

        assert_eq!(snapshot.remote_networks[0].resource_ids, vec!["r1", "r3"]);
        assert_eq!(snapshot.remote_networks[1].resource_ids, vec!["r2"]);
        assert_eq!(snapshot.remote_network("n2").map(|n| n.name.as_str()), Some("B"));
    }
}
