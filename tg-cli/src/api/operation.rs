//! Creation operations that can be executed against a Twingate account

use serde::{Deserialize, Serialize};

/// A single creation against the remote account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateOperation {
    /// Create a Remote Network
    RemoteNetwork {
        name: String,
    },
    /// Create a Resource inside an existing Remote Network
    Resource {
        name: String,
        /// Host name, IP address or CIDR range
        address: String,
        /// Id of the owning Remote Network
        remote_network_id: String,
        alias: Option<String>,
    },
}

impl CreateOperation {
    pub fn remote_network(name: impl Into<String>) -> Self {
        Self::RemoteNetwork { name: name.into() }
    }

    pub fn resource(
        name: impl Into<String>,
        address: impl Into<String>,
        remote_network_id: impl Into<String>,
        alias: Option<String>,
    ) -> Self {
        Self::Resource {
            name: name.into(),
            address: address.into(),
            remote_network_id: remote_network_id.into(),
            alias,
        }
    }

    /// Name of the entity being created
    pub fn name(&self) -> &str {
        match self {
            Self::RemoteNetwork { name } => name,
            Self::Resource { name, .. } => name,
        }
    }

    /// GraphQL mutation field used for this operation
    pub fn mutation_name(&self) -> &'static str {
        match self {
            Self::RemoteNetwork { .. } => "remoteNetworkCreate",
            Self::Resource { .. } => "resourceCreate",
        }
    }
}
