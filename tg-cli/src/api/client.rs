//! Twingate GraphQL API client

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{ClientConfig, CreateOperation, LiveSnapshot, RemoteNetworkRecord, ResourceRecord};
use crate::import::{EntityType, RemoteStore};

const API_KEY_HEADER: &str = "X-API-KEY";

const REMOTE_NETWORKS_QUERY: &str = r#"
query RemoteNetworks($first: Int!, $after: String) {
  remoteNetworks(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges { node { id name } }
  }
}"#;

const RESOURCES_QUERY: &str = r#"
query Resources($first: Int!, $after: String) {
  resources(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges { node { id name alias address { value } remoteNetwork { id } } }
  }
}"#;

const REMOTE_NETWORK_CREATE: &str = r#"
mutation RemoteNetworkCreate($name: String!) {
  remoteNetworkCreate(name: $name) { ok error entity { id } }
}"#;

const RESOURCE_CREATE: &str = r#"
mutation ResourceCreate($name: String!, $address: String!, $remoteNetworkId: ID!, $alias: String) {
  resourceCreate(name: $name, address: $address, remoteNetworkId: $remoteNetworkId, alias: $alias) {
    ok error entity { id }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T> GraphQlResponse<T> {
    fn into_data(self) -> Result<T> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            bail!("GraphQL error: {}", messages.join("; "));
        }
        self.data.ok_or_else(|| anyhow!("GraphQL response has no data"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Edge<N> {
    node: N,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<N> {
    page_info: PageInfo,
    edges: Vec<Edge<N>>,
}

#[derive(Debug, Deserialize)]
struct RemoteNetworkNode {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct NodeRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AddressNode {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceNode {
    id: String,
    name: String,
    alias: Option<String>,
    address: Option<AddressNode>,
    remote_network: NodeRef,
}

impl From<RemoteNetworkNode> for RemoteNetworkRecord {
    fn from(node: RemoteNetworkNode) -> Self {
        RemoteNetworkRecord {
            id: node.id,
            name: node.name,
            resource_ids: Vec::new(),
        }
    }
}

impl From<ResourceNode> for ResourceRecord {
    fn from(node: ResourceNode) -> Self {
        ResourceRecord {
            id: node.id,
            name: node.name,
            address: node.address.map(|a| a.value),
            alias: node.alias,
            remote_network_id: node.remote_network.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MutationPayload {
    ok: bool,
    error: Option<String>,
    entity: Option<NodeRef>,
}

impl MutationPayload {
    fn into_id(self, mutation: &str) -> Result<String> {
        if !self.ok {
            bail!(
                "{} failed: {}",
                mutation,
                self.error.as_deref().unwrap_or("unknown error")
            );
        }
        self.entity
            .map(|e| e.id)
            .ok_or_else(|| anyhow!("{} returned no entity", mutation))
    }
}

/// GraphQL endpoint for an account. A value containing a dot is taken as the full host.
pub fn endpoint_for(account: &str) -> String {
    if account.contains('.') {
        format!("https://{}/api/graphql/", account)
    } else {
        format!("https://{}.twingate.com/api/graphql/", account)
    }
}

/// Client for one Twingate account
pub struct TwingateClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    config: ClientConfig,
}

impl TwingateClient {
    pub fn new(account: &str, api_key: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint_for(account),
            api_key: api_key.into(),
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Twingate API returned {}: {}", status, body.trim());
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .context("Failed to decode GraphQL response")?;
        body.into_data()
    }

    /// Follow the cursor of a connection field until the last page
    async fn fetch_connection<N: DeserializeOwned>(&self, query: &str, field: &str) -> Result<Vec<N>> {
        let mut nodes = Vec::new();
        let mut after: Option<String> = None;
        let mut page = 0;

        loop {
            page += 1;
            let variables = json!({ "first": self.config.page_size, "after": after });
            let mut data: HashMap<String, Connection<N>> = self
                .execute(query, variables)
                .await
                .with_context(|| format!("Failed to fetch page {} of {}", page, field))?;
            let connection = data
                .remove(field)
                .ok_or_else(|| anyhow!("GraphQL response has no '{}' field", field))?;

            log::debug!("Fetched {} {} on page {}", connection.edges.len(), field, page);
            nodes.extend(connection.edges.into_iter().map(|e| e.node));

            match connection.page_info.end_cursor {
                Some(cursor) if connection.page_info.has_next_page => after = Some(cursor),
                _ => break,
            }
        }

        Ok(nodes)
    }

    pub async fn remote_networks(&self) -> Result<Vec<RemoteNetworkRecord>> {
        let nodes: Vec<RemoteNetworkNode> = self
            .fetch_connection(REMOTE_NETWORKS_QUERY, "remoteNetworks")
            .await?;
        Ok(nodes.into_iter().map(Into::into).collect())
    }

    pub async fn resources(&self) -> Result<Vec<ResourceRecord>> {
        let nodes: Vec<ResourceNode> = self.fetch_connection(RESOURCES_QUERY, "resources").await?;
        Ok(nodes.into_iter().map(Into::into).collect())
    }

    async fn mutate(&self, mutation: &str, field: &str, variables: Value) -> Result<String> {
        let mut data: HashMap<String, MutationPayload> = self.execute(mutation, variables).await?;
        data.remove(field)
            .ok_or_else(|| anyhow!("GraphQL response has no '{}' field", field))?
            .into_id(field)
    }

    pub async fn create_remote_network(&self, name: &str) -> Result<String> {
        self.mutate(
            REMOTE_NETWORK_CREATE,
            "remoteNetworkCreate",
            json!({ "name": name }),
        )
        .await
    }

    pub async fn create_resource(
        &self,
        name: &str,
        address: &str,
        remote_network_id: &str,
        alias: Option<&str>,
    ) -> Result<String> {
        self.mutate(
            RESOURCE_CREATE,
            "resourceCreate",
            json!({
                "name": name,
                "address": address,
                "remoteNetworkId": remote_network_id,
                "alias": alias,
            }),
        )
        .await
    }
}

#[async_trait]
impl RemoteStore for TwingateClient {
    async fn fetch_all(&self, entity_types: &[EntityType]) -> Result<LiveSnapshot> {
        let mut snapshot = LiveSnapshot::default();
        if entity_types.contains(&EntityType::RemoteNetwork) {
            snapshot.remote_networks = self.remote_networks().await?;
        }
        if entity_types.contains(&EntityType::Resource) {
            snapshot.resources = self.resources().await?;
        }
        snapshot.link_resources();

        log::info!(
            "Fetched {} remote network(s) and {} resource(s)",
            snapshot.remote_networks.len(),
            snapshot.resources.len()
        );
        Ok(snapshot)
    }

    async fn create(&self, operation: &CreateOperation) -> Result<String> {
        log::debug!("Executing {} for '{}'", operation.mutation_name(), operation.name());
        match operation {
            CreateOperation::RemoteNetwork { name } => self.create_remote_network(name).await,
            CreateOperation::Resource {
                name,
                address,
                remote_network_id,
                alias,
            } => {
                self.create_resource(name, address, remote_network_id, alias.as_deref())
                    .await
            }
        }
    }
}
