//! Run-scoped identity index
//!
//! Every record known to exist (or reserved for creation in this run) lives in
//! an arena addressed by [`EntryId`]. Name lookups and the Remote Network ->
//! Resource ownership relation are derived from the arena and only change
//! through [`IdentityIndex::push`], so they never drift from the records.

use std::collections::HashMap;

use crate::api::LiveSnapshot;

use super::error::ImportError;
use super::types::EntityType;

/// Stable handle of an identity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(usize);

/// Where an identity currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityState {
    /// Existed before the run
    Live(String),
    /// Planned for creation, not executed yet
    Pending,
    /// Created during this run
    Created(String),
    /// Creation failed
    Failed,
}

impl IdentityState {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Live(id) | Self::Created(id) => Some(id),
            Self::Pending | Self::Failed => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentityEntry {
    pub entity_type: EntityType,
    pub name: String,
    /// Owning entry for scoped names (a Resource's Remote Network)
    pub scope: Option<EntryId>,
    pub state: IdentityState,
    /// Input row that reserved this entry
    pub row_number: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IdentityKey {
    entity_type: EntityType,
    scope: Option<EntryId>,
    name: String,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    entries: Vec<IdentityEntry>,
    by_key: HashMap<IdentityKey, EntryId>,
    children: HashMap<EntryId, Vec<EntryId>>,
}

impl IdentityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from live records.
    ///
    /// Remote Network names must be unique account-wide and Resource names
    /// unique within their network; a collision aborts with
    /// [`ImportError::DuplicateIdentity`] naming both ids.
    pub fn from_live(snapshot: &LiveSnapshot) -> Result<Self, ImportError> {
        let mut index = IdentityIndex::new();
        let mut networks_by_id: HashMap<&str, EntryId> = HashMap::new();

        for network in &snapshot.remote_networks {
            let entry = index
                .insert(EntityType::RemoteNetwork, None, &network.name, &network.id)
                .map_err(|existing| ImportError::DuplicateIdentity {
                    entity_type: EntityType::RemoteNetwork,
                    name: network.name.clone(),
                    scope: None,
                    first_id: index.id_of(existing).unwrap_or_default().to_string(),
                    second_id: network.id.clone(),
                })?;
            networks_by_id.insert(network.id.as_str(), entry);
        }

        for resource in &snapshot.resources {
            let Some(&network) = networks_by_id.get(resource.remote_network_id.as_str()) else {
                log::warn!(
                    "Resource '{}' ({}) belongs to unknown Remote Network '{}', ignoring",
                    resource.name,
                    resource.id,
                    resource.remote_network_id
                );
                continue;
            };
            index
                .insert(EntityType::Resource, Some(network), &resource.name, &resource.id)
                .map_err(|existing| ImportError::DuplicateIdentity {
                    entity_type: EntityType::Resource,
                    name: resource.name.clone(),
                    scope: Some(index.entry(network).name.clone()),
                    first_id: index.id_of(existing).unwrap_or_default().to_string(),
                    second_id: resource.id.clone(),
                })?;
        }

        log::debug!("Identity index built with {} entries", index.len());
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, id: EntryId) -> &IdentityEntry {
        &self.entries[id.0]
    }

    /// Remote id of an entry, if it exists remotely
    pub fn id_of(&self, id: EntryId) -> Option<&str> {
        self.entry(id).state.id()
    }

    /// Exact, case-sensitive lookup
    pub fn lookup(
        &self,
        entity_type: EntityType,
        scope: Option<EntryId>,
        name: &str,
    ) -> Option<EntryId> {
        self.by_key
            .get(&IdentityKey {
                entity_type,
                scope,
                name: name.to_string(),
            })
            .copied()
    }

    pub fn lookup_network(&self, name: &str) -> Option<EntryId> {
        self.lookup(EntityType::RemoteNetwork, None, name)
    }

    pub fn lookup_resource(&self, network: EntryId, name: &str) -> Option<EntryId> {
        self.lookup(EntityType::Resource, Some(network), name)
    }

    /// Entries owned by `scope`, in insertion order
    pub fn children_of(&self, scope: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        self.children.get(&scope).into_iter().flatten().copied()
    }

    /// Record an identity that exists remotely. Returns the existing entry on collision.
    pub fn insert(
        &mut self,
        entity_type: EntityType,
        scope: Option<EntryId>,
        name: &str,
        id: &str,
    ) -> Result<EntryId, EntryId> {
        self.push(IdentityEntry {
            entity_type,
            name: name.to_string(),
            scope,
            state: IdentityState::Live(id.to_string()),
            row_number: None,
        })
    }

    /// Reserve a name for a row planned as CREATE so later rows can resolve it
    pub fn reserve(
        &mut self,
        entity_type: EntityType,
        scope: Option<EntryId>,
        name: &str,
        row_number: usize,
    ) -> Result<EntryId, EntryId> {
        self.push(IdentityEntry {
            entity_type,
            name: name.to_string(),
            scope,
            state: IdentityState::Pending,
            row_number: Some(row_number),
        })
    }

    /// Make a successful creation visible to subsequent lookups
    pub fn resolve_created(&mut self, entry: EntryId, id: impl Into<String>) {
        self.entries[entry.0].state = IdentityState::Created(id.into());
    }

    /// Mark a creation as failed. Children still pending under it can never
    /// be created and fail with it.
    pub fn mark_failed(&mut self, entry: EntryId) {
        self.entries[entry.0].state = IdentityState::Failed;

        let pending: Vec<EntryId> = self
            .children_of(entry)
            .filter(|child| self.entry(*child).state == IdentityState::Pending)
            .collect();
        for child in pending {
            self.mark_failed(child);
        }
    }

    fn push(&mut self, entry: IdentityEntry) -> Result<EntryId, EntryId> {
        let key = IdentityKey {
            entity_type: entry.entity_type,
            scope: entry.scope,
            name: entry.name.clone(),
        };
        if let Some(existing) = self.by_key.get(&key) {
            return Err(*existing);
        }

        let id = EntryId(self.entries.len());
        if let Some(scope) = entry.scope {
            self.children.entry(scope).or_default().push(id);
        }
        self.entries.push(entry);
        self.by_key.insert(key, id);
        Ok(id)
    }
}
