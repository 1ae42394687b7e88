//! In-memory collaborators for import tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use serde_json::Value;

use crate::api::{CreateOperation, LiveSnapshot, RemoteNetworkRecord, ResourceRecord};

use super::types::{EntityType, Sheet, TableDocument};
use super::{NoticeLevel, RemoteStore, TableCodec, UserChannel};

#[derive(Default)]
struct MemoryState {
    snapshot: LiveSnapshot,
    next_id: u64,
    create_calls: usize,
    fetch_calls: usize,
}

/// Remote store backed by a [`LiveSnapshot`] held in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_names: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_network(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().snapshot.remote_networks.push(RemoteNetworkRecord {
            id: id.to_string(),
            name: name.to_string(),
            resource_ids: vec![],
        });
        self
    }

    pub fn with_resource(self, id: &str, name: &str, network_id: &str) -> Self {
        self.state.lock().unwrap().snapshot.resources.push(ResourceRecord {
            id: id.to_string(),
            name: name.to_string(),
            address: Some(format!("{}.internal", name)),
            alias: None,
            remote_network_id: network_id.to_string(),
        });
        self
    }

    /// Make every create call for `name` fail
    pub fn fail_on(mut self, name: &str) -> Self {
        self.fail_names.insert(name.to_string());
        self
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        let mut snapshot = self.state.lock().unwrap().snapshot.clone();
        snapshot.link_resources();
        snapshot
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn network_named(&self, name: &str) -> Option<RemoteNetworkRecord> {
        self.snapshot()
            .remote_networks
            .into_iter()
            .find(|n| n.name == name)
    }

    pub fn created_resource(&self, name: &str) -> Option<ResourceRecord> {
        self.snapshot().resources.into_iter().rev().find(|r| r.name == name)
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn fetch_all(&self, _entity_types: &[EntityType]) -> Result<LiveSnapshot> {
        self.state.lock().unwrap().fetch_calls += 1;
        Ok(self.snapshot())
    }

    async fn create(&self, operation: &CreateOperation) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        if self.fail_names.contains(operation.name()) {
            bail!("simulated failure creating '{}'", operation.name());
        }

        state.next_id += 1;
        let id = format!("new-{}", state.next_id);
        match operation {
            CreateOperation::RemoteNetwork { name } => {
                state.snapshot.remote_networks.push(RemoteNetworkRecord {
                    id: id.clone(),
                    name: name.clone(),
                    resource_ids: vec![],
                });
            }
            CreateOperation::Resource {
                name,
                address,
                remote_network_id,
                alias,
            } => {
                state.snapshot.resources.push(ResourceRecord {
                    id: id.clone(),
                    name: name.clone(),
                    address: Some(address.clone()),
                    alias: alias.clone(),
                    remote_network_id: remote_network_id.clone(),
                });
            }
        }
        Ok(id)
    }
}

/// User channel with a fixed answer that records what it was asked
pub struct ScriptedChannel {
    answer: bool,
    prompts: Mutex<Vec<String>>,
    notices: Mutex<Vec<(NoticeLevel, String)>>,
}

impl ScriptedChannel {
    pub fn accepting() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        ScriptedChannel {
            answer,
            prompts: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl UserChannel for ScriptedChannel {
    fn confirm(&self, message: &str) -> Result<bool> {
        self.prompts.lock().unwrap().push(message.to_string());
        Ok(self.answer)
    }

    fn notice(&self, level: NoticeLevel, message: &str) {
        self.notices.lock().unwrap().push((level, message.to_string()));
    }
}

/// Table codec keeping documents in a map keyed by path
#[derive(Default)]
pub struct MemoryCodec {
    files: Mutex<HashMap<PathBuf, TableDocument>>,
}

impl MemoryCodec {
    pub fn with_file(path: impl Into<PathBuf>, document: TableDocument) -> Self {
        let codec = MemoryCodec::default();
        codec.files.lock().unwrap().insert(path.into(), document);
        codec
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<TableDocument> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }
}

impl TableCodec for MemoryCodec {
    fn read(&self, path: &Path) -> Result<TableDocument> {
        self.file(path)
            .ok_or_else(|| anyhow!("no such file: {}", path.display()))
    }

    fn write(&self, document: &TableDocument, path: &Path) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), document.clone());
        Ok(())
    }
}

/// Build a sheet for `entity_type` from JSON objects; columns in first-seen order
pub fn sheet_from(entity_type: EntityType, rows: Vec<Value>) -> Sheet {
    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut sheet = Sheet::new(entity_type.sheet_name(), columns);
    for row in rows {
        if let Value::Object(map) = row {
            sheet.push_row(map);
        }
    }
    sheet
}
