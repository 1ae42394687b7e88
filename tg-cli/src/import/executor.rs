//! Executes planned creations in dependency order
//!
//! Creations are issued one at a time; each result is written back into the
//! identity index before the next row runs, so rows of dependent types see the
//! ids of everything created before them.

use std::fmt;

use crate::api::CreateOperation;

use super::index::IdentityIndex;
use super::types::{DesiredRow, DesiredSheet, EntityType, ImportAction, ImportFailure, columns};
use super::{NoticeLevel, RemoteStore, UserChannel};

/// Why a single row could not be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFailure {
    /// The referenced Remote Network has no id (its own creation failed)
    UnresolvedReference { label: String },
    /// A value required by the create call is blank
    MissingField(&'static str),
    /// The remote call failed
    Remote(String),
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowFailure::UnresolvedReference { label } => {
                write!(f, "UnresolvedReference: Remote Network '{}' was not created", label)
            }
            RowFailure::MissingField(field) => write!(f, "missing required field '{}'", field),
            RowFailure::Remote(message) => f.write_str(message),
        }
    }
}

/// Create every row marked CREATE. Sheets must already be in dependency order.
///
/// A failed row is marked FAILED and the run continues; the returned list
/// holds one entry per failed row.
pub async fn execute(
    store: &dyn RemoteStore,
    channel: &dyn UserChannel,
    sheets: &mut [DesiredSheet],
    index: &mut IdentityIndex,
) -> Vec<ImportFailure> {
    let mut failures = Vec::new();

    for sheet in sheets.iter_mut() {
        let Some(entity_type) = sheet.entity_type else {
            continue;
        };
        log::info!(
            "Importing {} record(s) as {}s",
            sheet.count_by_action(ImportAction::Create),
            entity_type
        );

        for row in sheet.rows.iter_mut() {
            if row.action != Some(ImportAction::Create) {
                continue;
            }
            let name = row.name().unwrap_or_default();

            let result = match build_operation(entity_type, row, index) {
                Ok(operation) => store
                    .create(&operation)
                    .await
                    .map_err(|err| RowFailure::Remote(format!("{:#}", err))),
                Err(failure) => Err(failure),
            };

            match result {
                Ok(id) => {
                    if let Some(entry) = row.entry {
                        index.resolve_created(entry, id.clone());
                    }
                    channel.notice(
                        NoticeLevel::Success,
                        &format!("Created {} '{}' with id '{}'", entity_type.label(), name, id),
                    );
                    row.import_id = Some(id);
                }
                Err(failure) => {
                    if let Some(entry) = row.entry {
                        index.mark_failed(entry);
                    }
                    log::warn!(
                        "Failed to create {} '{}' (row {}): {}",
                        entity_type.label(),
                        name,
                        row.row_number,
                        failure
                    );
                    channel.notice(
                        NoticeLevel::Failure,
                        &format!("Failed to create {} '{}': {}", entity_type.label(), name, failure),
                    );
                    row.mark_failed(failure.to_string());
                    failures.push(ImportFailure {
                        entity_type,
                        name,
                        row_number: row.row_number,
                        reason: failure.to_string(),
                    });
                }
            }
        }
    }

    failures
}

/// Build the create call for a row, resolving references through the index
pub fn build_operation(
    entity_type: EntityType,
    row: &DesiredRow,
    index: &IdentityIndex,
) -> Result<CreateOperation, RowFailure> {
    let name = row.name().ok_or(RowFailure::MissingField(columns::NAME))?;

    match entity_type {
        EntityType::RemoteNetwork => Ok(CreateOperation::remote_network(name)),
        EntityType::Resource => {
            let parent = row.parent.ok_or_else(|| RowFailure::UnresolvedReference {
                label: row.remote_network_label().unwrap_or_default(),
            })?;
            let network_id =
                index
                    .id_of(parent)
                    .ok_or_else(|| RowFailure::UnresolvedReference {
                        label: index.entry(parent).name.clone(),
                    })?;
            let address = row
                .field_text(columns::ADDRESS)
                .ok_or(RowFailure::MissingField(columns::ADDRESS))?;

            Ok(CreateOperation::resource(
                name,
                address,
                network_id,
                row.field_text(columns::ALIAS),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::planner::plan;
    use crate::import::testing::{MemoryStore, ScriptedChannel, sheet_from};
    use serde_json::json;

    fn planned(
        store: &MemoryStore,
        networks: Vec<serde_json::Value>,
        resources: Vec<serde_json::Value>,
    ) -> (Vec<DesiredSheet>, IdentityIndex) {
        let mut index = IdentityIndex::from_live(&store.snapshot()).unwrap();
        let mut sheets = vec![
            DesiredSheet::from_sheet(
                &sheet_from(EntityType::RemoteNetwork, networks),
                Some(EntityType::RemoteNetwork),
            ),
            DesiredSheet::from_sheet(
                &sheet_from(EntityType::Resource, resources),
                Some(EntityType::Resource),
            ),
        ];
        for sheet in sheets.iter_mut() {
            plan(sheet, &mut index).unwrap();
        }
        (sheets, index)
    }

    #[tokio::test]
    async fn test_created_ids_backfilled_and_visible_to_dependents() {
        let store = MemoryStore::new();
        let channel = ScriptedChannel::accepting();
        let (mut sheets, mut index) = planned(
            &store,
            vec![json!({"name": "B"})],
            vec![json!({"name": "db", "remoteNetworkLabel": "B", "address": "10.0.0.5"})],
        );

        let failures = execute(&store, &channel, &mut sheets, &mut index).await;

        assert!(failures.is_empty());
        let network_id = sheets[0].rows[0].import_id.clone().unwrap();
        assert!(sheets[1].rows[0].import_id.is_some());
        assert_eq!(store.created_resource("db").unwrap().remote_network_id, network_id);
        assert_eq!(store.create_calls(), 2);
        let levels: Vec<NoticeLevel> = channel.notices().iter().map(|(level, _)| *level).collect();
        assert_eq!(levels, vec![NoticeLevel::Success, NoticeLevel::Success]);
    }

    #[tokio::test]
    async fn test_failed_network_cascades_to_its_resources() {
        let store = MemoryStore::new().fail_on("B");
        let channel = ScriptedChannel::accepting();
        let (mut sheets, mut index) = planned(
            &store,
            vec![json!({"name": "B"}), json!({"name": "C"})],
            vec![
                json!({"name": "db", "remoteNetworkLabel": "B", "address": "10.0.0.5"}),
                json!({"name": "db", "remoteNetworkLabel": "C", "address": "10.0.0.6"}),
            ],
        );

        let failures = execute(&store, &channel, &mut sheets, &mut index).await;

        assert_eq!(failures.len(), 2);
        assert_eq!(sheets[0].rows[0].action, Some(ImportAction::Failed));
        assert_eq!(sheets[0].rows[0].import_id, None);
        // Run continued past the failed row
        assert!(sheets[0].rows[1].import_id.is_some());

        let cascaded = &sheets[1].rows[0];
        assert_eq!(cascaded.action, Some(ImportAction::Failed));
        assert!(cascaded.failure.as_deref().unwrap().starts_with("UnresolvedReference"));
        assert!(sheets[1].rows[1].import_id.is_some());

        // B failed remotely, db under B never reached the store
        assert_eq!(store.create_calls(), 3);
        assert_eq!(failures[1].entity_type, EntityType::Resource);

        let failed_notices: Vec<String> = channel
            .notices()
            .into_iter()
            .filter(|(level, _)| *level == NoticeLevel::Failure)
            .map(|(_, message)| message)
            .collect();
        assert_eq!(failed_notices.len(), 2);
        assert!(failed_notices[0].starts_with("Failed to create Remote Network 'B'"));
    }

    #[tokio::test]
    async fn test_missing_address_fails_row_without_remote_call() {
        let store = MemoryStore::new().with_network("1", "A");
        let channel = ScriptedChannel::accepting();
        let (mut sheets, mut index) = planned(
            &store,
            vec![],
            vec![json!({"name": "db", "remoteNetworkLabel": "A"})],
        );

        let failures = execute(&store, &channel, &mut sheets, &mut index).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].reason, "missing required field 'address'");
        assert_eq!(store.create_calls(), 0);
    }

    #[test]
    fn test_build_operation_passes_alias() {
        let mut index = IdentityIndex::new();
        let network = index.insert(EntityType::RemoteNetwork, None, "A", "n1").unwrap();
        let mut row = DesiredRow::new(
            2,
            json!({"name": "web", "address": "web.local", "alias": "web.corp"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        row.parent = Some(network);

        let op = build_operation(EntityType::Resource, &row, &index).unwrap();
        assert_eq!(
            op,
            CreateOperation::resource("web", "web.local", "n1", Some("web.corp".to_string()))
        );
    }
}
