//! Reconciliation planner
//!
//! Classifies every desired row as CREATE or SKIP against the identity index.
//! Rows planned as CREATE reserve their name in the index so rows of dependent
//! types planned later can reference them. No I/O happens here.

use super::error::ImportError;
use super::index::{EntryId, IdentityIndex, IdentityState};
use super::types::{DesiredRow, DesiredSheet, EntityType, ImportAction};

/// Plan all rows of a sheet. Sheets without an entity type are left untouched.
pub fn plan(sheet: &mut DesiredSheet, index: &mut IdentityIndex) -> Result<(), ImportError> {
    match sheet.entity_type {
        Some(EntityType::RemoteNetwork) => plan_remote_networks(&mut sheet.rows, index),
        Some(EntityType::Resource) => plan_resources(&mut sheet.rows, index),
        None => {
            log::debug!("Sheet '{}' is not imported, passing through", sheet.name);
            Ok(())
        }
    }
}

fn plan_remote_networks(
    rows: &mut [DesiredRow],
    index: &mut IdentityIndex,
) -> Result<(), ImportError> {
    for row in rows.iter_mut() {
        let name = required_name(row, EntityType::RemoteNetwork)?;

        match index.lookup_network(&name) {
            Some(existing) => {
                let id = existing_id(index, existing, EntityType::RemoteNetwork, &name, row)?;
                log::info!("Remote Network with same name already exists, will skip: '{}'", name);
                row.action = Some(ImportAction::Skip);
                row.import_id = Some(id);
                row.entry = Some(existing);
            }
            None => {
                log::info!("Remote Network will be created: '{}'", name);
                // The lookup above just missed, so the reservation cannot collide
                let entry = index
                    .reserve(EntityType::RemoteNetwork, None, &name, row.row_number)
                    .unwrap_or_else(|existing| existing);
                row.action = Some(ImportAction::Create);
                row.import_id = None;
                row.entry = Some(entry);
            }
        }
    }
    Ok(())
}

fn plan_resources(rows: &mut [DesiredRow], index: &mut IdentityIndex) -> Result<(), ImportError> {
    for row in rows.iter_mut() {
        let name = required_name(row, EntityType::Resource)?;
        let label = row
            .remote_network_label()
            .ok_or_else(|| ImportError::InvalidRow {
                entity_type: EntityType::Resource,
                row: row.row_number,
                reason: format!("Resource '{}' has no remoteNetworkLabel", name),
            })?;

        let network = index
            .lookup_network(&label)
            .ok_or_else(|| ImportError::UnresolvedReference {
                entity_type: EntityType::Resource,
                row: row.row_number,
                name: name.clone(),
                label: label.clone(),
            })?;
        row.parent = Some(network);

        match index.lookup_resource(network, &name) {
            Some(existing) => {
                let id = existing_id(index, existing, EntityType::Resource, &name, row)?;
                log::info!(
                    "Resource with same name exists, will skip: '{}' in Remote Network '{}'",
                    name,
                    label
                );
                row.action = Some(ImportAction::Skip);
                row.import_id = Some(id);
                row.entry = Some(existing);
            }
            None => {
                log::info!(
                    "Resource will be created: '{}' in Remote Network '{}'",
                    name,
                    label
                );
                let entry = index
                    .reserve(EntityType::Resource, Some(network), &name, row.row_number)
                    .unwrap_or_else(|existing| existing);
                row.action = Some(ImportAction::Create);
                row.import_id = None;
                row.entry = Some(entry);
            }
        }
    }
    Ok(())
}

fn required_name(row: &DesiredRow, entity_type: EntityType) -> Result<String, ImportError> {
    row.name().ok_or_else(|| ImportError::InvalidRow {
        entity_type,
        row: row.row_number,
        reason: "missing name".to_string(),
    })
}

/// Id of an entry matched by name. A match against a name reserved earlier in
/// the same batch is a duplicate input row.
fn existing_id(
    index: &IdentityIndex,
    existing: EntryId,
    entity_type: EntityType,
    name: &str,
    row: &DesiredRow,
) -> Result<String, ImportError> {
    let entry = index.entry(existing);
    match &entry.state {
        IdentityState::Live(id) | IdentityState::Created(id) => Ok(id.clone()),
        IdentityState::Pending | IdentityState::Failed => Err(ImportError::DuplicateInputRow {
            entity_type,
            name: name.to_string(),
            first_row: entry.row_number.unwrap_or_default(),
            second_row: row.row_number,
        }),
    }
}
