//! Core types for spreadsheet imports
//!
//! Tables as read from / written to a workbook, desired rows annotated with
//! their import action, and the per-type counters reported to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::index::EntryId;

/// Column names with a fixed meaning in import and audit sheets
pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const ADDRESS: &str = "address";
    pub const ALIAS: &str = "alias";
    pub const REMOTE_NETWORK_LABEL: &str = "remoteNetworkLabel";
    pub const RESOURCES_LABELS: &str = "resourcesLabels";
    pub const IMPORT_ACTION: &str = "importAction";
    pub const IMPORT_ID: &str = "importId";
    pub const IMPORT_ERROR: &str = "importError";

    /// Columns appended by the audit writer
    pub const AUDIT: [&str; 3] = [IMPORT_ACTION, IMPORT_ID, IMPORT_ERROR];
}

/// Entity types the importer knows how to reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    RemoteNetwork,
    Resource,
}

impl EntityType {
    pub const ALL: [EntityType; 2] = [EntityType::RemoteNetwork, EntityType::Resource];

    /// Sheet name used for this type in workbooks
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::RemoteNetwork => "RemoteNetwork",
            Self::Resource => "Resource",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::RemoteNetwork => "Remote Network",
            Self::Resource => "Resource",
        }
    }

    /// Types that must be known before rows of this type can be planned
    pub fn dependencies(&self) -> &'static [EntityType] {
        match self {
            Self::RemoteNetwork => &[],
            Self::Resource => &[EntityType::RemoteNetwork],
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

/// Outcome of planning / executing a single desired row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportAction {
    /// Does not exist yet and will be (or was) created
    Create,
    /// Already exists by name
    Skip,
    /// Creation was attempted, or could not be attempted, and did not succeed
    Failed,
}

impl ImportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Skip => "SKIP",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tabular document: named sheets of flat records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableDocument {
    pub sheets: Vec<Sheet>,
}

impl TableDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    #[cfg(test)]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// One sheet: ordered column names plus records keyed by column
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Sheet {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a record, numbering it as the next spreadsheet row (header is row 1)
    pub fn push_row(&mut self, values: Map<String, Value>) {
        let number = self.rows.last().map(|r| r.number + 1).unwrap_or(2);
        self.rows.push(TableRow { number, values });
    }
}

/// A record together with its 1-based spreadsheet row number
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub number: usize,
    pub values: Map<String, Value>,
}

/// A row of the input table annotated during planning and execution
#[derive(Debug, Clone)]
pub struct DesiredRow {
    pub row_number: usize,
    pub fields: Map<String, Value>,
    pub action: Option<ImportAction>,
    pub import_id: Option<String>,
    pub failure: Option<String>,
    /// Identity entry this row resolved to or reserved
    pub(crate) entry: Option<EntryId>,
    /// Identity entry of the referenced parent (Remote Network of a Resource)
    pub(crate) parent: Option<EntryId>,
}

impl DesiredRow {
    pub fn new(row_number: usize, fields: Map<String, Value>) -> Self {
        DesiredRow {
            row_number,
            fields,
            action: None,
            import_id: None,
            failure: None,
            entry: None,
            parent: None,
        }
    }

    /// Cell text of a column; numbers and booleans are rendered, blanks are `None`
    pub fn field_text(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn name(&self) -> Option<String> {
        self.field_text(columns::NAME)
    }

    pub fn remote_network_label(&self) -> Option<String> {
        self.field_text(columns::REMOTE_NETWORK_LABEL)
    }

    pub(crate) fn mark_failed(&mut self, reason: impl Into<String>) {
        self.action = Some(ImportAction::Failed);
        self.import_id = None;
        self.failure = Some(reason.into());
    }
}

/// Desired rows of one sheet. Sheets without an entity type pass through untouched.
#[derive(Debug, Clone)]
pub struct DesiredSheet {
    pub name: String,
    pub entity_type: Option<EntityType>,
    pub columns: Vec<String>,
    pub rows: Vec<DesiredRow>,
}

impl DesiredSheet {
    pub fn from_sheet(sheet: &Sheet, entity_type: Option<EntityType>) -> Self {
        DesiredSheet {
            name: sheet.name.clone(),
            entity_type,
            columns: sheet.columns.clone(),
            rows: sheet
                .rows
                .iter()
                .map(|r| DesiredRow::new(r.number, r.values.clone()))
                .collect(),
        }
    }

    pub fn count_by_action(&self, action: ImportAction) -> usize {
        self.rows.iter().filter(|r| r.action == Some(action)).count()
    }

    pub fn counts(&self) -> EntityCounts {
        let mut counts = EntityCounts::default();
        for row in &self.rows {
            match row.action {
                Some(ImportAction::Create) if row.import_id.is_some() => counts.created += 1,
                Some(ImportAction::Create) => counts.pending += 1,
                Some(ImportAction::Skip) => counts.skipped += 1,
                Some(ImportAction::Failed) => counts.failed += 1,
                None => {}
            }
        }
        counts
    }
}

/// Row counters for one entity type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Planned creations that have not run (dry runs)
    pub pending: usize,
}

/// Per-type counters of a run, in dependency order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub entities: Vec<(EntityType, EntityCounts)>,
}

impl ImportSummary {
    pub fn from_sheets(sheets: &[DesiredSheet]) -> Self {
        ImportSummary {
            entities: sheets
                .iter()
                .filter_map(|s| s.entity_type.map(|t| (t, s.counts())))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn get(&self, entity_type: EntityType) -> EntityCounts {
        self.entities
            .iter()
            .find(|(t, _)| *t == entity_type)
            .map(|(_, c)| *c)
            .unwrap_or_default()
    }

    pub fn total(&self) -> EntityCounts {
        self.entities
            .iter()
            .fold(EntityCounts::default(), |acc, (_, c)| EntityCounts {
                created: acc.created + c.created,
                skipped: acc.skipped + c.skipped,
                failed: acc.failed + c.failed,
                pending: acc.pending + c.pending,
            })
    }

    pub fn has_failures(&self) -> bool {
        self.total().failed > 0
    }
}

/// A row that could not be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub entity_type: EntityType,
    pub name: String,
    pub row_number: usize,
    pub reason: String,
}

impl fmt::Display for ImportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' (row {}): {}",
            self.entity_type.label(),
            self.name,
            self.row_number,
            self.reason
        )
    }
}
