//! Spreadsheet import into a Twingate account
//!
//! Reconciles desired rows from a workbook against the live account and
//! creates whatever is missing. A run is split in three phases so callers can
//! put a confirmation between planning and applying:
//!
//! - [`ImportEngine::prepare`]: read live state, build the identity index, plan every row
//! - confirmation through a [`UserChannel`] when the plan creates anything
//! - [`ImportEngine::execute`]: create rows in dependency order and collect the outcome
//!
//! [`run_import`] wires the phases together with a [`TableCodec`] for input and audit output.

pub mod audit;
pub mod dependency_graph;
pub mod error;
pub mod executor;
pub mod index;
pub mod planner;
pub mod types;

#[cfg(test)]
pub mod testing;

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use crate::api::{CreateOperation, LiveSnapshot};

pub use error::ImportError;
pub use index::IdentityIndex;
pub use types::*;

/// Live state of the remote account
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch every live record of the given types
    async fn fetch_all(&self, entity_types: &[EntityType]) -> Result<LiveSnapshot>;

    /// Create one entity and return its id
    async fn create(&self, operation: &CreateOperation) -> Result<String>;
}

/// Reads and writes table documents
pub trait TableCodec: Send + Sync {
    fn read(&self, path: &Path) -> Result<TableDocument>;
    fn write(&self, document: &TableDocument, path: &Path) -> Result<()>;
}

/// Outcome reported by a progress line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// Interaction with whoever runs the import
pub trait UserChannel: Send + Sync {
    /// Blocking yes/no gate
    fn confirm(&self, message: &str) -> Result<bool>;

    /// Progress line for one row
    fn notice(&self, level: NoticeLevel, message: &str);
}

/// Fully planned import, ready to execute
#[derive(Debug)]
pub struct ImportPlan {
    /// Imported entity types in dependency order
    pub order: Vec<EntityType>,
    /// Imported sheets in `order`, followed by pass-through sheets in input order
    pub sheets: Vec<DesiredSheet>,
    index: IdentityIndex,
}

impl ImportPlan {
    pub fn sheet(&self, entity_type: EntityType) -> Option<&DesiredSheet> {
        self.sheets
            .iter()
            .find(|s| s.entity_type == Some(entity_type))
    }

    pub fn create_count_for(&self, entity_type: EntityType) -> usize {
        self.sheet(entity_type)
            .map(|s| s.count_by_action(ImportAction::Create))
            .unwrap_or(0)
    }

    /// Rows that will be created if the plan is executed
    pub fn create_count(&self) -> usize {
        self.order.iter().map(|t| self.create_count_for(*t)).sum()
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary::from_sheets(&self.sheets)
    }

    /// Audit document of the plan as it stands
    pub fn audit(&self) -> TableDocument {
        audit::write(&self.sheets)
    }
}

/// Result of executing a plan
#[derive(Debug)]
pub struct ImportOutcome {
    pub sheets: Vec<DesiredSheet>,
    pub summary: ImportSummary,
    pub failures: Vec<ImportFailure>,
}

impl ImportOutcome {
    pub fn audit(&self) -> TableDocument {
        audit::write(&self.sheets)
    }
}

/// Plans and executes imports against a remote store
pub struct ImportEngine<'a> {
    store: &'a dyn RemoteStore,
}

impl<'a> ImportEngine<'a> {
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self { store }
    }

    /// Plan the import of `entity_types` from `document`.
    ///
    /// Fails before any remote call when a sheet is missing or the type
    /// dependencies are cyclic; nothing is created by this method.
    pub async fn prepare(
        &self,
        document: &TableDocument,
        entity_types: &[EntityType],
    ) -> Result<ImportPlan, ImportError> {
        for entity_type in entity_types {
            if document.sheet(entity_type.sheet_name()).is_none() {
                return Err(ImportError::MissingInputSheet {
                    sheet: entity_type.sheet_name().to_string(),
                });
            }
        }
        let order = dependency_graph::entity_order(entity_types)?;

        let fetch_types = dependency_graph::dependency_closure(&order);
        log::info!(
            "Fetching live {}",
            fetch_types
                .iter()
                .map(|t| t.sheet_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        let snapshot = self
            .store
            .fetch_all(&fetch_types)
            .await
            .map_err(ImportError::LiveFetch)?;
        let mut index = IdentityIndex::from_live(&snapshot)?;

        let mut sheets = Vec::with_capacity(document.sheets.len());
        for entity_type in &order {
            if let Some(sheet) = document.sheet(entity_type.sheet_name()) {
                sheets.push(DesiredSheet::from_sheet(sheet, Some(*entity_type)));
            }
        }
        for sheet in &document.sheets {
            if !sheets.iter().any(|s| s.name == sheet.name) {
                sheets.push(DesiredSheet::from_sheet(sheet, None));
            }
        }

        for sheet in sheets.iter_mut() {
            planner::plan(sheet, &mut index)?;
        }

        Ok(ImportPlan {
            order,
            sheets,
            index,
        })
    }

    /// Create every row planned as CREATE. Row failures do not stop the run.
    pub async fn execute(&self, plan: ImportPlan, channel: &dyn UserChannel) -> ImportOutcome {
        let ImportPlan {
            mut sheets,
            mut index,
            ..
        } = plan;

        let failures = executor::execute(self.store, channel, &mut sheets, &mut index).await;
        let summary = ImportSummary::from_sheets(&sheets);

        ImportOutcome {
            sheets,
            summary,
            failures,
        }
    }
}

/// What to import and where to write the audit
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub entity_types: Vec<EntityType>,
    /// Plan and write the audit without creating anything
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Completed,
    DryRun,
    /// Confirmation was declined; nothing was created or written
    Cancelled,
}

/// What the caller gets back from [`run_import`]
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub status: ImportStatus,
    pub summary: ImportSummary,
    pub failures: Vec<ImportFailure>,
    pub audit_path: Option<PathBuf>,
}

/// Run a whole import: read input, plan, confirm, execute, write the audit.
///
/// Fatal errors return before anything is created and no audit is written.
pub async fn run_import(
    store: &dyn RemoteStore,
    codec: &dyn TableCodec,
    channel: &dyn UserChannel,
    request: &ImportRequest,
) -> Result<ImportReport, ImportError> {
    let document = codec
        .read(&request.input)
        .map_err(|source| ImportError::Table {
            path: request.input.clone(),
            source,
        })?;

    let engine = ImportEngine::new(store);
    let plan = engine.prepare(&document, &request.entity_types).await?;
    let create_count = plan.create_count();

    if request.dry_run {
        write_audit(codec, &plan.audit(), &request.output)?;
        return Ok(ImportReport {
            status: ImportStatus::DryRun,
            summary: plan.summary(),
            failures: Vec::new(),
            audit_path: Some(request.output.clone()),
        });
    }

    if create_count > 0 {
        let message = confirmation_message(&plan);
        let confirmed = channel
            .confirm(&message)
            .map_err(ImportError::Confirmation)?;
        if !confirmed {
            log::info!("Import cancelled, nothing was created");
            return Ok(ImportReport {
                status: ImportStatus::Cancelled,
                summary: plan.summary(),
                failures: Vec::new(),
                audit_path: None,
            });
        }
    }

    let outcome = engine.execute(plan, channel).await;
    write_audit(codec, &outcome.audit(), &request.output)?;

    Ok(ImportReport {
        status: ImportStatus::Completed,
        summary: outcome.summary,
        failures: outcome.failures,
        audit_path: Some(request.output.clone()),
    })
}

fn confirmation_message(plan: &ImportPlan) -> String {
    let parts: Vec<String> = plan
        .order
        .iter()
        .map(|t| format!("{} {}(s)", plan.create_count_for(*t), t.label()))
        .collect();
    format!("This will create {}. Continue?", parts.join(" and "))
}

fn write_audit(codec: &dyn TableCodec, document: &TableDocument, path: &Path) -> Result<(), ImportError> {
    codec
        .write(document, path)
        .map_err(|source| ImportError::Table {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Audit written to {}", path.display());
    Ok(())
}
