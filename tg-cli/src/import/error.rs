//! Errors that abort an import before anything is created

use std::fmt;
use std::path::PathBuf;

use super::types::EntityType;

/// Fatal import error. Row-level creation failures are not errors; they are
/// recorded on the row and in the summary instead.
#[derive(Debug)]
pub enum ImportError {
    /// The input workbook has no sheet for a requested entity type
    MissingInputSheet { sheet: String },
    /// The declared dependencies between entity types form a cycle
    DependencyCycle { entity_types: Vec<String> },
    /// Two live records share a name where names must be unique
    DuplicateIdentity {
        entity_type: EntityType,
        name: String,
        /// Owning Remote Network name for scoped (Resource) names
        scope: Option<String>,
        first_id: String,
        second_id: String,
    },
    /// A desired row references a name that is neither live nor being created
    UnresolvedReference {
        entity_type: EntityType,
        row: usize,
        name: String,
        label: String,
    },
    /// The same name is scheduled for creation twice in one batch
    DuplicateInputRow {
        entity_type: EntityType,
        name: String,
        first_row: usize,
        second_row: usize,
    },
    /// A desired row lacks a required value
    InvalidRow {
        entity_type: EntityType,
        row: usize,
        reason: String,
    },
    /// Fetching the live state failed
    LiveFetch(anyhow::Error),
    /// Reading or writing a table document failed
    Table { path: PathBuf, source: anyhow::Error },
    /// The confirmation gate could not be asked
    Confirmation(anyhow::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::MissingInputSheet { sheet } => {
                write!(f, "Input file is missing a sheet named '{}'", sheet)
            }
            ImportError::DependencyCycle { entity_types } => {
                write!(
                    f,
                    "Circular dependency detected involving: {}",
                    entity_types.join(", ")
                )
            }
            ImportError::DuplicateIdentity {
                entity_type,
                name,
                scope,
                first_id,
                second_id,
            } => {
                write!(f, "{} with duplicate name found: '{}'", entity_type.label(), name)?;
                if let Some(scope) = scope {
                    write!(f, " in Remote Network '{}'", scope)?;
                }
                write!(f, " - Ids: ['{}', '{}']", first_id, second_id)
            }
            ImportError::UnresolvedReference {
                entity_type,
                row,
                name,
                label,
            } => {
                write!(
                    f,
                    "{} '{}' (row {}) references Remote Network '{}' which does not exist and is not being imported",
                    entity_type.label(),
                    name,
                    row,
                    label
                )
            }
            ImportError::DuplicateInputRow {
                entity_type,
                name,
                first_row,
                second_row,
            } => {
                write!(
                    f,
                    "{} '{}' appears more than once in the input (rows {} and {})",
                    entity_type.label(),
                    name,
                    first_row,
                    second_row
                )
            }
            ImportError::InvalidRow {
                entity_type,
                row,
                reason,
            } => {
                write!(f, "Invalid {} row {}: {}", entity_type.label(), row, reason)
            }
            ImportError::LiveFetch(err) => write!(f, "Failed to fetch live state: {}", err),
            ImportError::Table { path, source } => {
                write!(f, "Table file '{}': {}", path.display(), source)
            }
            ImportError::Confirmation(err) => write!(f, "Confirmation failed: {}", err),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::LiveFetch(err)
            | ImportError::Table { source: err, .. }
            | ImportError::Confirmation(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_identity_names_both_ids() {
        let err = ImportError::DuplicateIdentity {
            entity_type: EntityType::RemoteNetwork,
            name: "A".to_string(),
            scope: None,
            first_id: "1".to_string(),
            second_id: "2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote Network with duplicate name found: 'A' - Ids: ['1', '2']"
        );
    }

    #[test]
    fn test_scoped_duplicate_mentions_network() {
        let err = ImportError::DuplicateIdentity {
            entity_type: EntityType::Resource,
            name: "web".to_string(),
            scope: Some("A".to_string()),
            first_id: "10".to_string(),
            second_id: "11".to_string(),
        };
        assert!(err.to_string().contains("in Remote Network 'A'"));
    }

    #[test]
    fn test_wrapped_errors_expose_source() {
        use std::error::Error;
        let err = ImportError::LiveFetch(anyhow::anyhow!("connection refused"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("connection refused"));
    }
}
