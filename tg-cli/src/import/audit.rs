//! Audit document for an import run
//!
//! One sheet per imported entity type with the original columns followed by
//! `importAction`, `importId` and `importError`. Sheets that were not imported
//! are copied through unchanged.

use serde_json::{Map, Value};

use super::types::{DesiredSheet, Sheet, TableDocument, TableRow, columns};

/// Serialize annotated sheets into a table document
pub fn write(sheets: &[DesiredSheet]) -> TableDocument {
    let mut document = TableDocument::new();
    for sheet in sheets {
        document.push(audit_sheet(sheet));
    }
    document
}

fn audit_sheet(sheet: &DesiredSheet) -> Sheet {
    if sheet.entity_type.is_none() {
        return Sheet {
            name: sheet.name.clone(),
            columns: sheet.columns.clone(),
            rows: sheet
                .rows
                .iter()
                .map(|r| TableRow {
                    number: r.row_number,
                    values: r.fields.clone(),
                })
                .collect(),
        };
    }

    // An audit file fed back in as input already carries the audit columns
    let mut header: Vec<String> = sheet
        .columns
        .iter()
        .filter(|c| !columns::AUDIT.contains(&c.as_str()))
        .cloned()
        .collect();
    header.extend(columns::AUDIT.iter().map(|c| c.to_string()));

    let rows = sheet
        .rows
        .iter()
        .map(|row| {
            let mut values: Map<String, Value> = row
                .fields
                .iter()
                .filter(|(k, _)| !columns::AUDIT.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            values.insert(
                columns::IMPORT_ACTION.to_string(),
                row.action
                    .map(|a| Value::String(a.as_str().to_string()))
                    .unwrap_or(Value::Null),
            );
            values.insert(
                columns::IMPORT_ID.to_string(),
                row.import_id.clone().map(Value::String).unwrap_or(Value::Null),
            );
            values.insert(
                columns::IMPORT_ERROR.to_string(),
                row.failure.clone().map(Value::String).unwrap_or(Value::Null),
            );
            TableRow {
                number: row.row_number,
                values,
            }
        })
        .collect();

    Sheet {
        name: sheet.name.clone(),
        columns: header,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::types::{DesiredRow, EntityType, ImportAction};
    use serde_json::json;

    fn desired(entity_type: Option<EntityType>, cols: &[&str], rows: Vec<Value>) -> DesiredSheet {
        DesiredSheet {
            name: "RemoteNetwork".to_string(),
            entity_type,
            columns: cols.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, v)| DesiredRow::new(i + 2, v.as_object().cloned().unwrap_or_default()))
                .collect(),
        }
    }

    #[test]
    fn test_audit_columns_appended_after_original() {
        let mut sheet = desired(
            Some(EntityType::RemoteNetwork),
            &["name", "location"],
            vec![json!({"name": "A", "location": "eu"}), json!({"name": "B"})],
        );
        sheet.rows[0].action = Some(ImportAction::Skip);
        sheet.rows[0].import_id = Some("1".to_string());
        sheet.rows[1].mark_failed("quota exceeded");

        let document = write(&[sheet]);
        let audit = document.sheet("RemoteNetwork").unwrap();

        assert_eq!(
            audit.columns,
            vec!["name", "location", "importAction", "importId", "importError"]
        );
        assert_eq!(audit.rows[0].values["importAction"], json!("SKIP"));
        assert_eq!(audit.rows[0].values["importId"], json!("1"));
        assert_eq!(audit.rows[0].values["importError"], Value::Null);
        assert_eq!(audit.rows[0].values["location"], json!("eu"));
        assert_eq!(audit.rows[1].values["importAction"], json!("FAILED"));
        assert_eq!(audit.rows[1].values["importError"], json!("quota exceeded"));
        assert_eq!(audit.rows[1].number, 3);
    }

    #[test]
    fn test_previous_audit_columns_replaced_not_duplicated() {
        let mut sheet = desired(
            Some(EntityType::RemoteNetwork),
            &["name", "importAction", "importId"],
            vec![json!({"name": "A", "importAction": "CREATE", "importId": "old"})],
        );
        sheet.rows[0].action = Some(ImportAction::Skip);
        sheet.rows[0].import_id = Some("1".to_string());

        let audit = write(&[sheet]).sheets.remove(0);

        assert_eq!(audit.columns, vec!["name", "importAction", "importId", "importError"]);
        assert_eq!(audit.rows[0].values["importAction"], json!("SKIP"));
        assert_eq!(audit.rows[0].values["importId"], json!("1"));
    }

    #[test]
    fn test_untyped_sheet_copied_unchanged() {
        let sheet = desired(None, &["name"], vec![json!({"name": "Everyone"})]);

        let audit = write(&[sheet]).sheets.remove(0);

        assert_eq!(audit.columns, vec!["name"]);
        assert_eq!(audit.rows[0].values.len(), 1);
    }
}
