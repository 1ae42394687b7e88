//! Read workbooks into table documents

use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook};
use serde_json::{Map, Value, json};

use crate::import::{Sheet, TableDocument, TableRow};

/// Read every worksheet. The first row of a sheet is its header; fully blank
/// rows are dropped but keep their place in the row numbering.
pub fn read_workbook(path: &Path) -> Result<TableDocument> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open Excel file: {}", path.display()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut document = TableDocument::new();

    for sheet_name in sheet_names {
        let range = workbook
            .worksheet_range(&sheet_name)
            .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

        // 1-based row number of the header
        let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
        let mut rows = range.rows();

        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .map(|c| match c {
                    Data::String(s) => s.trim().to_string(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect(),
            None => {
                document.push(Sheet::new(sheet_name, Vec::new()));
                continue;
            }
        };

        let mut sheet = Sheet::new(
            sheet_name.clone(),
            headers.iter().filter(|h| !h.is_empty()).cloned().collect(),
        );

        for (offset, row) in rows.enumerate() {
            let mut values = Map::new();
            for (col, cell) in row.iter().enumerate() {
                let header = headers.get(col).map(|s| s.as_str()).unwrap_or("");
                if header.is_empty() {
                    continue;
                }
                let value = cell_to_value(cell);
                if !value.is_null() {
                    values.insert(header.to_string(), value);
                }
            }

            if values.is_empty() {
                continue;
            }
            sheet.rows.push(TableRow {
                number: header_row + offset + 1,
                values,
            });
        }

        log::debug!("Read {} row(s) from sheet '{}'", sheet.rows.len(), sheet_name);
        document.push(sheet);
    }

    Ok(document)
}

/// Convert an Excel cell to a JSON value; blanks become `Null`
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => json!(*i),
        Data::Float(f) => {
            // Whole numbers come back as integers
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                json!(*f as i64)
            } else {
                json!(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::String(format!("{}", dt)),
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_to_value() {
        assert_eq!(cell_to_value(&Data::Float(3.0)), json!(3));
        assert_eq!(cell_to_value(&Data::Float(2.5)), json!(2.5));
        assert_eq!(cell_to_value(&Data::String("  ".to_string())), Value::Null);
        assert_eq!(cell_to_value(&Data::String("web".to_string())), json!("web"));
        assert_eq!(cell_to_value(&Data::Empty), Value::Null);
        assert_eq!(cell_to_value(&Data::Bool(true)), json!(true));
    }
}
