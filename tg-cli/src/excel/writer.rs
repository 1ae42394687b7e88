//! Write table documents to workbooks

use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::Value;

use crate::import::{Sheet, TableDocument};

/// Write one worksheet per sheet, in document order
pub fn write_workbook(document: &TableDocument, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for sheet in &document.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_sheet(worksheet, sheet, &header_format)
            .with_context(|| format!("Failed to write sheet: {}", sheet.name))?;
    }

    // An xlsx file needs at least one worksheet
    if document.sheets.is_empty() {
        workbook.add_worksheet();
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    Ok(())
}

fn write_sheet(ws: &mut Worksheet, sheet: &Sheet, header_format: &Format) -> Result<()> {
    for (col, name) in sheet.columns.iter().enumerate() {
        ws.write_string_with_format(0, col as u16, name, header_format)?;
    }

    for (row_idx, record) in sheet.rows.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, name) in sheet.columns.iter().enumerate() {
            if let Some(value) = record.values.get(name) {
                write_value(ws, row, col as u16, value)?;
            }
        }
    }

    if !sheet.columns.is_empty() {
        let last_col = (sheet.columns.len() - 1) as u16;
        ws.autofilter(0, 0, sheet.rows.len() as u32, last_col)?;
        ws.set_freeze_panes(1, 0)?;
    }
    Ok(())
}

fn write_value(ws: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => { /* Leave cell empty */ }
        Value::String(s) => { ws.write_string(row, col, s)?; }
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                ws.write_number(row, col, f)?;
            }
        }
        Value::Bool(b) => { ws.write_boolean(row, col, *b)?; }
        other => { ws.write_string(row, col, other.to_string())?; }
    }
    Ok(())
}
