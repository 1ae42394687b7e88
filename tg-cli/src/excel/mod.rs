//! Excel workbooks as table documents

pub mod reader;
pub mod writer;

use std::path::Path;

use anyhow::Result;

use crate::import::{TableCodec, TableDocument};

pub use reader::read_workbook;
pub use writer::write_workbook;

/// `.xlsx` codec backed by calamine and rust_xlsxwriter
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxCodec;

impl TableCodec for XlsxCodec {
    fn read(&self, path: &Path) -> Result<TableDocument> {
        read_workbook(path)
    }

    fn write(&self, document: &TableDocument, path: &Path) -> Result<()> {
        write_workbook(document, path)
    }
}
