//! Spreadsheet import/export
//!
//! - Import: any workbook calamine understands → text [`Table`](crate::types::Table)s
//! - Export: converted table → single-sheet .xlsx with text-formatted cells

mod reader;
mod writer;

pub use reader::{cell_text, list_headers, range_to_table, read_template, WorkbookReader};
pub use writer::{output_value, TableExporter, OUTPUT_SHEET_NAME};
