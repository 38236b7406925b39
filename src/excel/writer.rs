//! Converted-table exporter: one sheet, text cells only

use crate::error::{SheetmapError, SheetmapResult};
use crate::types::Table;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::io::ErrorKind;
use std::path::Path;

/// Worksheet name used for every converted file
pub const OUTPUT_SHEET_NAME: &str = "Sheet1";

/// Excel number format that makes a cell plain text
const TEXT_NUM_FORMAT: &str = "@";

/// Writes a [`Table`] as a single-sheet workbook with every data cell in
/// text format, so values such as `00123` are never reinterpreted.
pub struct TableExporter<'a> {
    table: &'a Table,
}

impl<'a> TableExporter<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    pub fn export(&self, output_path: &Path) -> SheetmapResult<()> {
        let mut workbook = Workbook::new();
        let text = Format::new().set_num_format(TEXT_NUM_FORMAT);

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(OUTPUT_SHEET_NAME)
            .map_err(|e| SheetmapError::Export(format!("Failed to set worksheet name: {}", e)))?;

        for (col_idx, name) in self.table.columns.iter().enumerate() {
            worksheet
                .write_string(0, col_index(col_idx)?, name)
                .map_err(|e| SheetmapError::Export(format!("Failed to write header: {}", e)))?;
        }

        for (row_idx, row) in self.table.rows.iter().enumerate() {
            let excel_row = u32::try_from(row_idx + 1)
                .map_err(|_| SheetmapError::Export("Too many rows for a worksheet".to_string()))?;

            for col_idx in 0..self.table.columns.len() {
                let col = col_index(col_idx)?;
                let value = output_value(row.get(col_idx).map_or("", String::as_str));
                let written = if value.is_empty() {
                    worksheet.write_blank(excel_row, col, &text).map(|_| ())
                } else {
                    worksheet
                        .write_string_with_format(excel_row, col, value, &text)
                        .map(|_| ())
                };
                written
                    .map_err(|e| SheetmapError::Export(format!("Failed to write cell: {}", e)))?;
            }
        }

        workbook
            .save(output_path)
            .map_err(|e| save_error(output_path, e))?;

        Ok(())
    }
}

/// Text that ends up in a data cell. A bare `nan` is written as empty.
pub fn output_value(value: &str) -> &str {
    if value == "nan" {
        ""
    } else {
        value
    }
}

fn col_index(idx: usize) -> SheetmapResult<u16> {
    u16::try_from(idx)
        .map_err(|_| SheetmapError::Export("Too many columns for a worksheet".to_string()))
}

fn save_error(path: &Path, error: XlsxError) -> SheetmapError {
    match error {
        XlsxError::IoError(io) if io.kind() == ErrorKind::PermissionDenied => {
            SheetmapError::WriteConflict {
                path: path.to_path_buf(),
            }
        }
        other => SheetmapError::Export(format!(
            "Failed to save {}: {}",
            path.display(),
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    #[test]
    fn test_output_value() {
        assert_eq!(output_value("nan"), "");
        assert_eq!(output_value("NaN"), "NaN");
        assert_eq!(output_value("banana"), "banana");
    }

    #[test]
    fn test_export_writes_text_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xlsx");
        let table = Table::with_rows(
            vec!["code".into(), "qty".into(), "note".into()],
            vec![vec!["00123".into(), "4".into(), "nan".into()]],
        );

        TableExporter::new(&table).export(&path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec![OUTPUT_SHEET_NAME.to_string()]);
        let range = workbook.worksheet_range(OUTPUT_SHEET_NAME).unwrap();
        assert_eq!(range.get((0, 0)), Some(&Data::String("code".into())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("00123".into())));
        assert_eq!(range.get((1, 1)), Some(&Data::String("4".into())));
        assert!(matches!(range.get((1, 2)), None | Some(Data::Empty)));
    }

    #[test]
    fn test_permission_denied_is_write_conflict() {
        let path = Path::new("/locked/out.xlsx");
        let error = save_error(
            path,
            XlsxError::IoError(std::io::Error::from(ErrorKind::PermissionDenied)),
        );

        match error {
            SheetmapError::WriteConflict { path: reported } => assert_eq!(reported, path),
            other => panic!("expected WriteConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_other_io_errors_are_export_errors() {
        let path = Path::new("out.xlsx");
        for kind in [ErrorKind::NotFound, ErrorKind::Other] {
            let error = save_error(path, XlsxError::IoError(std::io::Error::from(kind)));
            assert!(matches!(error, SheetmapError::Export(_)), "{:?}", kind);
        }
    }

    #[test]
    fn test_export_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope").join("out.xlsx");
        let table = Table::new(vec!["a".into()]);
        assert!(matches!(
            TableExporter::new(&table).export(&path),
            Err(SheetmapError::Export(_))
        ));
    }
}
