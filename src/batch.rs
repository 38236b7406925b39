//! Batch conversion over many workbooks
//!
//! Every worksheet of every file goes through the same [`ConversionPlan`].
//! Failures stay as small as possible: a bad row is kept unsplit, a bad sheet
//! is skipped, an unreadable file is reported. The batch always carries on
//! with whatever is left.

use crate::error::{RowWarning, SheetError, SheetmapError, SheetmapResult};
use crate::excel::{TableExporter, WorkbookReader};
use crate::transform::{ConversionPlan, DateStats};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, info_span, warn};

/// What happened to one worksheet
#[derive(Debug)]
pub enum SheetStatus {
    Converted(ConvertedSheet),
    Skipped(SheetError),
}

#[derive(Debug)]
pub struct ConvertedSheet {
    pub output: PathBuf,
    pub source_rows: usize,
    pub output_rows: usize,
    pub expanded_rows: usize,
    pub dates: DateStats,
    pub warnings: Vec<RowWarning>,
}

#[derive(Debug)]
pub struct SheetReport {
    pub file: PathBuf,
    pub sheet: String,
    pub status: SheetStatus,
}

/// A file that could not be opened at all
#[derive(Debug)]
pub struct FileFailure {
    pub file: PathBuf,
    pub error: SheetmapError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub sheets: Vec<SheetReport>,
    pub failed_files: Vec<FileFailure>,
}

impl BatchReport {
    pub fn converted(&self) -> impl Iterator<Item = (&SheetReport, &ConvertedSheet)> {
        self.sheets.iter().filter_map(|report| match &report.status {
            SheetStatus::Converted(sheet) => Some((report, sheet)),
            SheetStatus::Skipped(_) => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&SheetReport, &SheetError)> {
        self.sheets.iter().filter_map(|report| match &report.status {
            SheetStatus::Skipped(err) => Some((report, err)),
            SheetStatus::Converted(_) => None,
        })
    }

    pub fn converted_count(&self) -> usize {
        self.converted().count()
    }

    pub fn warning_count(&self) -> usize {
        self.converted().map(|(_, sheet)| sheet.warnings.len()).sum()
    }

    /// True when there was input but not a single sheet could be written
    pub fn nothing_converted(&self) -> bool {
        self.converted_count() == 0 && (!self.sheets.is_empty() || !self.failed_files.is_empty())
    }
}

/// Runs a [`ConversionPlan`] over source files, writing into one directory
pub struct BatchRunner<'a> {
    plan: &'a ConversionPlan,
    output_dir: PathBuf,
}

impl<'a> BatchRunner<'a> {
    pub fn new(plan: &'a ConversionPlan, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            plan,
            output_dir: output_dir.into(),
        }
    }

    /// Convert every sheet of every file. Only a missing, uncreatable output
    /// directory aborts the run.
    pub fn run(&self, files: &[PathBuf]) -> SheetmapResult<BatchReport> {
        fs::create_dir_all(&self.output_dir)?;

        let mut report = BatchReport::default();
        for file in files {
            if let Err(e) = self.convert_file(file, &mut report) {
                error!(file = %file.display(), "{}", e);
                report.failed_files.push(FileFailure {
                    file: file.clone(),
                    error: e,
                });
            }
        }
        Ok(report)
    }

    fn convert_file(&self, file: &Path, report: &mut BatchReport) -> SheetmapResult<()> {
        let mut workbook = WorkbookReader::open(file)?;
        let sheet_names = workbook.sheet_names();
        let multi_sheet = sheet_names.len() > 1;

        for sheet in &sheet_names {
            let _span = info_span!("sheet", file = %file.display(), sheet = %sheet).entered();

            let status = match self.convert_sheet(&mut workbook, file, sheet, multi_sheet) {
                Ok(converted) => {
                    info!(
                        output = %converted.output.display(),
                        rows = converted.output_rows,
                        "converted"
                    );
                    SheetStatus::Converted(converted)
                }
                Err(e) => {
                    warn!("skipped: {}", e);
                    SheetStatus::Skipped(e)
                }
            };

            report.sheets.push(SheetReport {
                file: file.to_path_buf(),
                sheet: sheet.clone(),
                status,
            });
        }
        Ok(())
    }

    fn convert_sheet(
        &self,
        workbook: &mut WorkbookReader,
        file: &Path,
        sheet: &str,
        multi_sheet: bool,
    ) -> Result<ConvertedSheet, SheetError> {
        let source = workbook
            .read_sheet(sheet)
            .map_err(|e| SheetError::Unreadable(e.to_string()))?;

        let out = self.plan.apply(&source)?;

        let output = self
            .output_dir
            .join(output_file_name(file, sheet, multi_sheet));
        TableExporter::new(&out.table).export(&output)?;

        Ok(ConvertedSheet {
            output,
            source_rows: out.source_rows,
            output_rows: out.table.row_count(),
            expanded_rows: out.expanded_rows,
            dates: out.dates,
            warnings: out.warnings,
        })
    }
}

/// `<source-basename>[_<sheet>].xlsx`; the sheet suffix only appears for
/// multi-sheet workbooks. Path separators in sheet names become `_`.
pub fn output_file_name(source: &Path, sheet: &str, multi_sheet: bool) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    if multi_sheet {
        let sheet: String = sheet
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        format!("{}_{}.xlsx", stem, sheet)
    } else {
        format!("{}.xlsx", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name_single_sheet() {
        assert_eq!(
            output_file_name(Path::new("/in/orders.xls"), "Sheet1", false),
            "orders.xlsx"
        );
    }

    #[test]
    fn test_output_file_name_multi_sheet() {
        assert_eq!(
            output_file_name(Path::new("in/orders.2025.xlsx"), "Jan", true),
            "orders.2025_Jan.xlsx"
        );
        assert_eq!(
            output_file_name(Path::new("orders.xlsx"), "a/b", true),
            "orders_a_b.xlsx"
        );
    }

    #[test]
    fn test_empty_report_is_not_a_failure() {
        assert!(!BatchReport::default().nothing_converted());
    }
}
