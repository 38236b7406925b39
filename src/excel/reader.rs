//! Workbook reader - every cell comes back as text

use crate::error::{SheetmapError, SheetmapResult};
use crate::types::{Table, TemplateSchema};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// An open workbook (.xlsx, .xlsm, .xls, .xlsb or .ods)
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookReader {
    /// Open a workbook, detecting the format from its extension
    pub fn open<P: AsRef<Path>>(path: P) -> SheetmapResult<Self> {
        let path = path.as_ref().to_path_buf();
        let workbook = open_workbook_auto(&path).map_err(|e| SheetmapError::workbook(&path, e))?;
        Ok(Self { path, workbook })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// Read one worksheet. The first row is the header.
    pub fn read_sheet(&mut self, sheet_name: &str) -> SheetmapResult<Table> {
        let range = self.workbook.worksheet_range(sheet_name).map_err(|e| {
            SheetmapError::workbook(&self.path, format!("sheet '{}': {}", sheet_name, e))
        })?;
        Ok(range_to_table(&range))
    }

    /// Read the first worksheet
    pub fn read_first_sheet(&mut self) -> SheetmapResult<Table> {
        let first = self
            .sheet_names()
            .into_iter()
            .next()
            .ok_or_else(|| SheetmapError::workbook(&self.path, "workbook contains no sheets"))?;
        self.read_sheet(&first)
    }
}

/// Load the template schema: the header row of the first worksheet
pub fn read_template<P: AsRef<Path>>(path: P) -> SheetmapResult<TemplateSchema> {
    let columns = list_headers(&path)?;
    if columns.is_empty() {
        return Err(SheetmapError::Validation(format!(
            "Template {} has no header row",
            path.as_ref().display()
        )));
    }
    Ok(TemplateSchema::new(columns))
}

/// Header names of the first worksheet
pub fn list_headers<P: AsRef<Path>>(path: P) -> SheetmapResult<Vec<String>> {
    let mut reader = WorkbookReader::open(path)?;
    Ok(reader.read_first_sheet()?.columns)
}

/// Convert a calamine range to a text table, first row as header
pub fn range_to_table(range: &Range<Data>) -> Table {
    if range.is_empty() {
        return Table::default();
    }

    let mut rows = range.rows();
    let header = rows
        .next()
        .map(|cells| cells.iter().map(cell_text).collect())
        .unwrap_or_default();

    let mut table = Table::new(normalize_headers(header));
    for cells in rows {
        table.push_row(cells.iter().map(cell_text).collect());
    }
    table
}

/// Render a cell as text without numeric coercion.
///
/// Whole floats lose their `.0` so `123` stays `123`; text such as `00123` is
/// untouched.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };
        let mut candidate = base.clone();
        let mut n = 0;
        while out.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", base, n);
        }
        out.push(candidate);
    }
    out
}
