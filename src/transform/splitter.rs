//! Delimiter-driven row expansion
//!
//! Each flagged cell is split on its literal delimiter. A row expands to as
//! many rows as its longest piece list; shorter lists are padded with empty
//! strings (zip-longest, never a cross product). Columns that are not split
//! are copied unchanged into every emitted row.

use crate::error::RowWarning;
use crate::types::{SplitSpec, Table};
use tracing::{debug, warn};

/// Result of splitting a whole table
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub table: Table,
    pub warnings: Vec<RowWarning>,
    /// Source rows that produced more than one output row
    pub expanded_rows: usize,
}

struct SplitTarget<'a> {
    index: usize,
    column: &'a str,
    delimiter: &'a str,
}

/// Expand every row of `table` according to `spec`.
pub fn split_rows(table: Table, spec: &SplitSpec) -> SplitOutcome {
    let mut warnings = Vec::new();
    let mut targets = Vec::with_capacity(spec.len());

    for (column, delimiter) in spec.iter() {
        match table.column_index(column) {
            Some(index) => targets.push(SplitTarget {
                index,
                column,
                delimiter,
            }),
            None => {
                warn!(column, "split column not among mapped columns, ignoring");
                warnings.push(RowWarning::UnknownSplitColumn {
                    column: column.to_string(),
                });
            }
        }
    }

    if targets.is_empty() {
        return SplitOutcome {
            table,
            warnings,
            expanded_rows: 0,
        };
    }

    let Table { columns, rows } = table;
    let mut out_rows = Vec::with_capacity(rows.len());
    let mut expanded_rows = 0;

    for (row_idx, row) in rows.into_iter().enumerate() {
        match split_row(row_idx, &row, &targets, &mut warnings) {
            Ok(expanded) => {
                if expanded.len() > 1 {
                    debug!(row = row_idx, count = expanded.len(), "row split");
                    expanded_rows += 1;
                }
                out_rows.extend(expanded);
            }
            Err(warning) => {
                warn!(row = row_idx, "{}", warning);
                warnings.push(warning);
                out_rows.push(row);
            }
        }
    }

    SplitOutcome {
        table: Table::with_rows(columns, out_rows),
        warnings,
        expanded_rows,
    }
}

fn split_row(
    row_idx: usize,
    row: &[String],
    targets: &[SplitTarget<'_>],
    warnings: &mut Vec<RowWarning>,
) -> Result<Vec<Vec<String>>, RowWarning> {
    let mut split_columns: Vec<(usize, Vec<String>)> = Vec::with_capacity(targets.len());

    for target in targets {
        let Some(value) = row.get(target.index) else {
            let warning = RowWarning::ColumnAbsent {
                row: row_idx,
                column: target.column.to_string(),
            };
            warn!(row = row_idx, "{}", warning);
            warnings.push(warning);
            continue;
        };

        let pieces =
            split_value(value, target.delimiter).map_err(|reason| RowWarning::SplitFailed {
                row: row_idx,
                column: target.column.to_string(),
                reason,
            })?;
        split_columns.push((target.index, pieces));
    }

    let width = split_columns
        .iter()
        .map(|(_, pieces)| pieces.len())
        .max()
        .unwrap_or(1)
        .max(1);

    if width == 1 {
        return Ok(vec![row.to_vec()]);
    }

    Ok(zip_longest(row, &split_columns, width))
}

/// Emit `width` copies of `row`; copy `i` takes piece `i` of every split
/// column, or "" once a column has run out of pieces.
fn zip_longest(row: &[String], split_columns: &[(usize, Vec<String>)], width: usize) -> Vec<Vec<String>> {
    (0..width)
        .map(|i| {
            let mut out = row.to_vec();
            for (index, pieces) in split_columns {
                out[*index] = pieces.get(i).cloned().unwrap_or_default();
            }
            out
        })
        .collect()
}

/// Split one cell on a literal delimiter.
///
/// Pieces are trimmed of whitespace and of delimiter characters at either
/// end; empty pieces are dropped. An empty cell is one empty piece. A
/// non-empty cell with no surviving pieces is kept whole.
pub fn split_value(value: &str, delimiter: &str) -> Result<Vec<String>, String> {
    if delimiter.is_empty() {
        return Err("empty delimiter".to_string());
    }
    if value.is_empty() {
        return Ok(vec![String::new()]);
    }

    let pieces: Vec<String> = value
        .split(delimiter)
        .map(|piece| {
            piece
                .trim()
                .trim_matches(|c| delimiter.contains(c))
                .trim()
        })
        .filter(|piece| !piece.is_empty())
        .map(String::from)
        .collect();

    if pieces.is_empty() {
        Ok(vec![value.to_string()])
    } else {
        Ok(pieces)
    }
}
