//! Final projection onto the template schema

use crate::types::{Table, TemplateSchema};
use tracing::debug;

/// Add every template column the table lacks (as empty cells), then project
/// to exactly the template's column sequence. Extra columns are dropped.
pub fn complete_schema(mut table: Table, schema: &TemplateSchema) -> Table {
    for column in schema.columns() {
        if !table.has_column(column) {
            debug!(column = %column, "adding empty template column");
            table.add_column(column.as_str(), "");
        }
    }

    let indices: Vec<usize> = schema
        .columns()
        .iter()
        .filter_map(|column| table.column_index(column))
        .collect();

    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            indices
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Table::with_rows(schema.columns().to_vec(), rows)
}
