//! Column projection: source sheet → mapped template columns

use crate::error::SheetError;
use crate::types::{ColumnMapping, Table};

/// Project `source` onto the mapped columns, renamed to their template names.
///
/// Columns come out in mapping insertion order. If any mapped source column
/// is absent, every missing name is reported and nothing is projected.
pub fn select_columns(source: &Table, mapping: &ColumnMapping) -> Result<Table, SheetError> {
    let mut indices = Vec::with_capacity(mapping.len());
    let mut missing = Vec::new();

    for (_, source_column) in mapping.iter() {
        match source.column_index(source_column) {
            Some(idx) => indices.push(idx),
            None => missing.push(source_column.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(SheetError::MissingColumns { missing });
    }

    let columns = mapping.template_columns().map(String::from).collect();
    let rows = source
        .rows
        .iter()
        .map(|row| {
            indices
                .iter()
                .map(|&idx| row.get(idx).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(Table::with_rows(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn source() -> Table {
        Table::with_rows(
            vec!["Item No".into(), "Desc".into(), "Qty".into()],
            vec![
                vec!["00123".into(), "Bolt".into(), "4".into()],
                vec!["00124".into(), "Nut".into(), "10".into()],
            ],
        )
    }

    #[test]
    fn test_select_renames_and_orders_by_mapping() {
        let mapping: ColumnMapping = vec![("quantity", "Qty"), ("code", "Item No")]
            .into_iter()
            .collect();

        let table = select_columns(&source(), &mapping).unwrap();

        assert_eq!(table.columns, vec!["quantity", "code"]);
        assert_eq!(
            table.rows,
            vec![vec!["4", "00123"], vec!["10", "00124"]]
        );
    }

    #[test]
    fn test_select_reports_every_missing_column() {
        let mapping: ColumnMapping = vec![("a", "Nope"), ("b", "Desc"), ("c", "Gone")]
            .into_iter()
            .collect();

        match select_columns(&source(), &mapping) {
            Err(SheetError::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["Nope", "Gone"]);
            }
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn test_select_is_case_sensitive() {
        let mapping: ColumnMapping = vec![("qty", "qty")].into_iter().collect();
        assert!(select_columns(&source(), &mapping).is_err());
    }

    #[test]
    fn test_select_same_source_twice() {
        let mapping: ColumnMapping = vec![("code", "Item No"), ("code_copy", "Item No")]
            .into_iter()
            .collect();
        let table = select_columns(&source(), &mapping).unwrap();
        assert_eq!(table.rows[0], vec!["00123", "00123"]);
    }

    #[test]
    fn test_select_empty_mapping_keeps_row_count() {
        let table = select_columns(&source(), &ColumnMapping::new()).unwrap();
        assert!(table.columns.is_empty());
        assert_eq!(table.row_count(), 2);
    }
}
