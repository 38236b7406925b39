use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

//==============================================================================
// Tables
//==============================================================================

/// An in-memory sheet: ordered header plus rows of text cells.
///
/// Every cell is text. Blank and null cells are the empty string. Rows may be
/// shorter than the header when built by hand; the pipeline stages read a
/// missing cell as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact (case-sensitive) name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// All values of one column; cells missing from short rows read as ""
    pub fn column_values(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map_or("", String::as_str))
                .collect(),
        )
    }

    /// Append a column holding `fill` in every row
    pub fn add_column(&mut self, name: impl Into<String>, fill: &str) {
        let width = self.columns.len();
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.resize(width, String::new());
            row.push(fill.to_string());
        }
    }
}

//==============================================================================
// Template schema
//==============================================================================

/// The output contract: column names in their required order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateSchema {
    columns: Vec<String>,
}

impl TemplateSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Vec<&str>> for TemplateSchema {
    fn from(columns: Vec<&str>) -> Self {
        Self::new(columns.into_iter().map(String::from).collect())
    }
}

//==============================================================================
// Mapping bundle
//==============================================================================

/// Template column → source column, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(IndexMap<String, String>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template_column: impl Into<String>, source_column: impl Into<String>) {
        self.0.insert(template_column.into(), source_column.into());
    }

    pub fn get(&self, template_column: &str) -> Option<&str> {
        self.0.get(template_column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn template_columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Template column mapped to `source_column`, compared trimmed and case-insensitively
    pub fn template_for_source(&self, source_column: &str) -> Option<&str> {
        let wanted = source_column.trim().to_lowercase();
        self.0
            .iter()
            .find(|(_, src)| src.trim().to_lowercase() == wanted)
            .map(|(tpl, _)| tpl.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Template column → literal delimiter that triggers row expansion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitSpec(IndexMap<String, String>);

impl SplitSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template_column: impl Into<String>, delimiter: impl Into<String>) {
        self.0.insert(template_column.into(), delimiter.into());
    }

    pub fn get(&self, template_column: &str) -> Option<&str> {
        self.0.get(template_column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SplitSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Input and output pattern for one date column, in token syntax (`yyyy-MM-dd`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFormatPair {
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub output: String,
}

impl DateFormatPair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Only pairs with both patterns take part in conversion
    pub fn is_complete(&self) -> bool {
        !self.input.is_empty() && !self.output.is_empty()
    }
}

/// Template column → date reformatting rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateSpec(IndexMap<String, DateFormatPair>);

impl DateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template_column: impl Into<String>, formats: DateFormatPair) {
        self.0.insert(template_column.into(), formats);
    }

    pub fn get(&self, template_column: &str) -> Option<&DateFormatPair> {
        self.0.get(template_column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DateFormatPair)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop entries that lack one of the two patterns
    pub fn retain_complete(&mut self) {
        self.0.retain(|_, pair| pair.is_complete());
    }
}

/// A named, reusable set of conversion rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingBundle {
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default, skip_serializing_if = "SplitSpec::is_empty")]
    pub split: SplitSpec,
    #[serde(default, skip_serializing_if = "DateSpec::is_empty")]
    pub dates: DateSpec,
}

impl MappingBundle {
    pub fn new(columns: ColumnMapping) -> Self {
        Self {
            columns,
            ..Default::default()
        }
    }

    pub fn with_split(mut self, split: SplitSpec) -> Self {
        self.split = split;
        self
    }

    pub fn with_dates(mut self, dates: DateSpec) -> Self {
        self.dates = dates;
        self
    }

    /// Check every rule names a template column. Returns the offending keys.
    pub fn unknown_columns(&self, schema: &TemplateSchema) -> Vec<String> {
        let mut unknown: Vec<String> = Vec::new();
        let keys = self
            .columns
            .template_columns()
            .chain(self.split.iter().map(|(k, _)| k))
            .chain(self.dates.iter().map(|(k, _)| k));
        for key in keys {
            if !schema.contains(key) && !unknown.iter().any(|u| u == key) {
                unknown.push(key.to_string());
            }
        }
        unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_add_column_pads_short_rows() {
        let mut table = Table::with_rows(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()], vec!["2".into(), "3".into()]],
        );
        table.add_column("c", "");

        assert_eq!(table.columns, vec!["a", "b", "c"]);
        assert_eq!(table.rows[0], vec!["1", "", ""]);
        assert_eq!(table.rows[1], vec!["2", "3", ""]);
    }

    #[test]
    fn test_table_column_lookup() {
        let table = Table::with_rows(
            vec!["id".into(), "name".into()],
            vec![vec!["00123".into()]],
        );
        assert_eq!(table.column_values("id"), Some(vec!["00123"]));
        assert_eq!(table.column_values("name"), Some(vec![""]));
        assert_eq!(table.column_values("ID"), None);
        assert!(!table.has_column("ID"));
    }

    #[test]
    fn test_column_mapping_keeps_insertion_order() {
        let mapping: ColumnMapping = vec![("z", "Z"), ("a", "A"), ("m", "M")]
            .into_iter()
            .collect();
        let keys: Vec<&str> = mapping.template_columns().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_template_for_source_is_case_insensitive() {
        let mapping: ColumnMapping = vec![("Code", " Item Code ")].into_iter().collect();
        assert_eq!(mapping.template_for_source("item code"), Some("Code"));
        assert_eq!(mapping.template_for_source("other"), None);
    }

    #[test]
    fn test_date_spec_retain_complete() {
        let mut dates = DateSpec::new();
        dates.insert("a", DateFormatPair::new("yyyy-MM-dd", "yyyyMMdd"));
        dates.insert("b", DateFormatPair::new("yyyy-MM-dd", ""));
        dates.retain_complete();
        assert_eq!(dates.len(), 1);
        assert!(dates.get("a").is_some());
    }

    #[test]
    fn test_unknown_columns() {
        let schema = TemplateSchema::from(vec!["id", "name"]);
        let bundle = MappingBundle::new(vec![("id", "ID"), ("nme", "Name")].into_iter().collect())
            .with_split(vec![("tags", ",")].into_iter().collect());
        assert_eq!(bundle.unknown_columns(&schema), vec!["nme", "tags"]);
    }

    #[test]
    fn test_bundle_json_shape() {
        let bundle = MappingBundle::new(vec![("id", "ID")].into_iter().collect());
        let json = serde_json::to_string(&bundle).unwrap();
        assert_eq!(json, r#"{"columns":{"id":"ID"}}"#);
    }
}
