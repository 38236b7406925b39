//! Flat mapping records written by earlier releases
//!
//! ```json
//! { "code": "Item No", "split_info": { "Item No": "|" },
//!   "date_format_info": { "date": { "input": "yyyy-MM-dd", "output": "yyyyMMdd" } } }
//! ```
//!
//! Template → source pairs sit at the top level next to two reserved keys.
//! `split_info` is keyed by *source* column and gets re-keyed to the template
//! column that maps to it.

use crate::types::{ColumnMapping, DateFormatPair, DateSpec, MappingBundle, SplitSpec};
use serde_json::{Map, Value};

pub const SPLIT_KEY: &str = "split_info";
pub const DATES_KEY: &str = "date_format_info";

/// Convert a flat record. Returns the bundle plus one message per entry that
/// could not be carried over.
pub fn bundle_from_legacy(record: &Map<String, Value>) -> (MappingBundle, Vec<String>) {
    let mut warnings = Vec::new();

    let columns: ColumnMapping = record
        .iter()
        .filter(|(key, _)| key.as_str() != SPLIT_KEY && key.as_str() != DATES_KEY)
        .filter_map(|(key, value)| value.as_str().map(|src| (key.clone(), src.to_string())))
        .collect();

    let mut split = SplitSpec::new();
    if let Some(Value::Object(entries)) = record.get(SPLIT_KEY) {
        for (source_column, delimiter) in entries {
            let Some(delimiter) = delimiter.as_str() else {
                warnings.push(format!("split delimiter for '{}' is not text", source_column));
                continue;
            };
            match columns.template_for_source(source_column) {
                Some(template_column) => split.insert(template_column, delimiter),
                None => warnings.push(format!(
                    "split column '{}' is not in the mapping",
                    source_column
                )),
            }
        }
    }

    let mut dates = DateSpec::new();
    if let Some(Value::Object(entries)) = record.get(DATES_KEY) {
        for (template_column, formats) in entries {
            match serde_json::from_value::<DateFormatPair>(formats.clone()) {
                Ok(pair) if pair.is_complete() => dates.insert(template_column.clone(), pair),
                Ok(_) => warnings.push(format!(
                    "date rule for '{}' lacks input or output pattern",
                    template_column
                )),
                Err(e) => warnings.push(format!(
                    "date rule for '{}' is malformed: {}",
                    template_column, e
                )),
            }
        }
    }

    (
        MappingBundle::new(columns).with_split(split).with_dates(dates),
        warnings,
    )
}
