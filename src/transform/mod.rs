//! Template conversion pipeline
//!
//! A [`ConversionPlan`] is built once per batch from the template schema and
//! a [`MappingBundle`], then applied to each source sheet:
//!
//! 1. [`select_columns`] projects mapped source columns into template names
//! 2. [`split_rows`] expands delimiter-joined cells into extra rows
//! 3. [`DateNormalizer`] reformats date columns
//! 4. [`complete_schema`] adds missing template columns and fixes the order
//!
//! # Example
//!
//! ```
//! use sheetmap::transform::ConversionPlan;
//! use sheetmap::types::{MappingBundle, Table, TemplateSchema};
//!
//! let schema = TemplateSchema::from(vec!["code", "qty", "note"]);
//! let bundle = MappingBundle::new(vec![("code", "Code"), ("qty", "Qty")].into_iter().collect())
//!     .with_split(vec![("code", "|")].into_iter().collect());
//! let plan = ConversionPlan::new(schema, bundle)?;
//!
//! let source = Table::with_rows(
//!     vec!["Qty".into(), "Code".into()],
//!     vec![vec!["5".into(), "A|B".into()]],
//! );
//! let out = plan.apply(&source).unwrap();
//! assert_eq!(out.table.rows, vec![vec!["A", "5", ""], vec!["B", "5", ""]]);
//! # Ok::<(), sheetmap::SheetmapError>(())
//! ```

mod completer;
mod dates;
mod selector;
mod splitter;

pub use completer::complete_schema;
pub use dates::{
    normalize_value, to_strftime, DateNormalizer, DatePattern, DateStats, PRESET_PATTERNS,
};
pub use selector::select_columns;
pub use splitter::{split_rows, split_value, SplitOutcome};

use crate::error::{RowWarning, SheetError, SheetmapError, SheetmapResult};
use crate::types::{ColumnMapping, MappingBundle, SplitSpec, Table, TemplateSchema};
use tracing::{debug, info};

/// Immutable conversion settings shared by every sheet of a batch
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    schema: TemplateSchema,
    mapping: ColumnMapping,
    split: SplitSpec,
    dates: DateNormalizer,
}

/// A converted sheet and what happened along the way
#[derive(Debug, Clone)]
pub struct SheetOutput {
    pub table: Table,
    pub warnings: Vec<RowWarning>,
    pub source_rows: usize,
    pub expanded_rows: usize,
    pub dates: DateStats,
}

impl ConversionPlan {
    /// Build a plan. Fails when the schema is empty, when a rule names a
    /// column outside the template, or when a date pattern is malformed.
    pub fn new(schema: TemplateSchema, bundle: MappingBundle) -> SheetmapResult<Self> {
        if schema.is_empty() {
            return Err(SheetmapError::Validation(
                "Template has no columns".to_string(),
            ));
        }

        let unknown = bundle.unknown_columns(&schema);
        if !unknown.is_empty() {
            return Err(SheetmapError::Validation(format!(
                "Mapping refers to columns not in the template: {}",
                unknown.join(", ")
            )));
        }

        let dates = DateNormalizer::new(&bundle.dates)?;

        Ok(Self {
            schema,
            mapping: bundle.columns,
            split: bundle.split,
            dates,
        })
    }

    pub fn schema(&self) -> &TemplateSchema {
        &self.schema
    }

    pub fn mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    /// Run all four stages against one source sheet
    pub fn apply(&self, source: &Table) -> Result<SheetOutput, SheetError> {
        let selected = select_columns(source, &self.mapping)?;
        let source_rows = selected.row_count();
        debug!(columns = ?selected.columns, rows = source_rows, "selected mapped columns");

        let SplitOutcome {
            table: mut working,
            warnings,
            expanded_rows,
        } = if self.split.is_empty() {
            SplitOutcome {
                table: selected,
                ..Default::default()
            }
        } else {
            split_rows(selected, &self.split)
        };
        if expanded_rows > 0 {
            info!(
                expanded_rows,
                total_rows = working.row_count(),
                "split complete"
            );
        }

        let dates = self.dates.apply(&mut working);
        let table = complete_schema(working, &self.schema);

        Ok(SheetOutput {
            table,
            warnings,
            source_rows,
            expanded_rows,
            dates,
        })
    }
}
