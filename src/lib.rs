//! Sheetmap - template-driven spreadsheet remapping
//!
//! This library converts arbitrary source workbooks into a fixed template
//! layout: mapped columns are renamed, delimiter-joined cells are expanded
//! into extra rows, date columns are reformatted, and the result always has
//! exactly the template's columns in the template's order.
//!
//! # Features
//!
//! - Column mapping by literal, case-sensitive header names
//! - Row expansion on per-column delimiters (zip-longest, empty fill)
//! - Date reformatting with `yyyy-MM-dd` style patterns
//! - Text-only output cells, so leading zeros survive
//! - Named, reusable mapping bundles stored as JSON
//!
//! # Example
//!
//! ```no_run
//! use sheetmap::batch::BatchRunner;
//! use sheetmap::excel::read_template;
//! use sheetmap::store::MappingStore;
//! use sheetmap::transform::ConversionPlan;
//! use std::path::PathBuf;
//!
//! let schema = read_template("template.xlsx")?;
//! let store = MappingStore::open(".")?;
//! let plan = ConversionPlan::new(schema, store.get("orders")?.clone())?;
//!
//! let report = BatchRunner::new(&plan, "out").run(&[PathBuf::from("march.xlsx")])?;
//! println!("Converted: {}", report.converted_count());
//! # Ok::<(), sheetmap::error::SheetmapError>(())
//! ```

pub mod batch;
pub mod cli;
pub mod error;
pub mod excel;
pub mod store;
pub mod transform;
pub mod types;

// Re-export commonly used types
pub use error::{RowWarning, SheetError, SheetmapError, SheetmapResult};
pub use types::{
    ColumnMapping, DateFormatPair, DateSpec, MappingBundle, SplitSpec, Table, TemplateSchema,
};
