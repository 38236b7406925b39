//! CLI command handlers

pub mod commands;

pub use commands::{
    convert, formats, headers, mapping_delete, mapping_list, mapping_save, mapping_show,
    templates, RuleArgs, RuleSource,
};
