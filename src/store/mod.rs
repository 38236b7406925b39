//! Persistent mapping bundles and template history
//!
//! Both live as pretty-printed JSON files in a store directory:
//! - `history_mappings.json`: `{ "<name>": <bundle>, ... }`
//! - `history_templates.json`: `["<template path>", ...]`
//!
//! Older flat mapping records are converted on load (see [`legacy`]) and
//! written back in the current shape on the next save.

pub mod legacy;

use crate::error::{SheetmapError, SheetmapResult};
use crate::types::MappingBundle;
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const MAPPINGS_FILE: &str = "history_mappings.json";
pub const TEMPLATES_FILE: &str = "history_templates.json";

/// Named mapping bundles, in the order they were first saved
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
    bundles: IndexMap<String, MappingBundle>,
}

impl MappingStore {
    /// Load the store from `dir`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(dir: P) -> SheetmapResult<Self> {
        let path = dir.as_ref().join(MAPPINGS_FILE);
        let bundles = if path.exists() {
            let content = fs::read_to_string(&path)?;
            parse_store(&content)?
        } else {
            IndexMap::new()
        };
        Ok(Self { path, bundles })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    pub fn get(&self, name: &str) -> SheetmapResult<&MappingBundle> {
        self.bundles.get(name).ok_or_else(|| SheetmapError::NotFound {
            kind: "Mapping",
            name: name.to_string(),
        })
    }

    /// Add or replace a bundle. Date rules lacking a pattern are not kept.
    pub fn insert(&mut self, name: impl Into<String>, mut bundle: MappingBundle) {
        bundle.dates.retain_complete();
        self.bundles.insert(name.into(), bundle);
    }

    pub fn remove(&mut self, name: &str) -> SheetmapResult<MappingBundle> {
        self.bundles
            .shift_remove(name)
            .ok_or_else(|| SheetmapError::NotFound {
                kind: "Mapping",
                name: name.to_string(),
            })
    }

    pub fn save(&self) -> SheetmapResult<()> {
        write_json(&self.path, &serde_json::to_string_pretty(&self.bundles)?)
    }
}

/// Template workbooks used before, most recent last, without duplicates
#[derive(Debug, Clone)]
pub struct TemplateHistory {
    path: PathBuf,
    entries: Vec<String>,
}

impl TemplateHistory {
    pub fn open<P: AsRef<Path>>(dir: P) -> SheetmapResult<Self> {
        let path = dir.as_ref().join(TEMPLATES_FILE);
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            Vec::new()
        };
        Ok(Self { path, entries })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Remember a template path. Returns false if it was already known.
    pub fn record(&mut self, template: &Path) -> bool {
        let entry = template.display().to_string();
        if self.entries.contains(&entry) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn save(&self) -> SheetmapResult<()> {
        write_json(&self.path, &serde_json::to_string_pretty(&self.entries)?)
    }
}

/// Load a single bundle from a `.yaml`/`.yml` or `.json` file
pub fn load_bundle_file<P: AsRef<Path>>(path: P) -> SheetmapResult<MappingBundle> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let mut bundle = match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str::<MappingBundle>(&content)?,
        Some("json") => parse_bundle(&serde_json::from_str(&content)?)?,
        _ => {
            return Err(SheetmapError::Store(format!(
                "Unsupported mapping file {} (expected .yaml, .yml or .json)",
                path.display()
            )))
        }
    };
    bundle.dates.retain_complete();
    Ok(bundle)
}

fn parse_store(content: &str) -> SheetmapResult<IndexMap<String, MappingBundle>> {
    let value: Value = serde_json::from_str(content)?;
    let mut bundles = IndexMap::new();

    match value {
        // The oldest format was an unnamed list of records
        Value::Array(records) => {
            for (i, record) in records.iter().enumerate() {
                bundles.insert(format!("mapping_{}", i), parse_bundle(record)?);
            }
        }
        Value::Object(named) => {
            for (name, record) in &named {
                bundles.insert(name.clone(), parse_bundle(record)?);
            }
        }
        _ => {
            return Err(SheetmapError::Store(
                "Mapping store must be a JSON object".to_string(),
            ))
        }
    }

    Ok(bundles)
}

fn parse_bundle(record: &Value) -> SheetmapResult<MappingBundle> {
    let Value::Object(map) = record else {
        return Err(SheetmapError::Store(
            "Mapping record must be a JSON object".to_string(),
        ));
    };

    if map.get("columns").is_some_and(Value::is_object) {
        return Ok(serde_json::from_value(record.clone())?);
    }

    let (bundle, warnings) = legacy::bundle_from_legacy(map);
    for message in warnings {
        warn!("legacy mapping: {}", message);
    }
    Ok(bundle)
}

fn write_json(path: &Path, content: &str) -> SheetmapResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, content)?;
    Ok(())
}
