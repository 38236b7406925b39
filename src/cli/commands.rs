use crate::batch::{BatchReport, BatchRunner, SheetStatus};
use crate::error::{SheetmapError, SheetmapResult};
use crate::excel::{list_headers, read_template};
use crate::store::{load_bundle_file, MappingStore, TemplateHistory};
use crate::transform::{ConversionPlan, DateNormalizer, PRESET_PATTERNS};
use crate::types::{ColumnMapping, DateFormatPair, DateSpec, MappingBundle, SplitSpec};
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Where the conversion rules come from
#[derive(Debug, Clone)]
pub enum RuleSource {
    /// A bundle saved in the mapping store under this name
    Stored(String),
    /// A standalone YAML or JSON bundle file
    File(PathBuf),
}

impl RuleSource {
    fn describe(&self) -> String {
        match self {
            RuleSource::Stored(name) => format!("'{}' (stored)", name),
            RuleSource::File(path) => path.display().to_string(),
        }
    }

    fn load(&self, store_dir: &Path) -> SheetmapResult<MappingBundle> {
        match self {
            RuleSource::Stored(name) => Ok(MappingStore::open(store_dir)?.get(name)?.clone()),
            RuleSource::File(path) => load_bundle_file(path),
        }
    }
}

/// Rules collected from the command line for `mapping save`
#[derive(Debug, Clone, Default)]
pub struct RuleArgs {
    /// (template column, source column)
    pub columns: Vec<(String, String)>,
    /// (template column, delimiter)
    pub splits: Vec<(String, String)>,
    /// (template column, input pattern, output pattern)
    pub dates: Vec<(String, String, String)>,
}

impl RuleArgs {
    fn into_bundle(self) -> MappingBundle {
        let columns: ColumnMapping = self.columns.into_iter().collect();
        let split: SplitSpec = self.splits.into_iter().collect();
        let mut dates = DateSpec::new();
        for (column, input, output) in self.dates {
            dates.insert(column, DateFormatPair::new(input, output));
        }
        MappingBundle::new(columns).with_split(split).with_dates(dates)
    }
}

/// Execute the convert command
pub fn convert(
    template: PathBuf,
    rules: RuleSource,
    output_dir: PathBuf,
    files: Vec<PathBuf>,
    store_dir: PathBuf,
    verbose: bool,
) -> SheetmapResult<()> {
    println!("{}", "📑 Sheetmap - Converting workbooks".bold().green());
    println!("   Template: {}", template.display());
    println!("   Mapping:  {}", rules.describe());
    println!("   Output:   {}\n", output_dir.display());

    let schema = read_template(&template)?;
    if verbose {
        println!(
            "{}",
            format!("📖 Template columns ({}): {}", schema.len(), schema.columns().join(", ")).cyan()
        );
    }

    let bundle = rules.load(&store_dir)?;
    if verbose {
        println!(
            "{}",
            format!(
                "🔗 {} mapped columns, {} split rules, {} date rules\n",
                bundle.columns.len(),
                bundle.split.len(),
                bundle.dates.len()
            )
            .cyan()
        );
    }

    let plan = ConversionPlan::new(schema, bundle)?;
    remember_template(&store_dir, &template);

    let report = BatchRunner::new(&plan, &output_dir).run(&files)?;
    print_report(&report, verbose);

    if report.nothing_converted() {
        return Err(SheetmapError::Validation(
            "No sheet could be converted".to_string(),
        ));
    }
    Ok(())
}

fn print_report(report: &BatchReport, verbose: bool) {
    for sheet in &report.sheets {
        let label = format!("{} [{}]", sheet.file.display(), sheet.sheet);
        match &sheet.status {
            SheetStatus::Converted(done) => {
                println!(
                    "{} {} → {}",
                    "✅".green(),
                    label.bright_blue(),
                    done.output.display()
                );
                println!(
                    "      {} source rows, {} output rows ({} split)",
                    done.source_rows, done.output_rows, done.expanded_rows
                );
                if done.dates.unparsed > 0 {
                    println!(
                        "{}",
                        format!(
                            "      {} date values did not match and were kept as-is",
                            done.dates.unparsed
                        )
                        .yellow()
                    );
                }
                if !done.warnings.is_empty() {
                    println!(
                        "{}",
                        format!("      ⚠️  {} row warnings", done.warnings.len()).yellow()
                    );
                    if verbose {
                        for warning in &done.warnings {
                            println!("         {}", warning);
                        }
                    }
                }
            }
            SheetStatus::Skipped(reason) => {
                println!("{} {} skipped: {}", "❌".red(), label.bright_blue(), reason);
            }
        }
    }

    for failure in &report.failed_files {
        println!(
            "{} {}: {}",
            "❌".red(),
            failure.file.display().to_string().bright_blue(),
            failure.error
        );
    }

    let skipped = report.skipped().count();
    println!();
    println!(
        "{}",
        format!(
            "Done: {} converted, {} skipped, {} files failed, {} warnings",
            report.converted_count(),
            skipped,
            report.failed_files.len(),
            report.warning_count()
        )
        .bold()
    );
}

/// Execute the headers command - list first-sheet column names
pub fn headers(file: PathBuf) -> SheetmapResult<()> {
    println!("{}", "📑 Sheetmap - Headers".bold().green());
    println!("   File: {}\n", file.display());

    let columns = list_headers(&file)?;
    if columns.is_empty() {
        println!("{}", "⚠️  First sheet has no header row".yellow());
        return Ok(());
    }
    for (idx, column) in columns.iter().enumerate() {
        println!("   {:>3}  {}", idx + 1, column.cyan());
    }
    Ok(())
}

/// Execute `mapping save` - validate and store a named bundle
pub fn mapping_save(
    name: String,
    template: PathBuf,
    source: Option<PathBuf>,
    rules: RuleArgs,
    store_dir: PathBuf,
) -> SheetmapResult<()> {
    println!("{}", "💾 Sheetmap - Saving mapping".bold().green());
    println!("   Name:     {}", name.bright_blue().bold());
    println!("   Template: {}\n", template.display());

    let schema = read_template(&template)?;
    let bundle = rules.into_bundle();
    validate_bundle(&bundle)?;

    // Fails on template columns that do not exist or bad date patterns
    ConversionPlan::new(schema, bundle.clone())?;

    if let Some(source) = source {
        let available = list_headers(&source)?;
        let missing: Vec<&str> = bundle
            .columns
            .iter()
            .map(|(_, src)| src)
            .filter(|src| !available.iter().any(|a| a == src))
            .collect();
        if !missing.is_empty() {
            return Err(SheetmapError::Validation(format!(
                "Columns not found in {}: {}",
                source.display(),
                missing.join(", ")
            )));
        }
    }

    let mut store = MappingStore::open(&store_dir)?;
    let replaced = store.get(&name).is_ok();
    store.insert(name.clone(), bundle);
    store.save()?;
    remember_template(&store_dir, &template);

    if replaced {
        println!("{}", format!("✅ Mapping '{}' updated", name).bold().green());
    } else {
        println!("{}", format!("✅ Mapping '{}' saved", name).bold().green());
    }
    println!("   Store: {}", store.path().display());
    Ok(())
}

/// Split and date rules only apply to mapped columns
fn validate_bundle(bundle: &MappingBundle) -> SheetmapResult<()> {
    let unmapped: Vec<&str> = bundle
        .split
        .iter()
        .map(|(column, _)| column)
        .chain(bundle.dates.iter().map(|(column, _)| column))
        .filter(|column| bundle.columns.get(column).is_none())
        .collect();
    if !unmapped.is_empty() {
        return Err(SheetmapError::Validation(format!(
            "Split/date rules for unmapped columns: {}",
            unmapped.join(", ")
        )));
    }

    if let Some((column, _)) = bundle.split.iter().find(|(_, d)| d.is_empty()) {
        return Err(SheetmapError::Validation(format!(
            "Empty delimiter for column '{}'",
            column
        )));
    }

    if let Some((column, _)) = bundle.dates.iter().find(|(_, pair)| !pair.is_complete()) {
        return Err(SheetmapError::Validation(format!(
            "Date rule for '{}' needs both an input and an output pattern",
            column
        )));
    }

    DateNormalizer::new(&bundle.dates)?;
    Ok(())
}

/// Execute `mapping list`
pub fn mapping_list(store_dir: PathBuf) -> SheetmapResult<()> {
    let store = MappingStore::open(&store_dir)?;
    println!("{}", "📚 Saved mappings".bold().green());
    println!("   Store: {}\n", store.path().display());

    if store.is_empty() {
        println!("   No saved mappings yet");
        return Ok(());
    }
    for name in store.names() {
        let bundle = store.get(name)?;
        println!(
            "   {}  ({} columns, {} split, {} dates)",
            name.bright_blue().bold(),
            bundle.columns.len(),
            bundle.split.len(),
            bundle.dates.len()
        );
    }
    Ok(())
}

/// Execute `mapping show` - print one bundle as YAML
pub fn mapping_show(name: String, store_dir: PathBuf) -> SheetmapResult<()> {
    let store = MappingStore::open(&store_dir)?;
    let bundle = store.get(&name)?;
    println!("{}", format!("📚 Mapping '{}'", name).bold().green());
    println!();
    print!("{}", serde_yaml::to_string(bundle)?);
    Ok(())
}

/// Execute `mapping delete`
pub fn mapping_delete(name: String, store_dir: PathBuf) -> SheetmapResult<()> {
    let mut store = MappingStore::open(&store_dir)?;
    store.remove(&name)?;
    store.save()?;
    println!("{}", format!("🗑️  Mapping '{}' deleted", name).bold().green());
    Ok(())
}

/// Execute the templates command - list template history
pub fn templates(store_dir: PathBuf) -> SheetmapResult<()> {
    let history = TemplateHistory::open(&store_dir)?;
    println!("{}", "📚 Template history".bold().green());
    if history.entries().is_empty() {
        println!("   No templates used yet");
        return Ok(());
    }
    for entry in history.entries() {
        println!("   {}", entry.cyan());
    }
    Ok(())
}

/// Execute the formats command - list preset date patterns
pub fn formats() -> SheetmapResult<()> {
    println!("{}", "📅 Date patterns".bold().green());
    println!("   Tokens: yyyy yy MM dd HH mm ss (everything else is literal)\n");
    for (pattern, example) in PRESET_PATTERNS {
        println!("   {} {}", format!("{:<24}", pattern).bright_blue(), example);
    }
    Ok(())
}

/// Add a template to the history. Failing to do so never fails the command.
fn remember_template(store_dir: &Path, template: &Path) {
    let template = template
        .canonicalize()
        .unwrap_or_else(|_| template.to_path_buf());
    let result = TemplateHistory::open(store_dir).and_then(|mut history| {
        if history.record(&template) {
            history.save()?;
        }
        Ok(())
    });
    if let Err(e) = result {
        tracing::warn!("could not update template history: {}", e);
    }
}
