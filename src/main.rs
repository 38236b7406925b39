use clap::{Parser, Subcommand};
use sheetmap::cli::{self, RuleArgs, RuleSource};
use sheetmap::error::{SheetmapError, SheetmapResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetmap")]
#[command(about = "Remap spreadsheets onto a fixed template layout.")]
#[command(long_about = "Sheetmap - template-driven spreadsheet conversion

Every sheet of every input workbook is reshaped into the template's columns:
mapped columns are renamed, delimiter-joined cells become extra rows, date
columns are reformatted, and every cell is written as text.

COMMANDS:
  convert    - Convert workbooks using a saved mapping or a bundle file
  headers    - List the header row of a workbook
  mapping    - Save, list, show or delete named mappings
  templates  - List templates used before
  formats    - List preset date patterns

EXAMPLES:
  sheetmap mapping save orders -t template.xlsx --map code=\"Item No\" --split code=\"|\"
  sheetmap convert -t template.xlsx -m orders -o out/ march.xlsx april.xls
  sheetmap convert -t template.xlsx -b orders.yaml -o out/ *.xlsx")]
#[command(version)]
struct Cli {
    /// Directory holding history_mappings.json and history_templates.json
    #[arg(long, global = true, env = "SHEETMAP_HOME", default_value = ".")]
    store_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Convert workbooks onto the template layout.

One output workbook is written per source sheet into --out. Single-sheet
sources keep their name (orders.xls -> orders.xlsx); multi-sheet sources get
the sheet name appended (orders_Jan.xlsx).

A sheet missing any mapped column is skipped and reported; the remaining
sheets and files are still converted. The command only fails when nothing at
all could be converted.")]
    /// Convert workbooks using a saved mapping or a bundle file
    Convert {
        /// Template workbook; its first row defines the output columns
        #[arg(short, long)]
        template: PathBuf,

        /// Name of a saved mapping
        #[arg(short, long, conflicts_with = "bundle", required_unless_present = "bundle")]
        mapping: Option<String>,

        /// YAML or JSON mapping bundle file
        #[arg(short, long)]
        bundle: Option<PathBuf>,

        /// Output directory (created if missing)
        #[arg(short, long)]
        out: PathBuf,

        /// Source workbooks (.xlsx, .xls, .xlsm, .ods)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Show pipeline steps and every row warning
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the header row of a workbook's first sheet
    Headers {
        /// Workbook to inspect
        file: PathBuf,
    },

    /// Manage named mappings
    Mapping {
        #[command(subcommand)]
        command: MappingCommands,
    },

    /// List templates used before
    Templates,

    /// List preset date patterns
    Formats,
}

#[derive(Subcommand)]
enum MappingCommands {
    #[command(long_about = "Validate and store a named mapping.

  --map TEMPLATE=SOURCE        take template column TEMPLATE from SOURCE
  --split TEMPLATE=DELIMITER   expand rows on DELIMITER in TEMPLATE
  --date TEMPLATE=INPUT=>OUTPUT
                               reformat dates, e.g. date=yyyy-MM-dd=>yyyyMMdd

Saving under an existing name replaces that mapping.")]
    /// Validate and store a named mapping
    Save {
        /// Mapping name
        name: String,

        /// Template workbook the mapping targets
        #[arg(short, long)]
        template: PathBuf,

        /// Column mapping TEMPLATE=SOURCE (repeatable)
        #[arg(long = "map", value_name = "TEMPLATE=SOURCE", value_parser = parse_pair, required = true)]
        columns: Vec<(String, String)>,

        /// Split rule TEMPLATE=DELIMITER (repeatable)
        #[arg(long = "split", value_name = "TEMPLATE=DELIMITER", value_parser = parse_pair)]
        splits: Vec<(String, String)>,

        /// Date rule TEMPLATE=INPUT=>OUTPUT (repeatable)
        #[arg(long = "date", value_name = "TEMPLATE=INPUT=>OUTPUT", value_parser = parse_date_rule)]
        dates: Vec<(String, String, String)>,

        /// Sample source workbook to check the mapped source columns against
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// List saved mappings
    List,

    /// Print a saved mapping as YAML
    Show {
        /// Mapping name
        name: String,
    },

    /// Delete a saved mapping
    Delete {
        /// Mapping name
        name: String,
    },
}

/// `KEY=VALUE`, split at the first `=`
fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// `COLUMN=INPUT=>OUTPUT`
fn parse_date_rule(raw: &str) -> Result<(String, String, String), String> {
    let (column, patterns) = parse_pair(raw)?;
    match patterns.split_once("=>") {
        Some((input, output)) => Ok((column, input.to_string(), output.to_string())),
        None => Err(format!("expected COLUMN=INPUT=>OUTPUT, got '{}'", raw)),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sheetmap=info" } else { "sheetmap=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> SheetmapResult<()> {
    let cli = Cli::parse();
    let store_dir = cli.store_dir;

    match cli.command {
        Commands::Convert {
            template,
            mapping,
            bundle,
            out,
            files,
            verbose,
        } => {
            init_logging(verbose);
            let rules = match (mapping, bundle) {
                (_, Some(path)) => RuleSource::File(path),
                (Some(name), None) => RuleSource::Stored(name),
                (None, None) => {
                    return Err(SheetmapError::Validation(
                        "Either --mapping or --bundle is required".to_string(),
                    ))
                }
            };
            cli::convert(template, rules, out, files, store_dir, verbose)
        }

        Commands::Headers { file } => {
            init_logging(false);
            cli::headers(file)
        }

        Commands::Mapping { command } => {
            init_logging(false);
            match command {
                MappingCommands::Save {
                    name,
                    template,
                    columns,
                    splits,
                    dates,
                    source,
                } => cli::mapping_save(
                    name,
                    template,
                    source,
                    RuleArgs {
                        columns,
                        splits,
                        dates,
                    },
                    store_dir,
                ),
                MappingCommands::List => cli::mapping_list(store_dir),
                MappingCommands::Show { name } => cli::mapping_show(name, store_dir),
                MappingCommands::Delete { name } => cli::mapping_delete(name, store_dir),
            }
        }

        Commands::Templates => {
            init_logging(false);
            cli::templates(store_dir)
        }

        Commands::Formats => cli::formats(),
    }
}
