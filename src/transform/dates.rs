//! Date pattern translation and per-column date reformatting
//!
//! Patterns use the tokens `yyyy`, `yy`, `MM`, `dd`, `HH`, `mm`, `ss`. Every
//! other character is a literal. Patterns are compiled to strftime once, when
//! the conversion plan is built.

use crate::error::{SheetmapError, SheetmapResult};
use crate::types::{DateSpec, Table};
use chrono::format::{self, Item, Parsed, StrftimeItems};
use chrono::{Datelike, NaiveDateTime};
use regex::{Captures, Regex};
use std::fmt::Write;
use std::sync::LazyLock;
use tracing::debug;

/// Pattern tokens, longest first so `yyyy` wins over `yy`
static TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"yyyy|yy|MM|dd|HH|mm|ss").expect("Invalid date token regex"));

/// Patterns offered to users when building a mapping
pub const PRESET_PATTERNS: &[(&str, &str)] = &[
    ("yyyyMMdd", "20250101"),
    ("yyyy/MM/dd", "2025/01/01"),
    ("yyyy-MM-dd", "2025-01-01"),
    ("yyyy年MM月dd日", "2025年01月01日"),
    ("dd/MM/yyyy", "01/01/2025"),
    ("MM/dd/yyyy", "01/01/2025"),
    ("yyyy-MM-dd HH:mm:ss", "2025-01-01 14:30:00"),
    ("yyyy/MM/dd HH:mm:ss", "2025/01/01 14:30:00"),
    ("yyyyMMddHHmmss", "20250101143000"),
];

/// A token pattern such as `yyyy-MM-dd`, compiled for parsing and formatting
#[derive(Debug, Clone)]
pub struct DatePattern {
    pattern: String,
    strftime: String,
    shape: Regex,
    two_digit_year: bool,
}

impl PartialEq for DatePattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for DatePattern {}

impl DatePattern {
    pub fn parse(pattern: &str) -> SheetmapResult<Self> {
        let strftime = to_strftime(pattern)?;
        if StrftimeItems::new(&strftime).any(|item| matches!(item, Item::Error)) {
            return Err(SheetmapError::Validation(format!(
                "Invalid date pattern '{}'",
                pattern
            )));
        }
        let shape = to_shape(pattern)?;
        let two_digit_year = strftime.contains("%y") && !strftime.contains("%Y");
        Ok(Self {
            pattern: pattern.to_string(),
            strftime,
            shape,
            two_digit_year,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Parse `value` against the whole pattern.
    ///
    /// Numeric fields take plain digits only (`yyyy` exactly four, `yy` two,
    /// the rest one or two). Fields the pattern does not mention default to
    /// 1900-01-01 00:00:00. Two-digit years 69-99 fall in the 1900s, 00-68 in
    /// the 2000s.
    pub fn parse_value(&self, value: &str) -> Option<NaiveDateTime> {
        if !self.shape.is_match(value) {
            return None;
        }

        let mut parsed = Parsed::new();
        format::parse(&mut parsed, value, StrftimeItems::new(&self.strftime)).ok()?;

        // Setters fail on fields already holding another value; those errors are expected.
        let _ = parsed.set_month(1);
        let _ = parsed.set_day(1);
        let _ = parsed.set_hour(0);
        let _ = parsed.set_minute(0);

        let mut date = match parsed.to_naive_date() {
            Ok(date) => date,
            Err(_) => {
                let _ = parsed.set_year(1900);
                parsed.to_naive_date().ok()?
            }
        };
        // chrono pivots two-digit years at 70
        if self.two_digit_year && date.year() == 2069 {
            date = date.with_year(1969)?;
        }
        let time = parsed.to_naive_time().ok()?;
        Some(date.and_time(time))
    }

    pub fn format(&self, value: &NaiveDateTime) -> Option<String> {
        let mut out = String::new();
        write!(
            out,
            "{}",
            value.format_with_items(StrftimeItems::new(&self.strftime))
        )
        .ok()?;
        Some(out)
    }
}

/// Translate token syntax to strftime. Longer tokens win over their prefixes
/// (`yyyy` before `yy`), and a literal `%` is escaped.
pub fn to_strftime(pattern: &str) -> SheetmapResult<String> {
    let escaped = pattern.replace('%', "%%");
    let translated = TOKENS.replace_all(&escaped, |caps: &Captures| {
        match &caps[0] {
            "yyyy" => "%Y",
            "yy" => "%y",
            "MM" => "%m",
            "dd" => "%d",
            "HH" => "%H",
            "mm" => "%M",
            _ => "%S",
        }
        .to_string()
    });
    Ok(translated.into_owned())
}

/// Anchored regex accepting only values laid out like `pattern`
fn to_shape(pattern: &str) -> SheetmapResult<Regex> {
    let mut shape = String::from("^");
    let mut last = 0;
    for token in TOKENS.find_iter(pattern) {
        shape.push_str(&regex::escape(&pattern[last..token.start()]));
        shape.push_str(match token.as_str() {
            "yyyy" => r"\d{4}",
            "yy" => r"\d{2}",
            _ => r"\d{1,2}",
        });
        last = token.end();
    }
    shape.push_str(&regex::escape(&pattern[last..]));
    shape.push('$');

    Regex::new(&shape)
        .map_err(|e| SheetmapError::Validation(format!("Invalid date pattern '{}': {}", pattern, e)))
}

/// Reformat one cell. Blank cells become "", cells that do not match
/// `input` come back verbatim.
pub fn normalize_value(value: &str, input: &DatePattern, output: &DatePattern) -> (String, bool) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return (String::new(), true);
    }
    match input.parse_value(trimmed).and_then(|dt| output.format(&dt)) {
        Some(formatted) => (formatted, true),
        None => (value.to_string(), false),
    }
}

#[derive(Debug, Clone)]
struct DateRule {
    column: String,
    input: DatePattern,
    output: DatePattern,
}

/// Counters reported after a table has been normalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateStats {
    pub converted: usize,
    pub unparsed: usize,
}

/// Compiled date rules for one conversion plan
#[derive(Debug, Clone, Default)]
pub struct DateNormalizer {
    rules: Vec<DateRule>,
}

impl DateNormalizer {
    /// Compile every complete rule in `spec`. Rules missing a pattern are skipped.
    pub fn new(spec: &DateSpec) -> SheetmapResult<Self> {
        let mut rules = Vec::with_capacity(spec.len());
        for (column, pair) in spec.iter() {
            if !pair.is_complete() {
                debug!(column, "date rule lacks input or output pattern, skipping");
                continue;
            }
            rules.push(DateRule {
                column: column.to_string(),
                input: DatePattern::parse(&pair.input)?,
                output: DatePattern::parse(&pair.output)?,
            });
        }
        Ok(Self { rules })
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.column.as_str())
    }

    pub fn apply(&self, table: &mut Table) -> DateStats {
        let mut stats = DateStats::default();

        for rule in &self.rules {
            let Some(idx) = table.column_index(&rule.column) else {
                debug!(column = %rule.column, "date column not in table");
                continue;
            };

            for (row_idx, row) in table.rows.iter_mut().enumerate() {
                let Some(cell) = row.get_mut(idx) else {
                    continue;
                };
                let (value, ok) = normalize_value(cell, &rule.input, &rule.output);
                if ok {
                    stats.converted += 1;
                } else {
                    debug!(
                        row = row_idx,
                        column = %rule.column,
                        pattern = rule.input.as_str(),
                        "value does not match date pattern, kept as-is"
                    );
                    stats.unparsed += 1;
                }
                *cell = value;
            }
        }

        stats
    }
}
