//! End-to-end conversion tests over real workbooks built in a scratch dir

use calamine::{open_workbook, Data, Reader, Xlsx};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use sheetmap::batch::{BatchRunner, SheetStatus};
use sheetmap::excel::{read_template, OUTPUT_SHEET_NAME};
use sheetmap::transform::ConversionPlan;
use sheetmap::{DateFormatPair, DateSpec, MappingBundle, SheetError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a workbook with one sheet per (name, rows) entry. All cells are strings.
fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<&str>>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).unwrap();
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Output sheet as text rows, header included
fn read_output(path: &Path) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(OUTPUT_SHEET_NAME).unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| match cell {
                    Data::Empty => String::new(),
                    Data::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
}

fn template(dir: &Path) -> PathBuf {
    let path = dir.join("template.xlsx");
    write_workbook(
        &path,
        &[("Template", vec![vec!["code", "name", "date", "remark"]])],
    );
    path
}

fn orders_bundle() -> MappingBundle {
    let mut dates = DateSpec::new();
    dates.insert("date", DateFormatPair::new("yyyy-MM-dd", "yyyyMMdd"));
    MappingBundle::new(
        vec![("code", "Item No"), ("name", "Item"), ("date", "Order Date")]
            .into_iter()
            .collect(),
    )
    .with_split(vec![("code", "|"), ("name", "|")].into_iter().collect())
    .with_dates(dates)
}

// ═══════════════════════════════════════════════════════════════════════════
// SINGLE SHEET
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_convert_single_sheet_full_pipeline() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let plan = ConversionPlan::new(schema, orders_bundle()).unwrap();

    let source = dir.path().join("orders.xlsx");
    write_workbook(
        &source,
        &[(
            "Sheet1",
            vec![
                vec!["Item No", "Item", "Order Date", "Extra"],
                vec!["00123|00456", "Bolt|Nut", "2025-01-05", "dropped"],
                vec!["00789", "Washer", "05/01/2025", "dropped"],
            ],
        )],
    );

    let out = dir.path().join("out");
    let report = BatchRunner::new(&plan, &out).run(&[source]).unwrap();

    assert_eq!(report.converted_count(), 1);
    assert!(report.failed_files.is_empty());

    let (_, converted) = report.converted().next().unwrap();
    assert_eq!(converted.output, out.join("orders.xlsx"));
    assert_eq!(converted.source_rows, 2);
    assert_eq!(converted.output_rows, 3);
    assert_eq!(converted.expanded_rows, 1);
    assert_eq!(converted.dates.converted, 2);
    assert_eq!(converted.dates.unparsed, 1);

    assert_eq!(
        read_output(&converted.output),
        rows(&[
            &["code", "name", "date", "remark"],
            &["00123", "Bolt", "20250105", ""],
            &["00456", "Nut", "20250105", ""],
            &["00789", "Washer", "05/01/2025", ""],
        ])
    );
}

#[test]
fn test_convert_uneven_split_pads_with_empty() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let plan = ConversionPlan::new(schema, orders_bundle()).unwrap();

    let source = dir.path().join("uneven.xlsx");
    write_workbook(
        &source,
        &[(
            "Sheet1",
            vec![
                vec!["Item No", "Item", "Order Date"],
                vec!["1|2|3", "Bolt", ""],
            ],
        )],
    );

    let out = dir.path().join("out");
    let report = BatchRunner::new(&plan, &out).run(&[source]).unwrap();
    let (_, converted) = report.converted().next().unwrap();

    assert_eq!(
        read_output(&converted.output),
        rows(&[
            &["code", "name", "date", "remark"],
            &["1", "Bolt", "", ""],
            &["2", "", "", ""],
            &["3", "", "", ""],
        ])
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// MULTI SHEET AND FAILURE ISOLATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_sheet_missing_column_is_skipped_others_convert() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let plan = ConversionPlan::new(schema, orders_bundle()).unwrap();

    let source = dir.path().join("book.xlsx");
    write_workbook(
        &source,
        &[
            (
                "Jan",
                vec![
                    vec!["Item No", "Item", "Order Date"],
                    vec!["A1", "Bolt", "2025-01-31"],
                ],
            ),
            ("Notes", vec![vec!["Item No", "Comment"], vec!["A1", "late"]]),
            (
                "Feb",
                vec![
                    vec!["Order Date", "Item", "Item No"],
                    vec!["2025-02-01", "Nut", "B2"],
                ],
            ),
        ],
    );

    let out = dir.path().join("out");
    let report = BatchRunner::new(&plan, &out).run(&[source]).unwrap();

    assert_eq!(report.sheets.len(), 3);
    assert_eq!(report.converted_count(), 2);
    assert!(!report.nothing_converted());

    let (skipped, reason) = report.skipped().next().unwrap();
    assert_eq!(skipped.sheet, "Notes");
    match reason {
        SheetError::MissingColumns { missing } => {
            assert_eq!(missing, &vec!["Item".to_string(), "Order Date".to_string()]);
        }
        other => panic!("unexpected skip reason: {:?}", other),
    }

    assert!(out.join("book_Jan.xlsx").exists());
    assert!(out.join("book_Feb.xlsx").exists());
    assert!(!out.join("book_Notes.xlsx").exists());

    assert_eq!(
        read_output(&out.join("book_Feb.xlsx")),
        rows(&[
            &["code", "name", "date", "remark"],
            &["B2", "Nut", "20250201", ""],
        ])
    );
}

#[test]
fn test_unreadable_file_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let plan = ConversionPlan::new(schema, orders_bundle()).unwrap();

    let broken = dir.path().join("broken.xlsx");
    std::fs::write(&broken, "not a workbook").unwrap();

    let good = dir.path().join("good.xlsx");
    write_workbook(
        &good,
        &[(
            "Sheet1",
            vec![vec!["Item No", "Item", "Order Date"], vec!["7", "Pin", ""]],
        )],
    );

    let out = dir.path().join("out");
    let report = BatchRunner::new(&plan, &out)
        .run(&[broken.clone(), good])
        .unwrap();

    assert_eq!(report.failed_files.len(), 1);
    assert_eq!(report.failed_files[0].file, broken);
    assert_eq!(report.converted_count(), 1);
    assert!(out.join("good.xlsx").exists());
}

#[test]
fn test_every_sheet_skipped_is_nothing_converted() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let plan = ConversionPlan::new(schema, orders_bundle()).unwrap();

    let source = dir.path().join("wrong.xlsx");
    write_workbook(&source, &[("Sheet1", vec![vec!["Foo", "Bar"], vec!["1", "2"]])]);

    let report = BatchRunner::new(&plan, dir.path().join("out"))
        .run(&[source])
        .unwrap();

    assert!(report.nothing_converted());
    assert!(matches!(
        report.sheets[0].status,
        SheetStatus::Skipped(SheetError::MissingColumns { .. })
    ));
}

#[test]
fn test_header_only_sheet_produces_header_only_output() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let plan = ConversionPlan::new(schema, orders_bundle()).unwrap();

    let source = dir.path().join("empty.xlsx");
    write_workbook(
        &source,
        &[("Sheet1", vec![vec!["Item No", "Item", "Order Date"]])],
    );

    let out = dir.path().join("out");
    let report = BatchRunner::new(&plan, &out).run(&[source]).unwrap();
    let (_, converted) = report.converted().next().unwrap();

    assert_eq!(converted.output_rows, 0);
    assert_eq!(
        read_output(&converted.output),
        rows(&[&["code", "name", "date", "remark"]])
    );
}

#[test]
fn test_plan_rejects_mapping_outside_template() {
    let dir = TempDir::new().unwrap();
    let schema = read_template(template(dir.path())).unwrap();
    let bundle = MappingBundle::new(vec![("sku", "Item No")].into_iter().collect());

    assert!(ConversionPlan::new(schema, bundle).is_err());
}
