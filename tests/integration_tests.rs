use calamine::{Data, Reader, Xlsx, open_workbook};
use quarterly_report::engine::analyzer::inspect_sheet;
use quarterly_report::parser::{InputWorkbook, cell_to_string};
use quarterly_report::{ProcessOptions, ReportConfig, process_workbook};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn temp_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("quarterly_report_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Class sheet shaped like the gradebook export: merged two-row headers,
/// a subject split over two subgroup column pairs, and a footer row.
fn write_class_sheet(ws: &mut Worksheet, name: &str) -> Result<(), XlsxError> {
    let plain = Format::new();
    ws.set_name(name)?;

    ws.merge_range(0, 0, 1, 0, "№", &plain)?;
    ws.merge_range(0, 1, 1, 1, "Аты-жөні", &plain)?;
    ws.merge_range(0, 2, 0, 3, "Алгебра", &plain)?;
    ws.merge_range(0, 4, 0, 5, "Ағылшын тілі", &plain)?;
    ws.merge_range(0, 6, 0, 7, "Ағылшын тілі", &plain)?;
    for (col, label) in [(2, "I"), (3, "II"), (4, "I"), (5, "II"), (6, "І"), (7, "ІІ")] {
        ws.write_string(1, col, label)?;
    }

    ws.write_number(2, 0, 1)?;
    ws.write_string(2, 1, "Асан")?;
    ws.write_number(2, 2, 5)?;
    ws.write_number(2, 3, 4)?;
    ws.write_number(2, 4, 5)?;

    ws.write_number(3, 0, 2)?;
    ws.write_string(3, 1, "Әлия")?;
    ws.write_number(3, 2, 4)?;
    ws.write_number(3, 3, 5)?;
    ws.write_number(3, 6, 4)?;

    ws.write_number(4, 0, 3)?;
    ws.write_string(4, 1, "Болат")?;
    ws.write_number(4, 2, 3)?;
    ws.write_string(4, 3, "3, 4")?;
    ws.write_number(4, 4, 2)?;

    ws.write_string(6, 1, "Барлығы")?;
    ws.write_number(6, 2, 3)?;

    Ok(())
}

fn write_input(path: &Path, class_sheets: &[&str], empty_sheets: &[&str]) {
    let mut workbook = Workbook::new();
    for name in class_sheets {
        write_class_sheet(workbook.add_worksheet(), name).unwrap();
    }
    for name in empty_sheets {
        workbook.add_worksheet().set_name(*name).unwrap();
    }
    workbook.save(path).unwrap();
}

fn text(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
    range
        .get_value((row, col))
        .map(cell_to_string)
        .unwrap_or_default()
}

fn options(dir: &Path) -> ProcessOptions {
    ProcessOptions {
        output_dir: Some(dir.to_path_buf()),
        ..ProcessOptions::default()
    }
}

#[test]
fn test_full_pipeline() {
    let dir = temp_dir("full");
    let input = dir.join("input.xlsx");
    write_input(&input, &["5 «А»"], &["Пустой"]);

    let outcome = process_workbook(&input, &options(&dir)).expect("processing failed");

    assert!(outcome.success());
    let output = outcome.output.clone().unwrap();
    assert_eq!(output, dir.join("processed_final.xlsx"));
    assert_eq!(outcome.sheets.len(), 1);
    assert_eq!(outcome.sheets[0].students, 3);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].sheet, "Пустой");

    let mut report: Xlsx<_> = open_workbook(&output).unwrap();
    assert_eq!(report.sheet_names(), vec!["5 «А»".to_string()]);
    let range = report.worksheet_range("5 «А»").unwrap();

    // Quarter I block
    assert_eq!(text(&range, 0, 0), "1 четверть");
    assert_eq!(text(&range, 1, 1), "Аты-жөні");
    assert_eq!(text(&range, 1, 2), "Алгебра");
    assert_eq!(text(&range, 1, 3), "Ағылшын тілі");
    assert_eq!(text(&range, 1, 4), "5");
    assert_eq!(text(&range, 2, 0), "1");
    assert_eq!(text(&range, 2, 1), "Асан");
    assert_eq!(text(&range, 3, 3), "4");
    // Footer row was cut off
    assert_eq!(text(&range, 5, 0), "5");
    assert_eq!(text(&range, 8, 0), "Качество");
    assert_eq!(range.get_value((8, 2)), Some(&Data::Float(66.67)));
    assert_eq!(range.get_value((9, 2)), Some(&Data::Float(100.0)));
    assert_eq!(range.get_value((9, 3)), Some(&Data::Float(66.67)));
    assert_eq!(text(&range, 10, 0), "Качество по классу");
    assert_eq!(range.get_value((10, 1)), Some(&Data::Float(66.67)));
    assert_eq!(range.get_value((11, 1)), Some(&Data::Float(83.33)));

    // Quarter II block after a two-row gap; English has no II grades
    assert_eq!(text(&range, 14, 0), "2 четверть");
    assert_eq!(text(&range, 15, 2), "Алгебра");
    assert_eq!(text(&range, 15, 3), "5");
    assert_eq!(text(&range, 18, 2), "3, 4");
    assert_eq!(range.get_value((24, 1)), Some(&Data::Float(75.0)));

    // No annual block
    assert_eq!(text(&range, 28, 0), "");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_workbook_without_data_writes_nothing() {
    let dir = temp_dir("empty");
    let input = dir.join("input.xlsx");
    write_input(&input, &[], &["Лист1", "Лист2"]);

    let opts = options(&dir);
    let outcome = process_workbook(&input, &opts).unwrap();

    assert!(!outcome.success());
    assert!(outcome.output.is_none());
    assert_eq!(outcome.skipped.len(), 2);
    assert!(!opts.output_path().exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_class_name_names_output_file() {
    let dir = temp_dir("class");
    let input = dir.join("input.xlsx");
    write_input(&input, &["10-Б", "10_Б"], &[]);

    let opts = ProcessOptions {
        output_dir: Some(dir.join("reports")),
        class_name: Some("10 «Б»".to_string()),
        ..ProcessOptions::default()
    };
    let outcome = process_workbook(&input, &opts).unwrap();

    let output = outcome.output.unwrap();
    assert_eq!(output, dir.join("reports").join("10 «Б».xlsx"));
    assert!(output.exists());

    let report: Xlsx<_> = open_workbook(&output).unwrap();
    assert_eq!(report.sheet_names(), vec!["10-Б".to_string(), "10_Б".to_string()]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = temp_dir("missing");
    let result = process_workbook(&dir.join("nope.xlsx"), &options(&dir));
    assert!(result.is_err());
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_inspect_reads_merged_headers() {
    let dir = temp_dir("inspect");
    let input = dir.join("input.xlsx");
    write_input(&input, &["5 «А»"], &[]);

    let mut workbook = InputWorkbook::open(&input).unwrap();
    let table = workbook.read_sheet("5 «А»").unwrap();
    let inspection = inspect_sheet(&table, &ReportConfig::default(), 2);

    assert!(inspection.merged_regions.contains(&"A1:A2".to_string()));
    assert!(inspection.merged_regions.contains(&"C1:D1".to_string()));
    assert_eq!(inspection.header_rows[0][3], "Алгебра");
    assert_eq!(inspection.data_rows.len(), 2);
    let subjects = inspection
        .descriptors
        .iter()
        .filter(|d| d.is_subject())
        .count();
    assert_eq!(subjects, 6);

    fs::remove_dir_all(&dir).unwrap();
}
