// ==========================================
// 批量导入与配置集成测试
// ==========================================
// 测试目标: CSV → BatchImporter → 报告汇总；config_kv → ImportSettings
// ==========================================

mod test_helpers;

use docflow_import::config::{config_keys, ConfigManager};
use docflow_import::domain::{EntityKind, ImportRow, ImportStage, RowStatus};
use docflow_import::importer::{
    BatchImporter, BatchOptions, Culture, ImportError, ImportSettings, UniversalRowReader,
    DOC_REGISTER_ID,
};
use docflow_import::repository::{DocumentSession, DocumentStore};
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use test_helpers::*;

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

const HEADER: &str = "Number,Date,Counterparty,Kind,Subject,Department,File,Dated,InNumber,Addressee,Delivery,Note";

#[test]
fn test_csv_batch_sums_row_outcomes() {
    let env = TestEnv::new();
    let csv = write_csv(&[
        HEADER,
        "REG-1,01/02/2020,Acme Corp,Letter,Hello,Sales,,,IN-1,,,",
        ",,,,,,,,,,,",
        "REG-2,02/02/2020,Nobody,Letter,Hi,Sales,,,IN-2,,,",
        "REG-3,03/02/2020,Acme Corp,Letter,Hey,Sales,,,IN-3,Ghost,,",
    ]);

    let batch = BatchImporter::new(&env.registry, &env.store, &env.settings);
    let report = batch
        .import_file(
            "incomingletter",
            csv.path(),
            &UniversalRowReader,
            &BatchOptions::default(),
        )
        .unwrap();

    assert_eq!(report.entity_kind, EntityKind::IncomingLetter);
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.aborted, 1);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.warning_count, 1);
    assert_eq!(
        report.source_file.as_deref(),
        Some(csv.path().display().to_string().as_str())
    );

    // 行号对应源文件（空行被跳过）
    let numbers: Vec<usize> = report.rows.iter().map(|r| r.row_number).collect();
    assert_eq!(numbers, vec![2, 4, 5]);
    assert_eq!(
        report.rows[1].status,
        RowStatus::Aborted {
            stage: ImportStage::Parsed
        }
    );
    assert!(report.rows[0].document_id.is_some());
    assert!(report.rows[1].document_id.is_none());

    assert_eq!(env.count(EntityKind::IncomingLetter), 2);
}

#[test]
fn test_batch_options_apply_to_every_row() {
    let env = TestEnv::new();
    let csv = write_csv(&[
        "Skip,Number,Date,Counterparty,Kind,Subject,Department,File,PreparedBy,Delivery,Note",
        "x,OUT-1,15/03/2021,ACME,Letter,Reply,Sales,,Jane Doe,Courier,",
        "y,OUT-2,16/03/2021,ACME,Letter,Reply,Sales,,,,",
    ]);

    let options = BatchOptions {
        shift: 1,
        extra_parameters: HashMap::from([(
            DOC_REGISTER_ID.to_string(),
            OUTGOING_REGISTER_ID.to_string(),
        )]),
    };
    let batch = BatchImporter::new(&env.registry, &env.store, &env.settings);
    let report = batch
        .import_file("OutgoingLetter", csv.path(), &UniversalRowReader, &options)
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.error_count, 0);
    // 发文负责人角色无成员：每行一个 Warning
    assert_eq!(report.warning_count, 2);

    for row in &report.rows {
        let doc = env.load(row.document_id.unwrap());
        assert_eq!(doc.document_register_id, Some(OUTGOING_REGISTER_ID));
    }
}

#[test]
fn test_batch_fails_for_unknown_kind_or_missing_file() {
    let env = TestEnv::new();
    let csv = write_csv(&[HEADER]);
    let batch = BatchImporter::new(&env.registry, &env.store, &env.settings);

    let unknown = batch.import_file(
        "Contract",
        csv.path(),
        &UniversalRowReader,
        &BatchOptions::default(),
    );
    assert!(matches!(unknown, Err(ImportError::UnknownEntityKind(_))));

    let missing = batch.import_file(
        "IncomingLetter",
        Path::new("/nonexistent/rows.csv"),
        &UniversalRowReader,
        &BatchOptions::default(),
    );
    assert!(matches!(missing, Err(ImportError::FileNotFound(_))));
}

#[test]
fn test_report_serializes_row_diagnostics() {
    let env = TestEnv::new();
    let csv = write_csv(&[
        HEADER,
        "REG-1,01/02/2020,Nobody,Letter,Hello,Sales,,,IN-1,,,",
    ]);

    let batch = BatchImporter::new(&env.registry, &env.store, &env.settings);
    let report = batch
        .import_file(
            "IncomingLetter",
            csv.path(),
            &UniversalRowReader,
            &BatchOptions::default(),
        )
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["total_rows"], 1);
    assert_eq!(json["rows"][0]["diagnostics"][0]["severity"], "Error");
    assert!(json["rows"][0]["diagnostics"][0]["message"]
        .as_str()
        .unwrap()
        .contains("Nobody"));
}

#[test]
fn test_xlsx_date_cell_matches_text_date_document() {
    let env = TestEnv::new();
    let xlsx = Builder::new().suffix(".xlsx").tempfile().unwrap();

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("dd/mm/yyyy");
    let worksheet = workbook.add_worksheet();
    for (col, name) in HEADER.split(',').enumerate() {
        worksheet.write_string(0, col as u16, name).unwrap();
    }
    // 第 2 行留空，第 3 行登记日期为 Excel 日期单元格
    for (col, value) in incoming_row().iter().enumerate() {
        if col == 1 || value.is_empty() {
            continue;
        }
        worksheet.write_string(2, col as u16, value).unwrap();
    }
    worksheet
        .write_number_with_format(2, 1, 43862.0, &date_format)
        .unwrap();
    workbook.save(xlsx.path()).unwrap();

    let batch = BatchImporter::new(&env.registry, &env.store, &env.settings);
    let report = batch
        .import_file(
            "IncomingLetter",
            xlsx.path(),
            &UniversalRowReader,
            &BatchOptions::default(),
        )
        .unwrap();

    assert_eq!(report.total_rows, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.rows[0].row_number, 3);
    let imported_id = report.rows[0].document_id.unwrap();
    assert_eq!(
        env.load(imported_id).registration_date,
        Some(date(2020, 2, 1))
    );

    // 文本日期 01/02/2020 命中同一自然键
    let outcome = env.import(EntityKind::IncomingLetter, &ImportRow::new(incoming_row()), 0);
    assert_eq!(outcome.document.unwrap().id, Some(imported_id));
    assert_eq!(env.count(EntityKind::IncomingLetter), 1);
}

// ==========================================
// 配置
// ==========================================

#[test]
fn test_settings_load_from_config_table() {
    let env = TestEnv::new();
    let config = ConfigManager::from_connection(env.conn.clone()).unwrap();
    config
        .set_global_config_value(config_keys::IMPORT_CULTURE, "en-US")
        .unwrap();
    config
        .set_global_config_value(config_keys::DIAGNOSTICS_LOCALE, "zh-CN")
        .unwrap();

    let settings = ImportSettings::load(&config, today()).unwrap();
    assert_eq!(settings.culture, Culture::EN_US);
    assert_eq!(settings.diagnostics_locale, "zh-CN");
    assert_eq!(
        settings.responsible_role(EntityKind::IncomingLetter),
        "IncomingDocumentsResponsible"
    );
}

#[test]
fn test_month_first_culture_changes_natural_key() {
    let mut env = TestEnv::new();
    env.settings = ImportSettings::load(
        &MockConfigReader {
            culture: "en-US".to_string(),
            ..MockConfigReader::default()
        },
        today(),
    )
    .unwrap();

    let outcome = env.import(
        EntityKind::IncomingLetter,
        &ImportRow::new(incoming_row()),
        0,
    );
    let doc = env.load(outcome.document.unwrap().id.unwrap());
    assert_eq!(doc.registration_date, Some(date(2020, 1, 2)));
}

#[test]
fn test_settings_reject_unsupported_locale() {
    let config = MockConfigReader {
        diagnostics_locale: "de".to_string(),
        ..MockConfigReader::default()
    };
    assert!(matches!(
        ImportSettings::load(&config, today()),
        Err(ImportError::ConfigValueError { .. })
    ));
}

#[test]
fn test_dropped_session_rolls_back() {
    let env = TestEnv::new();
    {
        let session = env.store.begin_session().unwrap();
        let mut doc = session.create(EntityKind::IncomingLetter);
        doc.registration_number = "TMP-1".to_string();
        session.save(&mut doc).unwrap();
        assert!(doc.id.is_some());
    }
    assert_eq!(env.count(EntityKind::IncomingLetter), 0);

    // 锁已释放，后续会话可正常提交
    let session = env.store.begin_session().unwrap();
    let mut doc = session.create(EntityKind::IncomingLetter);
    doc.registration_number = "TMP-2".to_string();
    session.save(&mut doc).unwrap();
    session.commit().unwrap();
    assert_eq!(env.count(EntityKind::IncomingLetter), 1);
}
