// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、参照数据种子、导入环境、Mock 配置
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use docflow_import::config::ImportConfigReader;
use docflow_import::db::{init_schema, open_sqlite_connection};
use docflow_import::domain::{EntityKind, ImportRow, RowOutcome, TargetDocument};
use docflow_import::importer::{
    EntityImporter, ImportContext, ImportResult, ImportSettings, ImporterRegistry,
};
use docflow_import::repository::SqliteDocumentStore;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

// 种子数据 ID
pub const ACME_ID: i64 = 1;
pub const LETTER_KIND_ID: i64 = 2;
pub const SALES_DEPT_ID: i64 = 3;
pub const JANE_ID: i64 = 4;
pub const CLERK_ID: i64 = 5;
pub const COURIER_ID: i64 = 6;
pub const HEAD_OFFICE_ID: i64 = 10;
pub const INCOMING_REGISTER_ID: i64 = 1;
pub const OUTGOING_REGISTER_ID: i64 = 2;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 插入参照数据
pub fn seed_reference_data(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        INSERT INTO reference_entity (id, kind, name) VALUES (10, 'BUSINESS_UNIT', 'Head Office');
        INSERT INTO reference_entity (id, kind, name, code) VALUES (1, 'COUNTERPARTY', 'Acme Corp', 'ACME');
        INSERT INTO reference_entity (id, kind, name) VALUES (2, 'DOCUMENT_KIND', 'Letter');
        INSERT INTO reference_entity (id, kind, name, business_unit_id) VALUES (3, 'DEPARTMENT', 'Sales', 10);
        INSERT INTO reference_entity (id, kind, name) VALUES (4, 'EMPLOYEE', 'Jane Doe');
        INSERT INTO reference_entity (id, kind, name) VALUES (5, 'EMPLOYEE', 'Clerk One');
        INSERT INTO reference_entity (id, kind, name) VALUES (6, 'MAIL_DELIVERY_METHOD', 'Courier');

        INSERT INTO document_register (id, name, document_flow) VALUES (1, 'Incoming mail', 'INCOMING');
        INSERT INTO document_register (id, name, document_flow) VALUES (2, 'Outgoing mail', 'OUTGOING');

        INSERT INTO role_member (role_code, employee_id, business_unit_id)
            VALUES ('IncomingDocumentsResponsible', 5, 10);
        "#,
    )?;
    Ok(())
}

// ==========================================
// TestEnv - 导入测试环境
// ==========================================
pub struct TestEnv {
    _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub store: SqliteDocumentStore,
    pub settings: ImportSettings,
    pub registry: ImporterRegistry,
}

impl TestEnv {
    /// 已写入参照数据的环境（今日固定为 2024-05-06）
    pub fn new() -> Self {
        let (temp_file, db_path) = create_test_db().unwrap();
        let conn = open_sqlite_connection(&db_path).unwrap();
        seed_reference_data(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        Self {
            _temp_file: temp_file,
            db_path,
            store: SqliteDocumentStore::from_connection(conn.clone()),
            conn,
            settings: ImportSettings::new(today()),
            registry: ImporterRegistry::with_defaults(),
        }
    }

    pub fn importer(&self, kind: EntityKind) -> &dyn EntityImporter {
        self.registry.get_by_kind(kind).unwrap()
    }

    pub fn import(&self, kind: EntityKind, row: &ImportRow, shift: usize) -> RowOutcome {
        let ctx = ImportContext::new(&self.store, &self.settings);
        self.importer(kind).import_row(row, shift, &ctx)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.store.count_documents(kind).unwrap()
    }

    pub fn load(&self, id: i64) -> TargetDocument {
        self.store.load_document(id).unwrap().unwrap()
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 基准收文行（REG-1）
pub fn incoming_row() -> Vec<String> {
    [
        "REG-1",
        "01/02/2020",
        "Acme Corp",
        "Letter",
        "Hello",
        "Sales",
        "",
        "",
        "IN-7",
        "",
        "",
        "n",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// 基准发文行（OUT-1）
pub fn outgoing_row() -> Vec<String> {
    [
        "OUT-1",
        "15/03/2021",
        "ACME",
        "Letter",
        "Reply",
        "Sales",
        "",
        "Jane Doe",
        "Courier",
        "",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

// ==========================================
// MockConfigReader - 配置读取 Mock
// ==========================================
pub struct MockConfigReader {
    pub culture: String,
    pub diagnostics_locale: String,
    pub incoming_role: String,
    pub outgoing_role: String,
}

impl Default for MockConfigReader {
    fn default() -> Self {
        Self {
            culture: "en-GB".to_string(),
            diagnostics_locale: "en".to_string(),
            incoming_role: "IncomingDocumentsResponsible".to_string(),
            outgoing_role: "OutgoingDocumentsResponsible".to_string(),
        }
    }
}

impl ImportConfigReader for MockConfigReader {
    fn get_culture(&self) -> ImportResult<String> {
        Ok(self.culture.clone())
    }

    fn get_diagnostics_locale(&self) -> ImportResult<String> {
        Ok(self.diagnostics_locale.clone())
    }

    fn get_responsible_role(&self, entity_kind: EntityKind) -> ImportResult<String> {
        Ok(match entity_kind {
            EntityKind::IncomingLetter => self.incoming_role.clone(),
            EntityKind::OutgoingLetter => self.outgoing_role.clone(),
        })
    }
}
