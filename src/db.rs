// ==========================================
// 文档流转导入工具 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（CREATE TABLE IF NOT EXISTS）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "DOCFLOW_IMPORT_DB_PATH";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS reference_entity (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            name TEXT NOT NULL,
            code TEXT,
            business_unit_id INTEGER REFERENCES reference_entity(id),
            status TEXT NOT NULL DEFAULT 'ACTIVE'
        );
        CREATE INDEX IF NOT EXISTS idx_reference_entity_kind_name
            ON reference_entity(kind, name);

        CREATE TABLE IF NOT EXISTS role_member (
            role_code TEXT NOT NULL,
            employee_id INTEGER NOT NULL REFERENCES reference_entity(id),
            business_unit_id INTEGER REFERENCES reference_entity(id),
            PRIMARY KEY (role_code, employee_id)
        );

        CREATE TABLE IF NOT EXISTS document_register (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            document_flow TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ACTIVE'
        );

        CREATE TABLE IF NOT EXISTS document (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_kind TEXT NOT NULL,
            registration_number TEXT NOT NULL DEFAULT '',
            registration_date TEXT,
            registration_state TEXT NOT NULL DEFAULT 'NOT_REGISTERED',
            document_register_id INTEGER REFERENCES document_register(id),
            responsible_employee_id INTEGER REFERENCES reference_entity(id),
            correspondent_id INTEGER REFERENCES reference_entity(id),
            document_kind_id INTEGER REFERENCES reference_entity(id),
            department_id INTEGER REFERENCES reference_entity(id),
            business_unit_id INTEGER REFERENCES reference_entity(id),
            addressee_id INTEGER REFERENCES reference_entity(id),
            prepared_by_id INTEGER REFERENCES reference_entity(id),
            delivery_method_id INTEGER REFERENCES reference_entity(id),
            subject TEXT NOT NULL DEFAULT '',
            dated TEXT,
            in_number TEXT NOT NULL DEFAULT '',
            note TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_document_natural_key
            ON document(entity_kind, registration_number, registration_date);

        CREATE TABLE IF NOT EXISTS document_body (
            document_id INTEGER NOT NULL REFERENCES document(id) ON DELETE CASCADE,
            version INTEGER NOT NULL,
            file_name TEXT NOT NULL,
            extension TEXT NOT NULL,
            content BLOB NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (document_id, version)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 DOCFLOW_IMPORT_DB_PATH（若设置）
/// - 否则: 用户数据目录/docflow-import/docflow_import.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./docflow_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("docflow-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("docflow_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
