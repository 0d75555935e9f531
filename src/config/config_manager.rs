// ==========================================
// 文档流转导入工具 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::domain::types::EntityKind;
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager（与文档仓储共享同一连接）
    ///
    /// 对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| ImportError::ConfigReadError {
                key: String::new(),
                message: format!("锁获取失败: {}", e),
            })?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self, key: &str) -> ImportResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: format!("锁获取失败: {}", e),
        })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self.get_conn(key)?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    ///
    /// 导入流程只读配置；此方法供测试与运维脚本预置 config_kv
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self.get_conn(key)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 随批次报告记录本次导入使用的配置
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self.get_conn("*")?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map)).map_err(|e| ImportError::Other(e.into()))
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_culture(&self) -> ImportResult<String> {
        // 允许显式配置为空串（invariant），因此不走 trim/空值回退
        Ok(self
            .get_global_config_value(config_keys::IMPORT_CULTURE)?
            .unwrap_or_else(|| defaults::CULTURE.to_string()))
    }

    fn get_diagnostics_locale(&self) -> ImportResult<String> {
        self.get_config_or_default(config_keys::DIAGNOSTICS_LOCALE, defaults::DIAGNOSTICS_LOCALE)
    }

    fn get_responsible_role(&self, entity_kind: EntityKind) -> ImportResult<String> {
        match entity_kind {
            EntityKind::IncomingLetter => self.get_config_or_default(
                config_keys::INCOMING_RESPONSIBLE_ROLE,
                defaults::INCOMING_RESPONSIBLE_ROLE,
            ),
            EntityKind::OutgoingLetter => self.get_config_or_default(
                config_keys::OUTGOING_RESPONSIBLE_ROLE,
                defaults::OUTGOING_RESPONSIBLE_ROLE,
            ),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 解析
    pub const IMPORT_CULTURE: &str = "import.culture";

    // 诊断
    pub const DIAGNOSTICS_LOCALE: &str = "import.diagnostics_locale";

    // 登记负责人角色
    pub const INCOMING_RESPONSIBLE_ROLE: &str = "import.role.incoming_responsible";
    pub const OUTGOING_RESPONSIBLE_ROLE: &str = "import.role.outgoing_responsible";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const CULTURE: &str = "en-GB";
    pub const DIAGNOSTICS_LOCALE: &str = "en";
    pub const INCOMING_RESPONSIBLE_ROLE: &str = "IncomingDocumentsResponsible";
    pub const OUTGOING_RESPONSIBLE_ROLE: &str = "OutgoingDocumentsResponsible";
}
