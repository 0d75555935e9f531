// ==========================================
// 文档流转导入工具 - 批量导入
// ==========================================
// 职责: 逐行独立调用实体导入器，汇总为批次报告
// 红线: 单行失败不影响其他行；不跨行重试
// ==========================================

use crate::domain::diagnostic::{Diagnostics, RowStatus};
use crate::domain::types::EntityKind;
use crate::importer::entity_importer_trait::{ImportContext, ImportSettings};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{NumberedRows, RowReader};
use crate::importer::registry::ImporterRegistry;
use crate::repository::DocumentStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// BatchOptions - 批次级参数
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub shift: usize,
    pub extra_parameters: HashMap<String, String>, // 附加到每一行
}

// ==========================================
// RowReport - 单行报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowReport {
    pub row_number: usize,
    pub status: RowStatus,
    pub document_id: Option<i64>,
    pub diagnostics: Diagnostics,
}

// ==========================================
// BatchReport - 批次报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub entity_kind: EntityKind,
    pub source_file: Option<String>,
    pub total_rows: usize,
    pub succeeded: usize,
    pub aborted: usize,
    pub error_count: usize,
    pub warning_count: usize,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_snapshot: Option<serde_json::Value>,
    pub rows: Vec<RowReport>,
}

impl BatchReport {
    /// 附加运行时配置快照（便于追溯）
    pub fn with_config_snapshot(mut self, snapshot: serde_json::Value) -> Self {
        self.config_snapshot = Some(snapshot);
        self
    }

    /// 摘要参数（batch.summary 模板）
    pub fn summary_args(&self) -> [(&'static str, String); 5] {
        [
            ("batch_id", self.batch_id.clone()),
            ("succeeded", self.succeeded.to_string()),
            ("total", self.total_rows.to_string()),
            ("errors", self.error_count.to_string()),
            ("warnings", self.warning_count.to_string()),
        ]
    }
}

// ==========================================
// BatchImporter
// ==========================================
pub struct BatchImporter<'a> {
    registry: &'a ImporterRegistry,
    store: &'a dyn DocumentStore,
    settings: &'a ImportSettings,
}

impl<'a> BatchImporter<'a> {
    pub fn new(
        registry: &'a ImporterRegistry,
        store: &'a dyn DocumentStore,
        settings: &'a ImportSettings,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    /// 读取文件并导入
    ///
    /// # 返回
    /// - Err: 实体种类未知 / 文件无法读取（批次无法开始）
    pub fn import_file(
        &self,
        kind_name: &str,
        file_path: &Path,
        reader: &dyn RowReader,
        options: &BatchOptions,
    ) -> ImportResult<BatchReport> {
        // 先校验种类，避免读取后才失败
        self.registry.get(kind_name)?;

        let rows = reader.read_rows(file_path).map_err(|e| {
            error!(path = %file_path.display(), error = %e, "文件读取失败");
            e
        })?;

        let mut report = self.import_rows(kind_name, rows, options)?;
        report.source_file = Some(file_path.display().to_string());
        Ok(report)
    }

    /// 导入已读取的行
    #[instrument(skip(self, rows, options), fields(rows = rows.len()))]
    pub fn import_rows(
        &self,
        kind_name: &str,
        rows: NumberedRows,
        options: &BatchOptions,
    ) -> ImportResult<BatchReport> {
        let importer = self.registry.get(kind_name)?;
        let ctx = ImportContext::new(self.store, self.settings);

        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        info!(batch_id = %batch_id, entity = %importer.entity_kind(), "开始批量导入");

        let mut reports = Vec::with_capacity(rows.len());
        for (row_number, mut row) in rows {
            for (key, value) in &options.extra_parameters {
                row.extra_parameters
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }

            let outcome = importer.import_row(&row, options.shift, &ctx);
            if !outcome.is_done() {
                warn!(row = row_number, status = ?outcome.status, "行导入中止");
            }

            reports.push(RowReport {
                row_number,
                status: outcome.status,
                document_id: outcome.document.and_then(|d| d.id),
                diagnostics: outcome.diagnostics,
            });
        }

        let succeeded = reports
            .iter()
            .filter(|r| r.status == RowStatus::Done)
            .count();
        let report = BatchReport {
            batch_id,
            entity_kind: importer.entity_kind(),
            source_file: None,
            total_rows: reports.len(),
            succeeded,
            aborted: reports.len() - succeeded,
            error_count: reports.iter().map(|r| r.diagnostics.error_count()).sum(),
            warning_count: reports.iter().map(|r| r.diagnostics.warning_count()).sum(),
            imported_at: Utc::now(),
            elapsed_ms: start_time.elapsed().as_millis(),
            config_snapshot: None,
            rows: reports,
        };

        let args = report.summary_args();
        let args: Vec<(&str, &str)> = args.iter().map(|(k, v)| (*k, v.as_str())).collect();
        info!(
            batch_id = %report.batch_id,
            total = report.total_rows,
            succeeded = report.succeeded,
            aborted = report.aborted,
            elapsed_ms = report.elapsed_ms as u64,
            "{}",
            self.settings.message("batch.summary", &args)
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::ImportRow;
    use crate::importer::error::ImportError;
    use crate::repository::{DocumentSession, RepositoryError, RepositoryResult};
    use chrono::NaiveDate;

    // 会话总是失败的存储：所有行在开启会话时中止
    struct UnavailableStore;

    impl DocumentStore for UnavailableStore {
        fn begin_session(&self) -> RepositoryResult<Box<dyn DocumentSession + '_>> {
            Err(RepositoryError::LockError("busy".to_string()))
        }
    }

    fn settings() -> ImportSettings {
        ImportSettings::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_counts_sum_over_rows() {
        let registry = ImporterRegistry::with_defaults();
        let settings = settings();
        let batch = BatchImporter::new(&registry, &UnavailableStore, &settings);

        let rows = vec![
            // 字段不足：在会话前中止
            (2, ImportRow::new(vec!["REG-1"])),
            // 字段齐全：开启会话失败
            (3, ImportRow::new(vec![""; 12])),
        ];
        let report = batch
            .import_rows("IncomingLetter", rows, &BatchOptions::default())
            .unwrap();

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.aborted, 2);
        assert_eq!(report.error_count, 2);
        assert_eq!(report.warning_count, 0);
        assert_eq!(report.rows[0].row_number, 2);
        assert!(report.rows.iter().all(|r| r.document_id.is_none()));
    }

    #[test]
    fn test_unknown_kind_fails_batch() {
        let registry = ImporterRegistry::with_defaults();
        let settings = settings();
        let batch = BatchImporter::new(&registry, &UnavailableStore, &settings);

        let result = batch.import_rows("Memo", Vec::new(), &BatchOptions::default());
        assert!(matches!(result, Err(ImportError::UnknownEntityKind(_))));
    }

    #[test]
    fn test_report_serializes_without_empty_snapshot() {
        let registry = ImporterRegistry::with_defaults();
        let settings = settings();
        let batch = BatchImporter::new(&registry, &UnavailableStore, &settings);

        let report = batch
            .import_rows("OutgoingLetter", Vec::new(), &BatchOptions::default())
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entity_kind"], "OutgoingLetter");
        assert!(json.get("config_snapshot").is_none());

        let json = serde_json::to_value(report.with_config_snapshot(serde_json::json!({"a": 1})))
            .unwrap();
        assert_eq!(json["config_snapshot"]["a"], 1);
    }
}
