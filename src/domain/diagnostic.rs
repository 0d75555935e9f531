// ==========================================
// 文档流转导入工具 - 诊断信息聚合
// ==========================================
// 职责: 按发出顺序收集 Error / Warning
// 红线: 严重级别本身不决定中止，由各校验点决定
// ==========================================

use crate::domain::document::TargetDocument;
use crate::domain::types::Severity;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

// ==========================================
// Diagnostic - 单条诊断
// ==========================================
// 创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

// ==========================================
// Diagnostics - 单行诊断列表
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录错误（同时写日志）
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(message = %message, "导入错误");
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            message,
        });
    }

    /// 记录警告（同时写日志）
    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(message = %message, "导入警告");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ==========================================
// ImportStage - 单行状态机
// ==========================================
// Parsed → Resolved → Upserted → Persisted → Cascaded → Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImportStage {
    Started,
    Parsed,
    Resolved,
    Upserted,
    Persisted,
    Cascaded,
    Done,
}

// ==========================================
// RowStatus - 行最终状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    Done,
    Aborted { stage: ImportStage }, // stage: 中止前到达的最后阶段
}

// ==========================================
// RowOutcome - 单行导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub document: Option<TargetDocument>, // 仅在提交成功后有值
    pub diagnostics: Diagnostics,
    pub status: RowStatus,
}

impl RowOutcome {
    pub fn done(document: TargetDocument, diagnostics: Diagnostics) -> Self {
        Self {
            document: Some(document),
            diagnostics,
            status: RowStatus::Done,
        }
    }

    pub fn aborted(stage: ImportStage, diagnostics: Diagnostics) -> Self {
        Self {
            document: None,
            diagnostics,
            status: RowStatus::Aborted { stage },
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == RowStatus::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostics_keep_emission_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("first");
        diagnostics.error("second");
        diagnostics.warning("third");

        let messages: Vec<&str> = diagnostics
            .entries()
            .iter()
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(diagnostics.error_count(), 1);
        assert_eq!(diagnostics.warning_count(), 2);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn test_diagnostics_serialize_as_plain_list() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("w");

        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json[0]["severity"], "Warning");
        assert_eq!(json[0]["message"], "w");
    }

    #[test]
    fn test_aborted_outcome_has_no_document() {
        let outcome = RowOutcome::aborted(ImportStage::Parsed, Diagnostics::new());
        assert!(!outcome.is_done());
        assert!(outcome.document.is_none());
        assert_eq!(
            outcome.status,
            RowStatus::Aborted {
                stage: ImportStage::Parsed
            }
        );
    }
}
