// ==========================================
// 文档流转导入工具 - 领域模型层
// ==========================================
// 职责: 定义导入行、目标文档、参照实体、诊断信息
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod diagnostic;
pub mod document;
pub mod reference;
pub mod types;

// 重导出核心类型
pub use diagnostic::{Diagnostic, Diagnostics, ImportStage, RowOutcome, RowStatus};
pub use document::{ImportRow, RegistrationRequest, TargetDocument};
pub use reference::{DocumentRegister, ReferenceEntity, ResolvedReference};
pub use types::{
    DocumentFlow, EntityKind, ReferenceKind, RegistrationState, Severity,
};
