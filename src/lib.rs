// ==========================================
// 文档流转导入工具 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 收文/发文表格数据导入（逐行容错、诊断聚合）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析、参照解析、Upsert
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DocumentFlow, EntityKind, ReferenceKind, RegistrationState, Severity};

// 领域实体
pub use domain::{
    Diagnostic, Diagnostics, DocumentRegister, ImportRow, ImportStage, ReferenceEntity,
    RowOutcome, RowStatus, TargetDocument,
};

// 导入
pub use importer::{
    BatchImporter, BatchOptions, BatchReport, EntityImporter, ImportContext, ImportError,
    ImportSettings, ImporterRegistry, UniversalRowReader,
};

// 仓储
pub use repository::{DocumentStore, SqliteDocumentStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "docflow-import";
