// ==========================================
// 文档流转导入工具 - 导入层
// ==========================================
// 职责: 表格行 → 解析 → 参照解析 → 文档 Upsert → 诊断
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod batch_runner;
pub mod document_upsert;
pub mod entity_importer_trait;
pub mod error;
pub mod field_parser;
pub mod file_parser;
pub mod incoming_letter;
pub mod outgoing_letter;
pub mod reference_resolver;
pub mod registry;

// 重导出核心类型
pub use batch_runner::{BatchImporter, BatchOptions, BatchReport, RowReport};
pub use document_upsert::DOC_REGISTER_ID;
pub use error::{ImportError, ImportResult};
pub use field_parser::{Culture, FieldParseError, NumberStyles};
pub use file_parser::{CsvRowReader, ExcelRowReader, UniversalRowReader};
pub use incoming_letter::IncomingLetterImporter;
pub use outgoing_letter::OutgoingLetterImporter;
pub use reference_resolver::ReferenceResolver;
pub use registry::ImporterRegistry;

// 重导出 Trait 接口
pub use entity_importer_trait::{EntityImporter, ImportContext, ImportSettings};
pub use file_parser::RowReader;
