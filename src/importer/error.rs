// ==========================================
// 文档流转导入工具 - 导入错误类型
// ==========================================
// 工具: thiserror 派生宏
// 行内错误由导入器转为诊断；其余错误使整个批次无法开始
// ==========================================

use crate::domain::types::ReferenceKind;
use crate::importer::field_parser::FieldParseError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 行内错误 =====
    #[error(transparent)]
    FieldParse(#[from] FieldParseError),

    #[error("{kind} \"{name}\" 无法解析 (必填: {required})")]
    ReferenceNotFound {
        kind: ReferenceKind,
        name: String,
        required: bool,
    },

    #[error("选项 {key} 的值 \"{value}\" 不是整数")]
    OptionFormat { key: String, value: String },

    #[error("行内字段 {actual} 个，自位置 {shift} 起需要 {expected} 个")]
    FieldCount {
        expected: usize,
        shift: usize,
        actual: usize,
    },

    #[error(transparent)]
    Persistence(#[from] RepositoryError),

    // ===== 数据文件 =====
    #[error("找不到文件: {0}")]
    FileNotFound(String),

    #[error("不支持的文件类型 \"{0}\"（可用: .csv / .xlsx）")]
    UnsupportedFormat(String),

    #[error("读取文件出错: {0}")]
    FileReadError(String),

    #[error("Excel 工作簿无效: {0}")]
    ExcelParseError(String),

    #[error("CSV 内容无效: {0}")]
    CsvParseError(String),

    // ===== 批次设置 =====
    #[error("没有名为 \"{0}\" 的导入器")]
    UnknownEntityKind(String),

    #[error("读取配置 {key} 出错: {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置 {key}=\"{value}\" 无效: {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Persistence(err.into())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
