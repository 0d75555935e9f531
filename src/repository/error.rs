// ==========================================
// 文档流转导入工具 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: rusqlite 错误按约束类别归类，未命中行 → NotFound
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 存储访问 =====
    #[error("{entity} 不存在 (id={id})")]
    NotFound { entity: String, id: String },

    #[error("连接锁不可用: {0}")]
    LockError(String),

    #[error("事务操作失败: {0}")]
    TransactionError(String),

    #[error("SQL 执行失败: {0}")]
    QueryError(String),

    #[error("违反唯一约束: {0}")]
    UniqueConstraintViolation(String),

    #[error("违反外键约束: {0}")]
    ForeignKeyViolation(String),

    // ===== 文档状态 =====
    #[error("已登记文档必须有登记号")]
    RegistrationNumberRequired,

    #[error("文档尚未落库: {0}")]
    DocumentNotSaved(String),

    // ===== 存储内容 =====
    #[error("列 {column} 含无法识别的值: {value}")]
    InvalidColumnValue { column: String, value: String },
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "row".to_string(),
                id: "?".to_string(),
            },
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::ForeignKeyViolation(msg)
            }
            other => RepositoryError::QueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_constraint_failures_are_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (k TEXT UNIQUE, parent_id INTEGER REFERENCES parent(id));
             INSERT INTO child (k) VALUES ('a');",
        )
        .unwrap();

        let unique: RepositoryError = conn
            .execute("INSERT INTO child (k) VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(matches!(unique, RepositoryError::UniqueConstraintViolation(_)));

        let foreign: RepositoryError = conn
            .execute("INSERT INTO child (k, parent_id) VALUES ('b', 42)", [])
            .unwrap_err()
            .into();
        assert!(matches!(foreign, RepositoryError::ForeignKeyViolation(_)));
    }
}
