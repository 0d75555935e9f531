// ==========================================
// 文档流转导入工具 - SQLite 文档仓储实现
// ==========================================
// 职责: 实现参照查询 / 会话化文档读写（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 会话持有连接锁；未提交即回滚
// ==========================================

use crate::domain::document::{RegistrationRequest, TargetDocument};
use crate::domain::reference::{DocumentRegister, ReferenceEntity};
use crate::domain::types::{
    DocumentFlow, EntityKind, ReferenceKind, RegistrationState,
};
use crate::repository::document_repo::{DocumentSession, DocumentStore, ReferenceRegistry};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

const DOCUMENT_COLUMNS: &str = r#"
    id, entity_kind, registration_number, registration_date, registration_state,
    document_register_id, responsible_employee_id, correspondent_id, document_kind_id,
    department_id, business_unit_id, addressee_id, prepared_by_id, delivery_method_id,
    subject, dated, in_number, note, created_at, updated_at
"#;

// 数据库原始行（枚举字段以字符串读出，离开闭包后再转换）
struct DocumentRow {
    id: i64,
    entity_kind: String,
    registration_number: String,
    registration_date: Option<NaiveDate>,
    registration_state: String,
    document_register_id: Option<i64>,
    responsible_employee_id: Option<i64>,
    correspondent_id: Option<i64>,
    document_kind_id: Option<i64>,
    department_id: Option<i64>,
    business_unit_id: Option<i64>,
    addressee_id: Option<i64>,
    prepared_by_id: Option<i64>,
    delivery_method_id: Option<i64>,
    subject: String,
    dated: Option<NaiveDate>,
    in_number: String,
    note: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            entity_kind: row.get(1)?,
            registration_number: row.get(2)?,
            registration_date: row.get(3)?,
            registration_state: row.get(4)?,
            document_register_id: row.get(5)?,
            responsible_employee_id: row.get(6)?,
            correspondent_id: row.get(7)?,
            document_kind_id: row.get(8)?,
            department_id: row.get(9)?,
            business_unit_id: row.get(10)?,
            addressee_id: row.get(11)?,
            prepared_by_id: row.get(12)?,
            delivery_method_id: row.get(13)?,
            subject: row.get(14)?,
            dated: row.get(15)?,
            in_number: row.get(16)?,
            note: row.get(17)?,
            created_at: row.get(18)?,
            updated_at: row.get(19)?,
        })
    }

    fn into_document(self) -> RepositoryResult<TargetDocument> {
        let entity_kind = EntityKind::from_str(&self.entity_kind).ok_or_else(|| {
            RepositoryError::InvalidColumnValue {
                column: "entity_kind".to_string(),
                value: self.entity_kind.clone(),
            }
        })?;

        Ok(TargetDocument {
            id: Some(self.id),
            entity_kind,
            registration_number: self.registration_number,
            registration_date: self.registration_date,
            registration_state: RegistrationState::from_str(&self.registration_state),
            document_register_id: self.document_register_id,
            responsible_employee_id: self.responsible_employee_id,
            registration_number_required: true,
            correspondent_id: self.correspondent_id,
            document_kind_id: self.document_kind_id,
            department_id: self.department_id,
            business_unit_id: self.business_unit_id,
            addressee_id: self.addressee_id,
            prepared_by_id: self.prepared_by_id,
            delivery_method_id: self.delivery_method_id,
            subject: self.subject,
            dated: self.dated,
            in_number: self.in_number,
            note: self.note,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn reference_from_row(kind: ReferenceKind, row: &Row<'_>) -> rusqlite::Result<ReferenceEntity> {
    Ok(ReferenceEntity {
        id: row.get(0)?,
        kind,
        name: row.get(1)?,
        code: row.get(2)?,
        business_unit_id: row.get(3)?,
    })
}

// ==========================================
// SqliteDocumentStore
// ==========================================
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// 从已有连接创建 Store
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 id 读取文档（会话外只读查询）
    pub fn load_document(&self, id: i64) -> RepositoryResult<Option<TargetDocument>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM document WHERE id = ?1", DOCUMENT_COLUMNS);
        let row = conn
            .query_row(&sql, params![id], DocumentRow::from_row)
            .optional()?;
        row.map(DocumentRow::into_document).transpose()
    }

    /// 统计指定种类的文档数
    pub fn count_documents(&self, entity_kind: EntityKind) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM document WHERE entity_kind = ?1",
            params![entity_kind.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 统计文档正文版本数
    pub fn count_body_versions(&self, document_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM document_body WHERE document_id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn begin_session(&self) -> RepositoryResult<Box<dyn DocumentSession + '_>> {
        let conn = self.get_conn()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        debug!("会话开启");
        Ok(Box::new(SqliteSession {
            conn,
            committed: false,
        }))
    }
}

// ==========================================
// SqliteSession - 单行导入会话
// ==========================================
pub struct SqliteSession<'a> {
    conn: MutexGuard<'a, Connection>,
    committed: bool,
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "会话回滚失败");
        } else {
            debug!("会话未提交，已回滚");
        }
    }
}

impl SqliteSession<'_> {
    fn insert_document(&self, document: &mut TargetDocument) -> RepositoryResult<()> {
        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO document (
                entity_kind, registration_number, registration_date, registration_state,
                document_register_id, responsible_employee_id, correspondent_id,
                document_kind_id, department_id, business_unit_id, addressee_id,
                prepared_by_id, delivery_method_id, subject, dated, in_number, note,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19
            )
            "#,
            params![
                document.entity_kind.to_db_str(),
                document.registration_number,
                document.registration_date,
                document.registration_state.to_db_str(),
                document.document_register_id,
                document.responsible_employee_id,
                document.correspondent_id,
                document.document_kind_id,
                document.department_id,
                document.business_unit_id,
                document.addressee_id,
                document.prepared_by_id,
                document.delivery_method_id,
                document.subject,
                document.dated,
                document.in_number,
                document.note,
                now,
                now,
            ],
        )?;
        document.id = Some(self.conn.last_insert_rowid());
        document.created_at = now;
        document.updated_at = now;
        Ok(())
    }

    fn update_document(&self, id: i64, document: &mut TargetDocument) -> RepositoryResult<()> {
        let now = Utc::now();
        let affected = self.conn.execute(
            r#"
            UPDATE document SET
                registration_number = ?2, registration_date = ?3, registration_state = ?4,
                document_register_id = ?5, responsible_employee_id = ?6, correspondent_id = ?7,
                document_kind_id = ?8, department_id = ?9, business_unit_id = ?10,
                addressee_id = ?11, prepared_by_id = ?12, delivery_method_id = ?13,
                subject = ?14, dated = ?15, in_number = ?16, note = ?17, updated_at = ?18
            WHERE id = ?1
            "#,
            params![
                id,
                document.registration_number,
                document.registration_date,
                document.registration_state.to_db_str(),
                document.document_register_id,
                document.responsible_employee_id,
                document.correspondent_id,
                document.document_kind_id,
                document.department_id,
                document.business_unit_id,
                document.addressee_id,
                document.prepared_by_id,
                document.delivery_method_id,
                document.subject,
                document.dated,
                document.in_number,
                document.note,
                now,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "document".to_string(),
                id: id.to_string(),
            });
        }
        document.updated_at = now;
        Ok(())
    }
}

impl ReferenceRegistry for SqliteSession<'_> {
    fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> RepositoryResult<Option<ReferenceEntity>> {
        let entity = self
            .conn
            .query_row(
                r#"
                SELECT id, name, code, business_unit_id
                FROM reference_entity
                WHERE kind = ?1 AND status = 'ACTIVE' AND (TRIM(name) = ?2 OR code = ?2)
                ORDER BY id
                LIMIT 1
                "#,
                params![kind.to_db_str(), name],
                |row| reference_from_row(kind, row),
            )
            .optional()?;
        Ok(entity)
    }
}

impl DocumentSession for SqliteSession<'_> {
    fn find_by_natural_key(
        &self,
        entity_kind: EntityKind,
        registration_number: &str,
        registration_date: NaiveDate,
    ) -> RepositoryResult<Option<TargetDocument>> {
        let sql = format!(
            "SELECT {} FROM document \
             WHERE entity_kind = ?1 AND registration_number = ?2 AND registration_date = ?3 \
             ORDER BY id LIMIT 1",
            DOCUMENT_COLUMNS
        );
        let row = self
            .conn
            .query_row(
                &sql,
                params![
                    entity_kind.to_db_str(),
                    registration_number,
                    registration_date
                ],
                DocumentRow::from_row,
            )
            .optional()?;
        row.map(DocumentRow::into_document).transpose()
    }

    fn save(&self, document: &mut TargetDocument) -> RepositoryResult<()> {
        if document.is_registered()
            && document.registration_number_required
            && document.registration_number.trim().is_empty()
        {
            return Err(RepositoryError::RegistrationNumberRequired);
        }

        match document.id {
            Some(id) => self.update_document(id, document),
            None => self.insert_document(document),
        }
    }

    fn unregister(&self, document: &mut TargetDocument) -> RepositoryResult<()> {
        document.registration_number_required = false;
        document.registration_state = RegistrationState::NotRegistered;
        document.document_register_id = None;
        document.responsible_employee_id = None;
        Ok(())
    }

    fn add_body_version(
        &self,
        document: &TargetDocument,
        file_name: &str,
        extension: &str,
        content: &[u8],
    ) -> RepositoryResult<i64> {
        let document_id = document.id.ok_or_else(|| {
            RepositoryError::DocumentNotSaved("无法导入正文".to_string())
        })?;

        let version: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM document_body WHERE document_id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;

        self.conn.execute(
            r#"
            INSERT INTO document_body (document_id, version, file_name, extension, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![document_id, version, file_name, extension, content, Utc::now()],
        )?;
        Ok(version)
    }

    fn find_register(&self, register_id: i64) -> RepositoryResult<Option<DocumentRegister>> {
        let row: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, document_flow FROM document_register WHERE id = ?1 AND status = 'ACTIVE'",
                params![register_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        row.map(|(id, name, flow)| {
            let document_flow =
                DocumentFlow::from_str(&flow).ok_or_else(|| RepositoryError::InvalidColumnValue {
                    column: "document_flow".to_string(),
                    value: flow.clone(),
                })?;
            Ok(DocumentRegister {
                id,
                name,
                document_flow,
            })
        })
        .transpose()
    }

    fn find_responsible(
        &self,
        role_code: &str,
        business_unit_id: Option<i64>,
    ) -> RepositoryResult<Option<ReferenceEntity>> {
        // 优先本业务单元成员，其次不限业务单元的成员
        let entity = self
            .conn
            .query_row(
                r#"
                SELECT e.id, e.name, e.code, e.business_unit_id
                FROM role_member m
                JOIN reference_entity e ON e.id = m.employee_id
                WHERE m.role_code = ?1
                  AND e.status = 'ACTIVE'
                  AND (m.business_unit_id = ?2 OR m.business_unit_id IS NULL)
                ORDER BY CASE WHEN m.business_unit_id IS NULL THEN 1 ELSE 0 END, e.id
                LIMIT 1
                "#,
                params![role_code, business_unit_id],
                |row| reference_from_row(ReferenceKind::Employee, row),
            )
            .optional()?;
        Ok(entity)
    }

    fn register(
        &self,
        document: &mut TargetDocument,
        request: &RegistrationRequest,
    ) -> RepositoryResult<()> {
        document.registration_state = RegistrationState::Registered;
        document.registration_number_required = true;
        document.document_register_id = Some(request.register_id);
        document.registration_number = request.registration_number.clone();
        document.registration_date = Some(request.registration_date);
        document.responsible_employee_id = request.responsible_employee_id;
        self.save(document)
    }

    fn commit(mut self: Box<Self>) -> RepositoryResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| RepositoryError::TransactionError(e.to_string()))?;
        self.committed = true;
        debug!("会话已提交");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn setup_store() -> (SqliteDocumentStore, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO reference_entity (id, kind, name, code) VALUES (1, 'COUNTERPARTY', 'Acme Corp', 'ACME');
            INSERT INTO reference_entity (id, kind, name, status) VALUES (2, 'COUNTERPARTY', 'Closed Ltd', 'CLOSED');
            INSERT INTO reference_entity (id, kind, name) VALUES (3, 'COUNTERPARTY', '  Padded  ');
            INSERT INTO document_register (id, name, document_flow) VALUES (7, 'Inbox', 'INCOMING');
            "#,
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (SqliteDocumentStore::from_connection(conn.clone()), conn)
    }

    #[test]
    fn test_find_by_name_matches_name_code_and_trimmed_name() {
        let (store, _conn) = setup_store();
        let session = store.begin_session().unwrap();

        let by_name = session
            .find_by_name(ReferenceKind::Counterparty, "Acme Corp")
            .unwrap();
        assert_eq!(by_name.map(|e| e.id), Some(1));

        let by_code = session
            .find_by_name(ReferenceKind::Counterparty, "ACME")
            .unwrap();
        assert_eq!(by_code.map(|e| e.id), Some(1));

        let padded = session
            .find_by_name(ReferenceKind::Counterparty, "Padded")
            .unwrap();
        assert_eq!(padded.map(|e| e.id), Some(3));

        // 非 ACTIVE 记录不参与解析
        let closed = session
            .find_by_name(ReferenceKind::Counterparty, "Closed Ltd")
            .unwrap();
        assert!(closed.is_none());

        // 种类不匹配
        let wrong_kind = session
            .find_by_name(ReferenceKind::Department, "Acme Corp")
            .unwrap();
        assert!(wrong_kind.is_none());
    }

    #[test]
    fn test_uncommitted_session_rolls_back() {
        let (store, _conn) = setup_store();
        {
            let session = store.begin_session().unwrap();
            let mut doc = session.create(EntityKind::IncomingLetter);
            doc.registration_number = "R-1".to_string();
            session.save(&mut doc).unwrap();
            assert!(doc.id.is_some());
        }
        assert_eq!(store.count_documents(EntityKind::IncomingLetter).unwrap(), 0);
    }

    #[test]
    fn test_committed_session_persists_and_natural_key_finds_it() {
        let (store, _conn) = setup_store();
        let date = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();

        let session = store.begin_session().unwrap();
        let mut doc = session.create(EntityKind::IncomingLetter);
        doc.registration_number = "R-1".to_string();
        doc.registration_date = Some(date);
        doc.correspondent_id = Some(1);
        session.save(&mut doc).unwrap();
        session.commit().unwrap();

        let session = store.begin_session().unwrap();
        let found = session
            .find_by_natural_key(EntityKind::IncomingLetter, "R-1", date)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, doc.id);
        assert_eq!(found.correspondent_id, Some(1));

        let other_kind = session
            .find_by_natural_key(EntityKind::OutgoingLetter, "R-1", date)
            .unwrap();
        assert!(other_kind.is_none());
    }

    #[test]
    fn test_registered_document_requires_number_unless_relaxed() {
        let (store, _conn) = setup_store();
        let session = store.begin_session().unwrap();
        let mut doc = session.create(EntityKind::IncomingLetter);
        doc.registration_state = RegistrationState::Registered;

        let err = session.save(&mut doc).unwrap_err();
        assert!(matches!(err, RepositoryError::RegistrationNumberRequired));

        doc.registration_number_required = false;
        session.save(&mut doc).unwrap();
    }

    #[test]
    fn test_body_versions_increment() {
        let (store, _conn) = setup_store();
        let session = store.begin_session().unwrap();
        let mut doc = session.create(EntityKind::IncomingLetter);
        session.save(&mut doc).unwrap();

        assert_eq!(session.add_body_version(&doc, "a", "pdf", b"1").unwrap(), 1);
        assert_eq!(session.add_body_version(&doc, "a", "pdf", b"2").unwrap(), 2);
        session.commit().unwrap();

        assert_eq!(store.count_body_versions(doc.id.unwrap()).unwrap(), 2);
    }

    #[test]
    fn test_find_register_parses_flow() {
        let (store, _conn) = setup_store();
        let session = store.begin_session().unwrap();
        let register = session.find_register(7).unwrap().unwrap();
        assert_eq!(register.document_flow, DocumentFlow::Incoming);
        assert!(session.find_register(8).unwrap().is_none());
    }
}
