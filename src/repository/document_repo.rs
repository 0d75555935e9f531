// ==========================================
// 文档流转导入工具 - 文档仓储 Trait
// ==========================================
// 职责: 定义参照查询 / 会话化文档读写接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::document::{RegistrationRequest, TargetDocument};
use crate::domain::reference::{DocumentRegister, ReferenceEntity};
use crate::domain::types::{EntityKind, ReferenceKind};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;

// ==========================================
// ReferenceRegistry Trait
// ==========================================
// 用途: 按名称/代码查询参照实体
// 实现者: SqliteSession
pub trait ReferenceRegistry {
    /// 按名称或代码查找参照实体
    ///
    /// # 参数
    /// - kind: 参照种类
    /// - name: 已去除首尾空白的名称/代码
    ///
    /// # 返回
    /// - Ok(Some): 找到（多条时取 id 最小者）
    /// - Ok(None): 未找到
    /// - Err: 查询失败
    fn find_by_name(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> RepositoryResult<Option<ReferenceEntity>>;
}

// ==========================================
// DocumentSession Trait
// ==========================================
// 用途: 单行导入期间的会话（事务）
// 约束: 未调用 commit 的会话在释放时回滚
pub trait DocumentSession: ReferenceRegistry {
    /// 按自然键查找文档
    fn find_by_natural_key(
        &self,
        entity_kind: EntityKind,
        registration_number: &str,
        registration_date: NaiveDate,
    ) -> RepositoryResult<Option<TargetDocument>>;

    /// 创建空白文档（不落库，save 时插入）
    fn create(&self, entity_kind: EntityKind) -> TargetDocument {
        TargetDocument::new(entity_kind)
    }

    /// 保存文档（新文档插入并回填 id，已有文档更新）
    fn save(&self, document: &mut TargetDocument) -> RepositoryResult<()>;

    /// 取消登记（重新登记前置操作）
    ///
    /// # 说明
    /// - 清空登记簿与登记状态，保留登记号
    /// - 仅修改内存对象，需随后 save
    fn unregister(&self, document: &mut TargetDocument) -> RepositoryResult<()>;

    /// 为文档追加正文版本
    ///
    /// # 返回
    /// - Ok(i64): 新版本号
    fn add_body_version(
        &self,
        document: &TargetDocument,
        file_name: &str,
        extension: &str,
        content: &[u8],
    ) -> RepositoryResult<i64>;

    /// 查找登记簿
    fn find_register(&self, register_id: i64) -> RepositoryResult<Option<DocumentRegister>>;

    /// 查找承担指定角色的员工（优先匹配业务单元）
    fn find_responsible(
        &self,
        role_code: &str,
        business_unit_id: Option<i64>,
    ) -> RepositoryResult<Option<ReferenceEntity>>;

    /// 在登记簿中登记文档并保存
    fn register(
        &self,
        document: &mut TargetDocument,
        request: &RegistrationRequest,
    ) -> RepositoryResult<()>;

    /// 提交会话
    fn commit(self: Box<Self>) -> RepositoryResult<()>;
}

// ==========================================
// DocumentStore Trait
// ==========================================
// 用途: 会话工厂
// 实现者: SqliteDocumentStore
pub trait DocumentStore: Send + Sync {
    /// 开启新会话
    fn begin_session(&self) -> RepositoryResult<Box<dyn DocumentSession + '_>>;
}
