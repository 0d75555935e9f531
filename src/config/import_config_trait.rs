// ==========================================
// 文档流转导入工具 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::error::ImportResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    /// 获取日期/数值解析所用的区域设置名称
    ///
    /// # 默认值
    /// - en-GB
    fn get_culture(&self) -> ImportResult<String>;

    /// 获取诊断信息语言
    ///
    /// # 默认值
    /// - en
    fn get_diagnostics_locale(&self) -> ImportResult<String>;

    /// 获取登记时查找负责人所用的角色代码
    ///
    /// # 参数
    /// - entity_kind: 实体种类（收文 / 发文各自独立配置）
    ///
    /// # 默认值
    /// - IncomingLetter: IncomingDocumentsResponsible
    /// - OutgoingLetter: OutgoingDocumentsResponsible
    fn get_responsible_role(&self, entity_kind: EntityKind) -> ImportResult<String>;
}
