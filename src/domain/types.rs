// ==========================================
// 文档流转导入工具 - 领域类型定义
// ==========================================
// 职责: 实体种类 / 引用种类 / 登记状态 / 诊断级别
// 序列化格式: 与数据库存储字符串一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
// 每种实体对应一个导入器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    IncomingLetter, // 收文
    OutgoingLetter, // 发文
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EntityKind {
    /// 从名称解析（大小写不敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "incomingletter" | "incoming_letter" => Some(EntityKind::IncomingLetter),
            "outgoingletter" | "outgoing_letter" => Some(EntityKind::OutgoingLetter),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EntityKind::IncomingLetter => "IncomingLetter",
            EntityKind::OutgoingLetter => "OutgoingLetter",
        }
    }

    /// 文档流向（用于校验登记簿）
    pub fn document_flow(&self) -> DocumentFlow {
        match self {
            EntityKind::IncomingLetter => DocumentFlow::Incoming,
            EntityKind::OutgoingLetter => DocumentFlow::Outgoing,
        }
    }
}

// ==========================================
// 文档流向 (Document Flow)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFlow {
    Incoming,
    Outgoing,
}

impl fmt::Display for DocumentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl DocumentFlow {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "INCOMING" => Some(DocumentFlow::Incoming),
            "OUTGOING" => Some(DocumentFlow::Outgoing),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            DocumentFlow::Incoming => "INCOMING",
            DocumentFlow::Outgoing => "OUTGOING",
        }
    }
}

// ==========================================
// 引用种类 (Reference Kind)
// ==========================================
// 外部参照目录：按名称/代码解析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Counterparty,       // 往来单位
    Department,         // 部门
    Employee,           // 员工
    DocumentKind,       // 文档类型
    MailDeliveryMethod, // 投递方式
    BusinessUnit,       // 业务单元（仅由部门派生，不按名称解析）
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl ReferenceKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "COUNTERPARTY" => Some(ReferenceKind::Counterparty),
            "DEPARTMENT" => Some(ReferenceKind::Department),
            "EMPLOYEE" => Some(ReferenceKind::Employee),
            "DOCUMENT_KIND" => Some(ReferenceKind::DocumentKind),
            "MAIL_DELIVERY_METHOD" => Some(ReferenceKind::MailDeliveryMethod),
            "BUSINESS_UNIT" => Some(ReferenceKind::BusinessUnit),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReferenceKind::Counterparty => "COUNTERPARTY",
            ReferenceKind::Department => "DEPARTMENT",
            ReferenceKind::Employee => "EMPLOYEE",
            ReferenceKind::DocumentKind => "DOCUMENT_KIND",
            ReferenceKind::MailDeliveryMethod => "MAIL_DELIVERY_METHOD",
            ReferenceKind::BusinessUnit => "BUSINESS_UNIT",
        }
    }
}

// ==========================================
// 登记状态 (Registration State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegistrationState {
    #[default]
    NotRegistered, // 未登记
    Registered,    // 已登记（定稿）
    Reserved,      // 已预留号码
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RegistrationState {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "REGISTERED" => RegistrationState::Registered,
            "RESERVED" => RegistrationState::Reserved,
            _ => RegistrationState::NotRegistered, // 默认值
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RegistrationState::NotRegistered => "NOT_REGISTERED",
            RegistrationState::Registered => "REGISTERED",
            RegistrationState::Reserved => "RESERVED",
        }
    }
}

// ==========================================
// 诊断级别 (Severity)
// ==========================================
// Error 由各校验点决定是否中止行；Warning 仅记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warn"),
        }
    }
}
