// ==========================================
// 文档流转导入工具 - 文档领域模型
// ==========================================
// 职责: 导入行 / 目标文档 / 登记请求
// 红线: 同一 (登记号, 登记日期) 只对应一份文档
// ==========================================

use crate::domain::types::{EntityKind, RegistrationState};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// ImportRow - 导入行
// ==========================================
// parameters: 按位置排列的原始字符串字段
// extra_parameters: 带外选项（如 doc_register_id）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub parameters: Vec<String>,
    pub extra_parameters: HashMap<String, String>,
}

impl ImportRow {
    pub fn new<S: Into<String>>(parameters: Vec<S>) -> Self {
        Self {
            parameters: parameters.into_iter().map(Into::into).collect(),
            extra_parameters: HashMap::new(),
        }
    }

    /// 追加带外选项
    pub fn with_extra(mut self, key: &str, value: &str) -> Self {
        self.extra_parameters
            .insert(key.to_string(), value.to_string());
        self
    }

    /// 从 shift 开始截取 count 个字段；字段不足时返回 None
    pub fn fields(&self, shift: usize, count: usize) -> Option<&[String]> {
        let end = shift.checked_add(count)?;
        self.parameters.get(shift..end)
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra_parameters.get(key).map(String::as_str)
    }
}

// ==========================================
// TargetDocument - 目标文档
// ==========================================
// 对齐: document 表
// 自然键: (entity_kind, registration_number, registration_date)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDocument {
    // ===== 主键 =====
    pub id: Option<i64>, // None 表示尚未落库
    pub entity_kind: EntityKind,

    // ===== 登记信息 =====
    pub registration_number: String,
    pub registration_date: Option<NaiveDate>,
    pub registration_state: RegistrationState,
    pub document_register_id: Option<i64>,
    pub responsible_employee_id: Option<i64>,

    // 属性状态：登记号是否必填（仅内存，重新登记时临时放宽）
    #[serde(skip, default = "default_required")]
    pub registration_number_required: bool,

    // ===== 参照字段 =====
    pub correspondent_id: Option<i64>,
    pub document_kind_id: Option<i64>,
    pub department_id: Option<i64>,
    pub business_unit_id: Option<i64>,
    pub addressee_id: Option<i64>,
    pub prepared_by_id: Option<i64>,
    pub delivery_method_id: Option<i64>,

    // ===== 文本/日期字段 =====
    pub subject: String,
    pub dated: Option<NaiveDate>, // 来函日期
    pub in_number: String,        // 来函编号
    pub note: String,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_required() -> bool {
    true
}

impl TargetDocument {
    /// 创建空白文档（未落库）
    pub fn new(entity_kind: EntityKind) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            entity_kind,
            registration_number: String::new(),
            registration_date: None,
            registration_state: RegistrationState::NotRegistered,
            document_register_id: None,
            responsible_employee_id: None,
            registration_number_required: true,
            correspondent_id: None,
            document_kind_id: None,
            department_id: None,
            business_unit_id: None,
            addressee_id: None,
            prepared_by_id: None,
            delivery_method_id: None,
            subject: String::new(),
            dated: None,
            in_number: String::new(),
            note: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_registered(&self) -> bool {
        self.registration_state == RegistrationState::Registered
    }
}

// ==========================================
// RegistrationRequest - 登记请求
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationRequest {
    pub register_id: i64,
    pub registration_number: String,
    pub registration_date: NaiveDate,
    pub responsible_employee_id: Option<i64>,
}
