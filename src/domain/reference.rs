// ==========================================
// 文档流转导入工具 - 参照目录领域模型
// ==========================================
// 职责: 参照实体句柄 / 解析结果 / 登记簿
// ==========================================

use crate::domain::types::{DocumentFlow, ReferenceKind};
use serde::{Deserialize, Serialize};

// ==========================================
// ReferenceEntity - 参照实体句柄
// ==========================================
// 对齐: reference_entity 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: i64,
    pub kind: ReferenceKind,
    pub name: String,
    pub code: Option<String>,
    pub business_unit_id: Option<i64>, // 仅部门/员工有值
}

// ==========================================
// ResolvedReference - 解析结果
// ==========================================
// 未找到 != 查询失败（后者以 Err 返回）
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedReference {
    Found(ReferenceEntity),
    NotFound,
}

impl ResolvedReference {
    pub fn into_option(self) -> Option<ReferenceEntity> {
        match self {
            ResolvedReference::Found(entity) => Some(entity),
            ResolvedReference::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolvedReference::Found(_))
    }
}

// ==========================================
// DocumentRegister - 登记簿
// ==========================================
// 对齐: document_register 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRegister {
    pub id: i64,
    pub name: String,
    pub document_flow: DocumentFlow,
}
