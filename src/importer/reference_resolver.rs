// ==========================================
// 文档流转导入工具 - 参照解析器
// ==========================================
// 职责: 按显示名称/代码解析参照实体
// 未找到是可恢复情况，严重级别由调用方决定（必填 Error / 可选 Warning）
// 无副作用
// ==========================================

use crate::domain::diagnostic::Diagnostics;
use crate::domain::reference::{ReferenceEntity, ResolvedReference};
use crate::domain::types::ReferenceKind;
use crate::importer::entity_importer_trait::{ImportSettings, RowAborted};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{ReferenceRegistry, RepositoryResult};
use chrono::NaiveDate;
use tracing::debug;

/// 诊断消息中标识文档的信息
#[derive(Debug, Clone, Copy)]
pub struct RowLabel<'l> {
    pub registration_number: &'l str,
    pub registration_date: Option<NaiveDate>,
}

pub struct ReferenceResolver<'a, R: ReferenceRegistry + ?Sized> {
    registry: &'a R,
    settings: &'a ImportSettings,
}

impl<'a, R: ReferenceRegistry + ?Sized> ReferenceResolver<'a, R> {
    pub fn new(registry: &'a R, settings: &'a ImportSettings) -> Self {
        Self { registry, settings }
    }

    /// 解析参照
    ///
    /// # 参数
    /// - kind: 参照种类
    /// - display_text: 行内原始文本（比较前去除首尾空白）
    ///
    /// # 返回
    /// - Ok(Found / NotFound): 空白文本直接返回 NotFound，不查询
    /// - Err: 查询失败
    pub fn resolve(
        &self,
        kind: ReferenceKind,
        display_text: &str,
    ) -> RepositoryResult<ResolvedReference> {
        let name = display_text.trim();
        if name.is_empty() {
            return Ok(ResolvedReference::NotFound);
        }

        let resolved = match self.registry.find_by_name(kind, name)? {
            Some(entity) => ResolvedReference::Found(entity),
            None => ResolvedReference::NotFound,
        };
        debug!(kind = %kind, name = name, found = resolved.is_found(), "参照解析");
        Ok(resolved)
    }

    /// 解析必填参照
    ///
    /// # 返回
    /// - Err(ReferenceNotFound): 文本为空或无匹配
    /// - Err(Persistence): 查询失败
    pub fn resolve_required(
        &self,
        kind: ReferenceKind,
        display_text: &str,
    ) -> ImportResult<ReferenceEntity> {
        match self.resolve(kind, display_text)? {
            ResolvedReference::Found(entity) => Ok(entity),
            ResolvedReference::NotFound => Err(ImportError::ReferenceNotFound {
                kind,
                name: display_text.trim().to_string(),
                required: true,
            }),
        }
    }

    /// 解析必填参照：未找到记录 Error 并中止本行
    pub fn require(
        &self,
        kind: ReferenceKind,
        field_key: &str,
        display_text: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<ReferenceEntity, RowAborted> {
        let field = self.field_label(field_key);
        match self.resolve_required(kind, display_text) {
            Ok(entity) => Ok(entity),
            Err(ImportError::ReferenceNotFound { name, .. }) => {
                diagnostics.error(self.settings.message(
                    "diagnostics.required_reference_not_found",
                    &[("field", &field), ("name", &name)],
                ));
                Err(RowAborted)
            }
            Err(err) => {
                diagnostics.error(self.settings.message(
                    "diagnostics.reference_lookup_failed",
                    &[
                        ("field", &field),
                        ("name", display_text.trim()),
                        ("error", &err.to_string()),
                    ],
                ));
                Err(RowAborted)
            }
        }
    }

    /// 解析可选参照：非空且未找到时记录 Warning，继续处理
    pub fn optional(
        &self,
        kind: ReferenceKind,
        field_key: &str,
        display_text: &str,
        label: RowLabel<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Option<ReferenceEntity>, RowAborted> {
        match self.lookup(kind, field_key, display_text, diagnostics)? {
            ResolvedReference::Found(entity) => Ok(Some(entity)),
            ResolvedReference::NotFound => {
                if !display_text.trim().is_empty() {
                    let date = label
                        .registration_date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default();
                    diagnostics.warning(self.settings.message(
                        "diagnostics.optional_reference_not_found",
                        &[
                            ("field", &self.field_label(field_key)),
                            ("name", display_text.trim()),
                            ("number", label.registration_number),
                            ("date", &date),
                        ],
                    ));
                }
                Ok(None)
            }
        }
    }

    // 查询失败记录 Error 并中止（可选参照）
    fn lookup(
        &self,
        kind: ReferenceKind,
        field_key: &str,
        display_text: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<ResolvedReference, RowAborted> {
        self.resolve(kind, display_text).map_err(|e| {
            diagnostics.error(self.settings.message(
                "diagnostics.reference_lookup_failed",
                &[
                    ("field", &self.field_label(field_key)),
                    ("name", display_text.trim()),
                    ("error", &e.to_string()),
                ],
            ));
            RowAborted
        })
    }

    fn field_label(&self, field_key: &str) -> String {
        self.settings.message(field_key, &[])
    }
}
