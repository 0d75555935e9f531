// ==========================================
// 文档流转导入工具 - 文档 Upsert 流程
// ==========================================
// 职责: 各信函导入器共用的行处理步骤
//   字段切片 / 日期解析 / 会话开启
//   查找或创建 → 重新登记 → 赋值 → 保存 → 级联 → 提交
// 约束: 第 4-8 步的任何失败记录为 Error，不提交（会话释放时回滚）
// ==========================================

use crate::domain::diagnostic::{Diagnostics, ImportStage, RowOutcome};
use crate::domain::document::{ImportRow, RegistrationRequest, TargetDocument};
use crate::domain::types::EntityKind;
use crate::importer::entity_importer_trait::{ImportContext, ImportSettings, RowAborted};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_parser::parse_date_only;
use crate::repository::DocumentSession;
use chrono::NaiveDate;
use std::path::Path;
use tracing::{debug, info, warn};

/// 登记簿选项键
pub const DOC_REGISTER_ID: &str = "doc_register_id";

// ==========================================
// 行预处理
// ==========================================

/// 从 shift 处截取本实体的字段
///
/// # 返回
/// - Err(FieldCount): 行内字段不足
pub fn checked_fields(row: &ImportRow, shift: usize, count: usize) -> ImportResult<&[String]> {
    row.fields(shift, count).ok_or(ImportError::FieldCount {
        expected: count,
        shift,
        actual: row.parameters.len(),
    })
}

/// 截取字段；字段不足记录 Error 并中止
pub fn slice_fields<'r>(
    row: &'r ImportRow,
    shift: usize,
    properties_count: usize,
    settings: &ImportSettings,
    diagnostics: &mut Diagnostics,
) -> Result<&'r [String], RowAborted> {
    checked_fields(row, shift, properties_count).map_err(|err| {
        debug!(error = %err, "字段数不符");
        diagnostics.error(settings.message(
            "diagnostics.field_count_mismatch",
            &[
                ("actual", &row.parameters.len().to_string()),
                ("expected", &properties_count.to_string()),
                ("shift", &shift.to_string()),
            ],
        ));
        RowAborted
    })
}

/// 解析日期字段；失败记录 Error 并中止
pub fn parse_date_field(
    value: &str,
    field_key: &str,
    settings: &ImportSettings,
    diagnostics: &mut Diagnostics,
) -> Result<Option<NaiveDate>, RowAborted> {
    parse_date_only(value, settings.number_style, &settings.culture).map_err(|e| {
        diagnostics.error(settings.message(
            "diagnostics.date_invalid",
            &[
                ("field", &settings.message(field_key, &[])),
                ("value", value.trim()),
                ("error", &e.to_string()),
            ],
        ));
        RowAborted
    })
}

/// 开启会话；失败记录 Error 并中止
pub fn open_session<'s>(
    ctx: &ImportContext<'s>,
    diagnostics: &mut Diagnostics,
) -> Result<Box<dyn DocumentSession + 's>, RowAborted> {
    ctx.store.begin_session().map_err(|e| {
        diagnostics.error(
            ctx.settings
                .message("diagnostics.session_failed", &[("error", &e.to_string())]),
        );
        RowAborted
    })
}

// ==========================================
// DocumentUpsert - 查找或创建并落库
// ==========================================
// assign: 将已解析/已解析参照的字段写入文档（由各导入器提供）
pub struct DocumentUpsert<'f> {
    pub entity_kind: EntityKind,
    pub registration_number: &'f str,
    pub registration_date: Option<NaiveDate>,
    pub file_path: &'f str,
}

impl DocumentUpsert<'_> {
    /// 执行第 4-9 步并生成行结果
    pub fn run(
        self,
        session: Box<dyn DocumentSession + '_>,
        assign: impl FnOnce(&mut TargetDocument),
        row: &ImportRow,
        ctx: &ImportContext<'_>,
        mut diagnostics: Diagnostics,
    ) -> RowOutcome {
        let settings = ctx.settings;
        let mut stage = ImportStage::Resolved;

        let result = self.upsert_and_cascade(
            session.as_ref(),
            assign,
            row,
            settings,
            &mut stage,
            &mut diagnostics,
        );

        let document = match result {
            Ok(document) => document,
            Err(err) => {
                diagnostics.error(describe_failure(&err, settings));
                return RowOutcome::aborted(stage, diagnostics);
            }
        };

        if let Err(e) = session.commit() {
            diagnostics.error(
                settings.message("diagnostics.commit_failed", &[("error", &e.to_string())]),
            );
            return RowOutcome::aborted(stage, diagnostics);
        }

        info!(
            entity = %document.entity_kind,
            document_id = ?document.id,
            registration_number = %document.registration_number,
            warnings = diagnostics.warning_count(),
            errors = diagnostics.error_count(),
            "文档已导入"
        );
        RowOutcome::done(document, diagnostics)
    }

    fn upsert_and_cascade(
        &self,
        session: &dyn DocumentSession,
        assign: impl FnOnce(&mut TargetDocument),
        row: &ImportRow,
        settings: &ImportSettings,
        stage: &mut ImportStage,
        diagnostics: &mut Diagnostics,
    ) -> ImportResult<TargetDocument> {
        // 4. 按自然键查找，否则新建
        let existing = match self.registration_date {
            Some(date) => {
                session.find_by_natural_key(self.entity_kind, self.registration_number, date)?
            }
            None => None,
        };
        let mut document = match existing {
            Some(document) => {
                debug!(document_id = ?document.id, "按自然键找到已有文档");
                document
            }
            None => session.create(self.entity_kind),
        };
        *stage = ImportStage::Upserted;

        // 5. 已登记文档先取消登记
        if document.is_registered() {
            reregister(session, &mut document, settings.today)?;
        }

        // 6. 赋值（日期仅在已设置时覆盖）
        document.registration_number = self.registration_number.to_string();
        if let Some(date) = self.registration_date {
            document.registration_date = Some(date);
        }
        assign(&mut document);

        // 7. 保存
        session.save(&mut document)?;
        *stage = ImportStage::Persisted;

        // 8a. 正文
        let file_path = self.file_path.trim();
        if !file_path.is_empty() {
            if let Err(e) = attach_body(session, &document, file_path) {
                diagnostics.error(settings.message(
                    "diagnostics.body_import_failed",
                    &[("path", file_path), ("error", &e.to_string())],
                ));
            }
        }

        // 8b. 登记簿
        if let Some(raw) = row.extra(DOC_REGISTER_ID) {
            let register_id = parse_register_option(raw)?;
            register_document(session, &mut document, register_id, settings, diagnostics)?;
        }
        *stage = ImportStage::Cascaded;

        Ok(document)
    }
}

/// 解析 doc_register_id 选项
///
/// 允许首尾空白；空串与超出 32 位整数范围的值均视为格式错误
pub fn parse_register_option(raw: &str) -> ImportResult<i64> {
    raw.trim()
        .parse::<i32>()
        .map(i64::from)
        .map_err(|_| ImportError::OptionFormat {
            key: DOC_REGISTER_ID.to_string(),
            value: raw.to_string(),
        })
}

// 重新登记: 放宽登记号必填、取消登记、以今日为登记日期保存中间状态
fn reregister(
    session: &dyn DocumentSession,
    document: &mut TargetDocument,
    today: NaiveDate,
) -> ImportResult<()> {
    document.registration_number_required = false;
    session.unregister(document)?;
    document.registration_date = Some(today);
    session.save(document)?;
    debug!(document_id = ?document.id, "已登记文档已取消登记");
    Ok(())
}

fn attach_body(
    session: &dyn DocumentSession,
    document: &TargetDocument,
    file_path: &str,
) -> ImportResult<i64> {
    let path = Path::new(file_path);
    if !path.is_file() {
        return Err(ImportError::FileNotFound(file_path.to_string()));
    }

    let content = std::fs::read(path)?;
    let file_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let version = session.add_body_version(document, file_name, &extension, &content)?;
    debug!(document_id = ?document.id, version, bytes = content.len(), "正文已导入");
    Ok(version)
}

// 登记簿缺失或流向不符记录 Error 继续；负责人缺失记录 Warning 继续
fn register_document(
    session: &dyn DocumentSession,
    document: &mut TargetDocument,
    register_id: i64,
    settings: &ImportSettings,
    diagnostics: &mut Diagnostics,
) -> ImportResult<()> {
    let register = match session.find_register(register_id)? {
        Some(register) => register,
        None => {
            diagnostics.error(settings.message(
                "diagnostics.register_not_found",
                &[("id", &register_id.to_string())],
            ));
            return Ok(());
        }
    };

    let document_flow = document.entity_kind.document_flow();
    if register.document_flow != document_flow {
        diagnostics.error(settings.message(
            "diagnostics.register_flow_mismatch",
            &[
                ("name", &register.name),
                ("register_flow", register.document_flow.to_db_str()),
                ("document_flow", document_flow.to_db_str()),
            ],
        ));
        return Ok(());
    }

    let role = settings.responsible_role(document.entity_kind);
    let responsible = session.find_responsible(role, document.business_unit_id)?;
    if responsible.is_none() {
        diagnostics.warning(
            settings.message("diagnostics.responsible_not_found", &[("role", role)]),
        );
    }

    let request = RegistrationRequest {
        register_id: register.id,
        registration_number: document.registration_number.clone(),
        registration_date: document.registration_date.unwrap_or(settings.today),
        responsible_employee_id: responsible.map(|e| e.id),
    };
    session.register(document, &request)?;
    debug!(document_id = ?document.id, register_id, "文档已登记");
    Ok(())
}

// 失败 → 诊断消息
fn describe_failure(err: &ImportError, settings: &ImportSettings) -> String {
    match err {
        ImportError::OptionFormat { key, value } => settings.message(
            "diagnostics.option_invalid",
            &[("key", key), ("value", value)],
        ),
        other => {
            warn!(error = %other, "行导入失败");
            settings.message("diagnostics.import_failed", &[("error", &other.to_string())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ImportSettings {
        ImportSettings::new(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
    }

    #[test]
    fn test_checked_fields_reports_counts() {
        let row = ImportRow::new(vec!["a", "b", "c"]);
        assert_eq!(checked_fields(&row, 1, 2).unwrap(), &["b", "c"]);

        let err = checked_fields(&row, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            ImportError::FieldCount {
                expected: 2,
                shift: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_slice_fields_records_single_error() {
        let row = ImportRow::new(vec!["a"]);
        let mut diagnostics = Diagnostics::new();

        let result = slice_fields(&row, 0, 12, &settings(), &mut diagnostics);
        assert_eq!(result, Err(RowAborted));
        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.entries()[0].message.contains("12"));
    }

    #[test]
    fn test_parse_date_field_names_field_and_value() {
        let mut diagnostics = Diagnostics::new();

        let blank = parse_date_field(" ", "fields.dated", &settings(), &mut diagnostics);
        assert_eq!(blank, Ok(None));
        assert!(diagnostics.is_empty());

        let bad = parse_date_field("soon", "fields.dated", &settings(), &mut diagnostics);
        assert_eq!(bad, Err(RowAborted));
        let message = &diagnostics.entries()[0].message;
        assert!(message.contains("Letter date"));
        assert!(message.contains("soon"));
    }

    #[test]
    fn test_register_option_accepts_padded_int32_only() {
        assert_eq!(parse_register_option(" 7 ").unwrap(), 7);
        assert_eq!(parse_register_option("2147483647").unwrap(), i64::from(i32::MAX));

        for raw in ["", "  ", "abc", "2147483648", "4294967297"] {
            assert!(
                matches!(
                    parse_register_option(raw),
                    Err(ImportError::OptionFormat { ref value, .. }) if value == raw
                ),
                "{:?}",
                raw
            );
        }
    }
}
