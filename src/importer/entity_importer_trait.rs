// ==========================================
// 文档流转导入工具 - 实体导入器 Trait
// ==========================================
// 职责: 定义"每种实体一个导入器"的公共契约（不包含实现）
// 依赖通过 ImportContext 显式传入，无全局状态
// ==========================================

use crate::config::{config_keys, defaults, ImportConfigReader};
use crate::domain::diagnostic::RowOutcome;
use crate::domain::document::ImportRow;
use crate::domain::types::EntityKind;
use crate::i18n;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_parser::{Culture, NumberStyles};
use crate::repository::DocumentStore;
use chrono::NaiveDate;
use tracing::debug;

// ==========================================
// EntityImporter Trait
// ==========================================
// 用途: 单行导入策略（无状态）
// 实现者: IncomingLetterImporter, OutgoingLetterImporter
pub trait EntityImporter: Send + Sync {
    /// 实体种类
    fn entity_kind(&self) -> EntityKind;

    /// 本实体消费的字段数
    fn properties_count(&self) -> usize;

    /// 导入一行
    ///
    /// # 参数
    /// - row: 导入行（调用方持有）
    /// - shift: 本实体首字段在行内的偏移（组合行）
    /// - ctx: 导入上下文
    ///
    /// # 返回
    /// - RowOutcome: 无论成功与否都携带完整诊断列表
    fn import_row(&self, row: &ImportRow, shift: usize, ctx: &ImportContext<'_>) -> RowOutcome;
}

// ==========================================
// RowAborted - 行已中止
// ==========================================
// 诊断已在中止点记录，调用方只需结束本行
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAborted;

// ==========================================
// ImportContext - 导入上下文
// ==========================================
pub struct ImportContext<'a> {
    pub store: &'a dyn DocumentStore,
    pub settings: &'a ImportSettings,
}

impl<'a> ImportContext<'a> {
    pub fn new(store: &'a dyn DocumentStore, settings: &'a ImportSettings) -> Self {
        Self { store, settings }
    }
}

// ==========================================
// ImportSettings - 单次导入运行设置
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSettings {
    pub culture: Culture,
    pub number_style: NumberStyles,
    pub today: NaiveDate, // 重新登记时写入的登记日期
    pub diagnostics_locale: String,
    pub incoming_responsible_role: String,
    pub outgoing_responsible_role: String,
}

impl ImportSettings {
    /// 使用默认配置创建
    pub fn new(today: NaiveDate) -> Self {
        Self {
            culture: Culture::default(),
            number_style: NumberStyles::default(),
            today,
            diagnostics_locale: defaults::DIAGNOSTICS_LOCALE.to_string(),
            incoming_responsible_role: defaults::INCOMING_RESPONSIBLE_ROLE.to_string(),
            outgoing_responsible_role: defaults::OUTGOING_RESPONSIBLE_ROLE.to_string(),
        }
    }

    /// 从配置读取器加载
    ///
    /// # 返回
    /// - Err(ConfigValueError): 区域设置或诊断语言不受支持
    pub fn load(config: &dyn ImportConfigReader, today: NaiveDate) -> ImportResult<Self> {
        let culture_name = config.get_culture()?;
        let culture =
            Culture::from_name(&culture_name).map_err(|e| ImportError::ConfigValueError {
                key: config_keys::IMPORT_CULTURE.to_string(),
                value: culture_name.clone(),
                message: e.to_string(),
            })?;

        let diagnostics_locale = config.get_diagnostics_locale()?;
        if !i18n::is_supported(&diagnostics_locale) {
            return Err(ImportError::ConfigValueError {
                key: config_keys::DIAGNOSTICS_LOCALE.to_string(),
                value: diagnostics_locale,
                message: format!("支持的语言: {}", i18n::SUPPORTED_LOCALES.join(", ")),
            });
        }

        let settings = Self {
            culture,
            number_style: NumberStyles::default(),
            today,
            diagnostics_locale,
            incoming_responsible_role: config.get_responsible_role(EntityKind::IncomingLetter)?,
            outgoing_responsible_role: config.get_responsible_role(EntityKind::OutgoingLetter)?,
        };
        debug!(
            culture = settings.culture.name(),
            locale = %settings.diagnostics_locale,
            "导入设置已加载"
        );
        Ok(settings)
    }

    /// 实体种类对应的登记负责人角色
    pub fn responsible_role(&self, entity_kind: EntityKind) -> &str {
        match entity_kind {
            EntityKind::IncomingLetter => &self.incoming_responsible_role,
            EntityKind::OutgoingLetter => &self.outgoing_responsible_role,
        }
    }

    /// 按诊断语言生成消息
    pub fn message(&self, key: &str, args: &[(&str, &str)]) -> String {
        i18n::t_in_locale(&self.diagnostics_locale, key, args)
    }
}
