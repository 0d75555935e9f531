// ==========================================
// 文档流转导入工具 - 导入器注册表
// ==========================================
// 职责: 实体种类名称 → 导入器（大小写不敏感）
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::entity_importer_trait::EntityImporter;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::incoming_letter::IncomingLetterImporter;
use crate::importer::outgoing_letter::OutgoingLetterImporter;
use std::collections::HashMap;

pub struct ImporterRegistry {
    importers: HashMap<EntityKind, Box<dyn EntityImporter>>,
}

impl ImporterRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self {
            importers: HashMap::new(),
        }
    }

    /// 注册全部内置导入器
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(IncomingLetterImporter));
        registry.register(Box::new(OutgoingLetterImporter));
        registry
    }

    /// 注册导入器（同种类后注册者覆盖）
    pub fn register(&mut self, importer: Box<dyn EntityImporter>) {
        self.importers.insert(importer.entity_kind(), importer);
    }

    /// 按种类名称查找
    ///
    /// # 返回
    /// - Err(UnknownEntityKind): 名称无法识别或未注册
    pub fn get(&self, name: &str) -> ImportResult<&dyn EntityImporter> {
        EntityKind::from_str(name)
            .and_then(|kind| self.get_by_kind(kind))
            .ok_or_else(|| ImportError::UnknownEntityKind(name.to_string()))
    }

    pub fn get_by_kind(&self, kind: EntityKind) -> Option<&dyn EntityImporter> {
        self.importers.get(&kind).map(|importer| importer.as_ref())
    }

    /// 已注册的种类（按名称排序）
    pub fn kinds(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<EntityKind> = self.importers.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.to_db_str());
        kinds
    }
}

impl Default for ImporterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ImporterRegistry::with_defaults();
        let importer = registry.get("incomingletter").unwrap();
        assert_eq!(importer.entity_kind(), EntityKind::IncomingLetter);
        assert_eq!(importer.properties_count(), 12);

        let importer = registry.get("OutgoingLetter").unwrap();
        assert_eq!(importer.properties_count(), 10);
    }

    #[test]
    fn test_unknown_kind_is_error() {
        let registry = ImporterRegistry::with_defaults();
        assert!(matches!(
            registry.get("Contract"),
            Err(ImportError::UnknownEntityKind(_))
        ));

        let empty = ImporterRegistry::new();
        assert!(empty.get("IncomingLetter").is_err());
    }

    #[test]
    fn test_kinds_are_sorted() {
        let registry = ImporterRegistry::with_defaults();
        assert_eq!(
            registry.kinds(),
            vec![EntityKind::IncomingLetter, EntityKind::OutgoingLetter]
        );
    }
}
