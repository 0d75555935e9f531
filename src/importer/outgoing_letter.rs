// ==========================================
// 文档流转导入工具 - 发文导入器
// ==========================================
// 字段（10 个，自 shift 起）:
//   0 登记号      1 登记日期    2 往来单位    3 文档类型
//   4 主题        5 部门        6 正文路径    7 拟稿人
//   8 投递方式    9 备注
// 必填参照: 往来单位 / 文档类型 / 部门
// 可选参照: 拟稿人 / 投递方式
// ==========================================

use crate::domain::diagnostic::{Diagnostics, ImportStage, RowOutcome};
use crate::domain::document::ImportRow;
use crate::domain::reference::ReferenceEntity;
use crate::domain::types::{EntityKind, ReferenceKind};
use crate::importer::document_upsert::{
    open_session, parse_date_field, slice_fields, DocumentUpsert,
};
use crate::importer::entity_importer_trait::{
    EntityImporter, ImportContext, ImportSettings, RowAborted,
};
use crate::importer::reference_resolver::{ReferenceResolver, RowLabel};
use crate::repository::DocumentSession;
use chrono::NaiveDate;
use tracing::instrument;

const PROPERTIES_COUNT: usize = 10;

struct OutgoingReferences {
    correspondent: ReferenceEntity,
    document_kind: ReferenceEntity,
    department: ReferenceEntity,
    prepared_by: Option<ReferenceEntity>,
    delivery_method: Option<ReferenceEntity>,
}

pub struct OutgoingLetterImporter;

impl OutgoingLetterImporter {
    fn resolve_references(
        &self,
        session: &dyn DocumentSession,
        fields: &[String],
        registration_date: Option<NaiveDate>,
        settings: &ImportSettings,
        diagnostics: &mut Diagnostics,
    ) -> Result<OutgoingReferences, RowAborted> {
        let resolver = ReferenceResolver::new(session, settings);
        let label = RowLabel {
            registration_number: fields[0].trim(),
            registration_date,
        };

        Ok(OutgoingReferences {
            correspondent: resolver.require(
                ReferenceKind::Counterparty,
                "fields.counterparty",
                &fields[2],
                diagnostics,
            )?,
            document_kind: resolver.require(
                ReferenceKind::DocumentKind,
                "fields.document_kind",
                &fields[3],
                diagnostics,
            )?,
            department: resolver.require(
                ReferenceKind::Department,
                "fields.department",
                &fields[5],
                diagnostics,
            )?,
            prepared_by: resolver.optional(
                ReferenceKind::Employee,
                "fields.prepared_by",
                &fields[7],
                label,
                diagnostics,
            )?,
            delivery_method: resolver.optional(
                ReferenceKind::MailDeliveryMethod,
                "fields.delivery_method",
                &fields[8],
                label,
                diagnostics,
            )?,
        })
    }
}

impl EntityImporter for OutgoingLetterImporter {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::OutgoingLetter
    }

    fn properties_count(&self) -> usize {
        PROPERTIES_COUNT
    }

    #[instrument(skip(self, row, ctx), fields(entity = "OutgoingLetter"))]
    fn import_row(&self, row: &ImportRow, shift: usize, ctx: &ImportContext<'_>) -> RowOutcome {
        let settings = ctx.settings;
        let mut diagnostics = Diagnostics::new();

        let parsed = slice_fields(row, shift, PROPERTIES_COUNT, settings, &mut diagnostics)
            .and_then(|fields| {
                let registration_date = parse_date_field(
                    &fields[1],
                    "fields.registration_date",
                    settings,
                    &mut diagnostics,
                )?;
                Ok((fields, registration_date))
            });
        let (fields, registration_date) = match parsed {
            Ok(parsed) => parsed,
            Err(RowAborted) => return RowOutcome::aborted(ImportStage::Started, diagnostics),
        };

        let session = match open_session(ctx, &mut diagnostics) {
            Ok(session) => session,
            Err(RowAborted) => return RowOutcome::aborted(ImportStage::Parsed, diagnostics),
        };
        let refs = match self.resolve_references(
            session.as_ref(),
            fields,
            registration_date,
            settings,
            &mut diagnostics,
        ) {
            Ok(refs) => refs,
            Err(RowAborted) => return RowOutcome::aborted(ImportStage::Parsed, diagnostics),
        };

        let upsert = DocumentUpsert {
            entity_kind: EntityKind::OutgoingLetter,
            registration_number: fields[0].trim(),
            registration_date,
            file_path: &fields[6],
        };
        upsert.run(
            session,
            |document| {
                document.correspondent_id = Some(refs.correspondent.id);
                document.document_kind_id = Some(refs.document_kind.id);
                document.subject = fields[4].clone();
                document.department_id = Some(refs.department.id);
                document.business_unit_id = refs.department.business_unit_id;
                document.prepared_by_id = refs.prepared_by.map(|e| e.id);
                document.delivery_method_id = refs.delivery_method.map(|e| e.id);
                document.note = fields[9].clone();
            },
            row,
            ctx,
            diagnostics,
        )
    }
}
