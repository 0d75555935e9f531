// ==========================================
// 文档流转导入工具 - 收文导入器
// ==========================================
// 字段（12 个，自 shift 起）:
//   0 登记号      1 登记日期    2 往来单位    3 文档类型
//   4 主题        5 部门        6 正文路径    7 来函日期
//   8 来函编号    9 收件人     10 投递方式   11 备注
// 必填参照: 往来单位 / 文档类型 / 部门
// 可选参照: 收件人 / 投递方式
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

const PROPERTIES_COUNT: usize = 12;

// 已解析的参照
struct IncomingReferences {
    correspondent: ReferenceEntity,
    document_kind: ReferenceEntity,
    department: ReferenceEntity,
    addressee: Option<ReferenceEntity>,
    delivery_method: Option<ReferenceEntity>,
}

pub struct IncomingLetterImporter;

impl IncomingLetterImporter {
    fn resolve_references(
        &self,
        session: &dyn DocumentSession,
        fields: &[String],
        registration_date: Option<NaiveDate>,
        settings: &ImportSettings,
        diagnostics: &mut Diagnostics,
    ) -> Result<IncomingReferences, RowAborted> {
        let resolver = ReferenceResolver::new(session, settings);
        let label = RowLabel {
            registration_number: fields[0].trim(),
            registration_date,
        };

        let correspondent = resolver.require(
            ReferenceKind::Counterparty,
            "fields.counterparty",
            &fields[2],
            diagnostics,
        )?;
        let document_kind = resolver.require(
            ReferenceKind::DocumentKind,
            "fields.document_kind",
            &fields[3],
            diagnostics,
        )?;
        let department = resolver.require(
            ReferenceKind::Department,
            "fields.department",
            &fields[5],
            diagnostics,
        )?;
        let addressee = resolver.optional(
            ReferenceKind::Employee,
            "fields.addressee",
            &fields[9],
            label,
            diagnostics,
        )?;
        let delivery_method = resolver.optional(
            ReferenceKind::MailDeliveryMethod,
            "fields.delivery_method",
            &fields[10],
            label,
            diagnostics,
        )?;

        Ok(IncomingReferences {
            correspondent,
            document_kind,
            department,
            addressee,
            delivery_method,
        })
    }
}

impl EntityImporter for IncomingLetterImporter {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::IncomingLetter
    }

    fn properties_count(&self) -> usize {
        PROPERTIES_COUNT
    }

    #[instrument(skip(self, row, ctx), fields(entity = "IncomingLetter"))]
    fn import_row(&self, row: &ImportRow, shift: usize, ctx: &ImportContext<'_>) -> RowOutcome {
        let settings = ctx.settings;
        let mut diagnostics = Diagnostics::new();

        // 1-2. 字段数与日期
        let parsed = slice_fields(row, shift, PROPERTIES_COUNT, settings, &mut diagnostics)
            .and_then(|fields| {
                let registration_date = parse_date_field(
                    &fields[1],
                    "fields.registration_date",
                    settings,
                    &mut diagnostics,
                )?;
                let dated =
                    parse_date_field(&fields[7], "fields.dated", settings, &mut diagnostics)?;
                Ok((fields, registration_date, dated))
            });
        let (fields, registration_date, dated) = match parsed {
            Ok(parsed) => parsed,
            Err(RowAborted) => return RowOutcome::aborted(ImportStage::Started, diagnostics),
        };

        // 3. 会话与参照
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

        // 4-9. 查找或创建、赋值、保存、级联、提交
        let upsert = DocumentUpsert {
            entity_kind: EntityKind::IncomingLetter,
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
                if let Some(dated) = dated {
                    document.dated = Some(dated);
                }
                document.in_number = fields[8].clone();
                document.addressee_id = refs.addressee.map(|e| e.id);
                document.delivery_method_id = refs.delivery_method.map(|e| e.id);
                document.note = fields[11].clone();
            },
            row,
            ctx,
            diagnostics,
        )
    }
}
