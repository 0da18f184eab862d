use engine_schema::TypeDefinition;

use super::field_definition;
use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct ScalarLeafs;

impl<'a> Rule<DocumentValidationContext<'a>> for ScalarLeafs {
    fn name(&self) -> &'static str {
        "ScalarLeafs"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let (Some(id), Some(part)) = (ctx.part_id(), ctx.part()) else {
            return;
        };
        let PartKind::Field { name, .. } = &part.kind else {
            return;
        };
        let has_selection = ctx.document().selections(id).next().is_some();

        if name.as_str() == "__typename" {
            if has_selection {
                ctx.report(
                    part.origin,
                    format!(r#"Field "{name}" must not have a selection since type "String!" has no subfields"#),
                );
            }
            return;
        }

        let Some(field) = field_definition(ctx) else {
            return;
        };
        let Some(ty) = ctx.schema().get_type(field.named_type()) else {
            return;
        };
        match ty {
            TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) if has_selection => ctx.report(
                part.origin,
                format!(
                    r#"Field "{name}" must not have a selection since type "{}" has no subfields"#,
                    field.ty
                ),
            ),
            TypeDefinition::Object(_) | TypeDefinition::Interface(_) | TypeDefinition::Union(_) if !has_selection => {
                ctx.report(
                    part.origin,
                    format!(r#"Field "{name}" of type "{}" must have a selection of subfields"#, field.ty),
                );
            }
            _ => {}
        }
    }
}
