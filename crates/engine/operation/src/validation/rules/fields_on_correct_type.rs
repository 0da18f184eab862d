use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct FieldsOnCorrectType;

impl<'a> Rule<DocumentValidationContext<'a>> for FieldsOnCorrectType {
    fn name(&self) -> &'static str {
        "FieldsOnCorrectType"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let PartKind::Field { name, .. } = &part.kind else {
            return;
        };
        let Some(parent_type) = ctx.parent_type() else {
            return;
        };
        if name.as_str() == "__typename" || parent_type.field(name).is_some() {
            return;
        }
        ctx.report(
            part.origin,
            format!(r#"Unknown field "{name}" on type "{}""#, parent_type.name()),
        );
    }
}
