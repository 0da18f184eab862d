use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct FragmentsOnCompositeTypes;

impl<'a> Rule<DocumentValidationContext<'a>> for FragmentsOnCompositeTypes {
    fn name(&self) -> &'static str {
        "FragmentsOnCompositeTypes"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let condition = match &part.kind {
            PartKind::InlineFragment {
                type_condition: Some(condition),
            } => condition,
            PartKind::FragmentDefinition { type_condition, .. } => type_condition,
            _ => return,
        };
        match ctx.schema().get_type(condition) {
            None => ctx.report(part.origin, format!(r#"Unknown type "{condition}""#)),
            Some(ty) if !ty.is_composite() => ctx.report(
                part.origin,
                format!(r#"Fragment cannot condition on non composite type "{condition}""#),
            ),
            Some(_) => {}
        }
    }
}
