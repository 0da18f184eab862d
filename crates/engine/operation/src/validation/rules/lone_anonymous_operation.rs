use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct LoneAnonymousOperation;

impl<'a> Rule<DocumentValidationContext<'a>> for LoneAnonymousOperation {
    fn name(&self) -> &'static str {
        "LoneAnonymousOperation"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        if let PartKind::Operation { name: None, .. } = part.kind {
            if ctx.document().operations().len() > 1 {
                ctx.report(part.origin, "This anonymous operation must be the only defined operation");
            }
        }
    }
}
