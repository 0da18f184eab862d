use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct UniqueOperationNames;

impl<'a> Rule<DocumentValidationContext<'a>> for UniqueOperationNames {
    fn name(&self) -> &'static str {
        "UniqueOperationNames"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let (Some(id), Some(part)) = (ctx.part_id(), ctx.part()) else {
            return;
        };
        let PartKind::Operation { name: Some(name), .. } = &part.kind else {
            return;
        };
        let document = ctx.document();
        let defined_before = document
            .operations()
            .iter()
            .take_while(|operation| **operation != id)
            .any(|operation| document.operation_name(*operation) == Some(name.as_str()));
        if defined_before {
            ctx.report(part.origin, format!(r#"There can be only one operation named "{name}""#));
        }
    }
}
