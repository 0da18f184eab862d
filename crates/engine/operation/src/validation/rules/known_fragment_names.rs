use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct KnownFragmentNames;

impl<'a> Rule<DocumentValidationContext<'a>> for KnownFragmentNames {
    fn name(&self) -> &'static str {
        "KnownFragmentNames"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        if let PartKind::FragmentSpread { fragment_name } = &part.kind {
            if ctx.document().fragment(fragment_name).is_none() {
                ctx.report(part.origin, format!(r#"Unknown fragment "{fragment_name}""#));
            }
        }
    }
}
