use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct UniqueDirectivesPerLocation;

impl<'a> Rule<DocumentValidationContext<'a>> for UniqueDirectivesPerLocation {
    fn name(&self) -> &'static str {
        "UniqueDirectivesPerLocation"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(id) = ctx.part_id() else { return };
        let document = ctx.document();
        let mut seen: Vec<&str> = Vec::new();
        for (_, directive) in document.directives(id) {
            let PartKind::Directive { name } = &directive.kind else {
                continue;
            };
            let repeatable = ctx
                .schema()
                .directive(name)
                .is_some_and(|definition| definition.is_repeatable);
            if repeatable {
                continue;
            }
            if seen.contains(&name.as_str()) {
                ctx.report(
                    directive.origin,
                    format!(r#"The directive "@{name}" can only be used once at this location"#),
                );
            } else {
                seen.push(name.as_str());
            }
        }
    }
}
