use std::collections::HashSet;

use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct NoUnusedFragments;

#[derive(Default)]
struct UsedFragments(Option<HashSet<String>>);

impl<'a> Rule<DocumentValidationContext<'a>> for NoUnusedFragments {
    fn name(&self) -> &'static str {
        "NoUnusedFragments"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let PartKind::FragmentDefinition { name, .. } = &part.kind else {
            return;
        };
        let document = ctx.document();
        let used = ctx.with_metadata::<Self, UsedFragments, _>(|used| {
            used.0
                .get_or_insert_with(|| {
                    document
                        .operations()
                        .iter()
                        .flat_map(|operation| document.reachable_fragments(*operation))
                        .map(str::to_string)
                        .collect()
                })
                .contains(name.as_str())
        });
        if !used {
            ctx.report(part.origin, format!(r#"Fragment "{name}" is never used"#));
        }
    }
}
