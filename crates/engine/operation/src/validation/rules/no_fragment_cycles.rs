use std::collections::HashSet;

use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct NoFragmentCycles;

impl<'a> Rule<DocumentValidationContext<'a>> for NoFragmentCycles {
    fn name(&self) -> &'static str {
        "NoFragmentCycles"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let (Some(id), Some(part)) = (ctx.part_id(), ctx.part()) else {
            return;
        };
        let PartKind::FragmentDefinition { name, .. } = &part.kind else {
            return;
        };
        let document = ctx.document();
        let reachable = document.reachable_fragments(id);
        if !reachable.contains(&name.as_str()) {
            return;
        }

        // Fragments reaching back to this one are part of the same cycle.
        let cycle = reachable
            .into_iter()
            .filter(|other| *other != name.as_str())
            .filter(|other| {
                document
                    .fragment(other)
                    .is_some_and(|other| document.reachable_fragments(other).contains(&name.as_str()))
            })
            .collect::<Vec<_>>();

        let first_report = ctx.with_metadata::<Self, HashSet<String>, _>(|reported| {
            if reported.contains(name.as_str()) {
                return false;
            }
            reported.insert(name.to_string());
            reported.extend(cycle.iter().map(|other| other.to_string()));
            true
        });
        if !first_report {
            return;
        }

        let text = if cycle.is_empty() {
            format!(r#"Cannot spread fragment "{name}" within itself"#)
        } else {
            format!(r#"Cannot spread fragment "{name}" within itself via {}"#, cycle.join(", "))
        };
        ctx.report(part.origin, text);
    }
}
