use std::collections::HashMap;

use crate::{
    validation::{DocumentValidationContext, Rule},
    Document, PartId, PartKind,
};

/// Rejects operations selecting fields deeper than `limit`, counting the
/// fields pulled in through fragments.
pub struct MaxDepth {
    limit: usize,
}

impl MaxDepth {
    pub fn new(limit: usize) -> Self {
        MaxDepth { limit }
    }
}

/// Deepest field below `root`, relative to it. `None` while a fragment is
/// being measured, which cuts cycles short.
fn depth_below(document: &Document, root: PartId, fragments: &mut HashMap<String, Option<usize>>) -> usize {
    let mut deepest = 0;
    for (_, part) in document.descendants(root) {
        match &part.kind {
            PartKind::Field { .. } => deepest = deepest.max(part.depth),
            PartKind::FragmentSpread { fragment_name } => {
                let Some(fragment) = document.fragment(fragment_name) else {
                    continue;
                };
                let depth = match fragments.get(fragment_name.as_str()) {
                    Some(Some(depth)) => *depth,
                    Some(None) => continue,
                    None => {
                        fragments.insert(fragment_name.to_string(), None);
                        let depth = depth_below(document, fragment, fragments);
                        fragments.insert(fragment_name.to_string(), Some(depth));
                        depth
                    }
                };
                deepest = deepest.max(part.depth + depth);
            }
            _ => {}
        }
    }
    deepest
}

impl<'a> Rule<DocumentValidationContext<'a>> for MaxDepth {
    fn name(&self) -> &'static str {
        "MaxDepth"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let (Some(id), Some(part)) = (ctx.part_id(), ctx.part()) else {
            return;
        };
        if !matches!(part.kind, PartKind::Operation { .. }) {
            return;
        }
        let depth = depth_below(ctx.document(), id, &mut HashMap::new());
        if depth > self.limit {
            ctx.report(
                part.origin,
                format!("Query is nested too deep: depth {depth} exceeds the limit of {}", self.limit),
            );
        }
    }
}
