use std::collections::{HashMap, HashSet};

use super::{describe_operation, variables_in};
use crate::{
    validation::{DocumentValidationContext, Rule},
    Document, PartId, PartKind,
};

pub struct NoUnusedVariables;

/// Variables used by each operation, including through fragments.
#[derive(Default)]
struct UsedVariables(HashMap<PartId, HashSet<String>>);

fn used_variables(document: &Document, operation: PartId) -> HashSet<String> {
    let mut roots = vec![operation];
    roots.extend(
        document
            .reachable_fragments(operation)
            .into_iter()
            .filter_map(|name| document.fragment(name)),
    );
    roots
        .into_iter()
        .flat_map(|root| document.descendants(root))
        .filter_map(|(_, part)| match &part.kind {
            PartKind::InputValue { value, .. } => Some(variables_in(value)),
            _ => None,
        })
        .flatten()
        .map(ToString::to_string)
        .collect()
}

impl<'a> Rule<DocumentValidationContext<'a>> for NoUnusedVariables {
    fn name(&self) -> &'static str {
        "NoUnusedVariables"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let (PartKind::Variable { name, .. }, Some(operation)) = (&part.kind, part.operation) else {
            return;
        };
        let document = ctx.document();
        let used = ctx.with_metadata::<Self, UsedVariables, _>(|used| {
            used.0
                .entry(operation)
                .or_insert_with(|| used_variables(document, operation))
                .contains(name.as_str())
        });
        if !used {
            ctx.report(
                part.origin,
                format!(
                    r#"Variable "${name}" is never used{}"#,
                    describe_operation(document, operation, "in")
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> NoUnusedVariables {
        NoUnusedVariables
    }

    #[test]
    fn uses_all_variables() {
        expect_passes_rule!(
            factory,
            r"
          query ($a: Int, $b: Int) {
            complicatedArgs { multipleReqs(req1: $a, req2: $b) }
          }
        ",
        );
    }

    #[test]
    fn uses_all_variables_deeply_in_fragments() {
        expect_passes_rule!(
            factory,
            r"
          query Foo($a: Int, $b: Int, $c: Boolean) {
            complicatedArgs { ...FragA }
          }
          fragment FragA on ComplicatedArgs {
            multipleReqs(req1: $a, req2: $b)
            ...FragB @include(if: $c)
          }
          fragment FragB on ComplicatedArgs {
            intArgField
          }
        ",
        );
    }

    #[test]
    fn variable_not_used() {
        let errors = rule_messages!(
            factory,
            r"
          query Foo($a: Int, $b: Int) {
            complicatedArgs { intArgField(intArg: $a) }
          }
        ",
        );
        assert_eq!(errors, vec![r#"Variable "$b" is never used in operation "Foo""#]);
    }

    #[test]
    fn variable_not_used_by_anonymous_operation() {
        let errors = rule_messages!(factory, r"query ($a: Int) { dog { name } }");
        assert_eq!(errors, vec![r#"Variable "$a" is never used"#]);
    }
}
