use std::collections::HashMap;

use super::{definition_of, describe_operation, variables_in};
use crate::{
    validation::{DocumentValidationContext, Rule},
    PartId, PartKind,
};

pub struct NoUndefinedVariables;

/// Fragments reachable from each operation, computed on first use.
#[derive(Default)]
struct OperationFragments(HashMap<PartId, Vec<String>>);

impl<'a> Rule<DocumentValidationContext<'a>> for NoUndefinedVariables {
    fn name(&self) -> &'static str {
        "NoUndefinedVariables"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let (Some(id), Some(part)) = (ctx.part_id(), ctx.part()) else {
            return;
        };
        let PartKind::InputValue { value, .. } = &part.kind else {
            return;
        };
        let variables = variables_in(value);
        if variables.is_empty() {
            return;
        }

        let document = ctx.document();
        let operations = match part.operation {
            Some(operation) => vec![operation],
            None => {
                let PartKind::FragmentDefinition { name: fragment, .. } = &document[definition_of(document, id)].kind
                else {
                    return;
                };
                ctx.with_metadata::<Self, OperationFragments, _>(|reachable| {
                    document
                        .operations()
                        .iter()
                        .copied()
                        .filter(|operation| {
                            reachable
                                .0
                                .entry(*operation)
                                .or_insert_with(|| {
                                    document
                                        .reachable_fragments(*operation)
                                        .into_iter()
                                        .map(str::to_string)
                                        .collect()
                                })
                                .iter()
                                .any(|name| name == fragment.as_str())
                        })
                        .collect()
                })
            }
        };

        for operation in operations {
            for variable in &variables {
                let defined = document.children(operation).any(
                    |(_, child)| matches!(&child.kind, PartKind::Variable { name, .. } if name == *variable),
                );
                if !defined {
                    ctx.report(
                        part.origin,
                        format!(
                            r#"Variable "${variable}" is not defined{}"#,
                            describe_operation(document, operation, "by")
                        ),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> NoUndefinedVariables {
        NoUndefinedVariables
    }

    #[test]
    fn all_variables_defined() {
        expect_passes_rule!(
            factory,
            r"
          query Foo($a: Int, $b: Int) {
            complicatedArgs { multipleReqs(req1: $a, req2: $b) }
          }
        ",
        );
    }

    #[test]
    fn all_variables_in_fragments_deeply_defined() {
        expect_passes_rule!(
            factory,
            r"
          query Foo($a: Int, $b: Int) {
            complicatedArgs { ...FragA }
          }
          fragment FragA on ComplicatedArgs {
            multipleReqs(req1: $a, req2: $b)
            ...FragB
          }
          fragment FragB on ComplicatedArgs {
            intArgField(intArg: $a)
          }
        ",
        );
    }

    #[test]
    fn variables_within_lists_and_objects() {
        expect_passes_rule!(
            factory,
            r"
          query Foo($flag: Boolean) {
            complicatedArgs {
              complexArgField(complexArg: { requiredField: $flag })
            }
          }
        ",
        );
    }

    #[test]
    fn variable_not_defined() {
        let errors = rule_messages!(
            factory,
            r"
          query Foo($a: Int) {
            complicatedArgs { multipleReqs(req1: $a, req2: $b) }
          }
        ",
        );
        assert_eq!(errors, vec![r#"Variable "$b" is not defined by operation "Foo""#]);
    }

    #[test]
    fn variable_in_fragment_not_defined_by_one_operation() {
        let errors = rule_messages!(
            factory,
            r"
          query Foo($a: Int) {
            complicatedArgs { ...FragA }
          }
          query Bar {
            complicatedArgs { ...FragA }
          }
          fragment FragA on ComplicatedArgs {
            intArgField(intArg: $a)
          }
        ",
        );
        assert_eq!(errors, vec![r#"Variable "$a" is not defined by operation "Bar""#]);
    }

    #[test]
    fn variable_in_directive_not_defined() {
        expect_fails_rule!(factory, r"{ dog @include(if: $show) { name } }");
    }
}
