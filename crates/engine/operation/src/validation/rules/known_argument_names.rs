use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct KnownArgumentNames;

impl<'a> Rule<DocumentValidationContext<'a>> for KnownArgumentNames {
    fn name(&self) -> &'static str {
        "KnownArgumentNames"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let PartKind::InputValue { name, .. } = &part.kind else {
            return;
        };
        let Some(owner) = ctx.parent() else { return };
        let Some(owner_part) = owner.part() else { return };

        match &owner_part.kind {
            PartKind::Field { name: field_name, .. } => {
                let Some(parent_type) = owner.parent_type() else {
                    return;
                };
                let Some(field) = parent_type.field(field_name) else {
                    return;
                };
                if field.argument(name).is_none() {
                    ctx.report(
                        part.origin,
                        format!(
                            r#"Unknown argument "{name}" on field "{}.{field_name}""#,
                            parent_type.name()
                        ),
                    );
                }
            }
            PartKind::Directive { name: directive_name } => {
                let Some(directive) = ctx.schema().directive(directive_name) else {
                    return;
                };
                if !directive.arguments.contains_key(name.as_str()) {
                    ctx.report(
                        part.origin,
                        format!(r#"Unknown argument "{name}" on directive "@{directive_name}""#),
                    );
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> KnownArgumentNames {
        KnownArgumentNames
    }

    #[test]
    fn single_arg_is_known() {
        expect_passes_rule!(
            factory,
            r"
          fragment argOnRequiredArg on Dog {
            doesKnowCommand(dogCommand: SIT)
          }
          { dog { ...argOnRequiredArg } }
        ",
        );
    }

    #[test]
    fn multiple_args_in_reverse_order_are_known() {
        expect_passes_rule!(
            factory,
            r"
          {
            complicatedArgs { multipleReqs(req2: 2, req1: 1) }
          }
        ",
        );
    }

    #[test]
    fn directive_args_are_known() {
        expect_passes_rule!(
            factory,
            r"
          {
            dog @skip(if: true)
          }
        ",
        );
    }

    #[test]
    fn undirective_args_are_invalid() {
        expect_fails_rule!(
            factory,
            r"
          {
            dog @skip(unless: true)
          }
        ",
        );
    }

    #[test]
    fn invalid_arg_name() {
        let errors = rule_messages!(
            factory,
            r"
          fragment invalidArgName on Dog {
            doesKnowCommand(unknown: true)
          }
          { dog { ...invalidArgName } }
        ",
        );
        assert_eq!(errors, vec![r#"Unknown argument "unknown" on field "Dog.doesKnowCommand""#]);
    }

    #[test]
    fn unknown_args_deeply() {
        expect_fails_rule!(
            factory,
            r"
          {
            dog {
              doesKnowCommand(unknown: true)
            }
            human(id: 4) {
              relatives {
                name(unknown: true)
              }
            }
          }
        ",
        );
    }
}
