use async_graphql_parser::types::OperationType;
use engine_schema::DirectiveLocation;

use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct KnownDirectives;

fn location_of(kind: &PartKind) -> Option<DirectiveLocation> {
    let location = match kind {
        PartKind::Operation { ty, .. } => match ty {
            OperationType::Query => DirectiveLocation::Query,
            OperationType::Mutation => DirectiveLocation::Mutation,
            OperationType::Subscription => DirectiveLocation::Subscription,
        },
        PartKind::Field { .. } => DirectiveLocation::Field,
        PartKind::FragmentSpread { .. } => DirectiveLocation::FragmentSpread,
        PartKind::InlineFragment { .. } => DirectiveLocation::InlineFragment,
        PartKind::FragmentDefinition { .. } => DirectiveLocation::FragmentDefinition,
        PartKind::Variable { .. } => DirectiveLocation::VariableDefinition,
        PartKind::Directive { .. } | PartKind::InputValue { .. } => return None,
    };
    Some(location)
}

impl<'a> Rule<DocumentValidationContext<'a>> for KnownDirectives {
    fn name(&self) -> &'static str {
        "KnownDirectives"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let PartKind::Directive { name } = &part.kind else {
            return;
        };
        let Some(directive) = ctx.schema().directive(name) else {
            ctx.report(part.origin, format!(r#"Unknown directive "@{name}""#));
            return;
        };
        let Some(location) = ctx.parent().and_then(|parent| parent.part()).and_then(|parent| location_of(&parent.kind))
        else {
            return;
        };
        if !directive.locations.contains(&location) {
            ctx.report(
                part.origin,
                format!(r#"Directive "@{name}" may not be used on {location}"#),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> KnownDirectives {
        KnownDirectives
    }

    #[test]
    fn with_no_directives() {
        expect_passes_rule!(
            factory,
            r"
          query Foo {
            name
            ...Frag
          }
          fragment Frag on Dog {
            name
          }
        ",
        );
    }

    #[test]
    fn with_known_directives() {
        expect_passes_rule!(
            factory,
            r"
          {
            dog @include(if: true) {
              name
            }
            human @skip(if: false) {
              name
            }
          }
        ",
        );
    }

    #[test]
    fn with_unknown_directive() {
        let errors = rule_messages!(
            factory,
            r"
          {
            dog @unknown(directive: true) {
              name
            }
          }
        ",
        );
        assert_eq!(errors, vec![r#"Unknown directive "@unknown""#]);
    }

    #[test]
    fn with_well_placed_directives() {
        expect_passes_rule!(
            factory,
            r"
          query Foo @onQuery {
            dog @onField { name }
            ... @skip(if: true) { cat { name } }
          }
        ",
        );
    }

    #[test]
    fn with_misplaced_directives() {
        let errors = rule_messages!(
            factory,
            r"
          query Foo @onField {
            dog @onQuery { name }
          }
        ",
        );
        assert_eq!(
            errors,
            vec![
                r#"Directive "@onField" may not be used on QUERY"#,
                r#"Directive "@onQuery" may not be used on FIELD"#,
            ]
        );
    }
}
