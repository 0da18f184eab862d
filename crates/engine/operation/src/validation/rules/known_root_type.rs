use async_graphql_parser::types::OperationType;

use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct KnownRootType;

impl<'a> Rule<DocumentValidationContext<'a>> for KnownRootType {
    fn name(&self) -> &'static str {
        "KnownRootType"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let Some(part) = ctx.part() else { return };
        let PartKind::Operation { ty, .. } = part.kind else {
            return;
        };
        match ty {
            OperationType::Query => {}
            OperationType::Mutation => {
                if ctx.schema().mutation_type().is_none() {
                    ctx.report(part.origin, "Schema is not configured for mutations");
                }
            }
            OperationType::Subscription => {
                ctx.report(part.origin, "Subscriptions are not supported");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> KnownRootType {
        KnownRootType
    }

    #[test]
    fn queries_and_mutations() {
        expect_passes_rule!(
            factory,
            r#"
          query Foo { dog { name } }
          mutation Bar { renameDog(name: "rex") { name } }
        "#,
        );
    }

    #[test]
    fn subscriptions() {
        expect_fails_rule!(factory, r"subscription OnDog { dog { name } }");
    }
}
