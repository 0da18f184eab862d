use indexmap::IndexMap;

use engine_schema::InputValueDefinition;

use super::field_definition;
use crate::{
    validation::{DocumentValidationContext, Rule},
    PartKind,
};

pub struct ProvidedRequiredArguments;

impl<'a> Rule<DocumentValidationContext<'a>> for ProvidedRequiredArguments {
    fn name(&self) -> &'static str {
        "ProvidedRequiredArguments"
    }

    fn apply(&self, ctx: &DocumentValidationContext<'a>) {
        let (Some(id), Some(part)) = (ctx.part_id(), ctx.part()) else {
            return;
        };
        let (subject, definitions): (String, &IndexMap<String, InputValueDefinition>) = match &part.kind {
            PartKind::Field { name, .. } => match field_definition(ctx) {
                Some(field) => (format!(r#"Field "{name}""#), &field.arguments),
                None => return,
            },
            PartKind::Directive { name } => match ctx.schema().directive(name) {
                Some(directive) => (format!(r#"Directive "@{name}""#), &directive.arguments),
                None => return,
            },
            _ => return,
        };

        let document = ctx.document();
        for argument in definitions.values().filter(|argument| argument.is_required()) {
            let provided = document
                .arguments(id)
                .any(|(name, value)| name.as_str() == argument.name && !matches!(value, async_graphql_value::Value::Null));
            if !provided {
                ctx.report(
                    part.origin,
                    format!(
                        r#"{subject} argument "{}" of type "{}" is required, but it was not provided"#,
                        argument.name, argument.ty
                    ),
                );
            }
        }
    }
}
