//! Checks of the resolved data tree against the output types of the plan,
//! driven by the same rule engine as document validation.

use async_graphql_parser::types::{BaseType, Type};
use engine_error::{Message, MessageCode, MessageCollection, SourceOrigin};
use engine_operation::{run_rules, ChildContexts, Rule, ValidationOutcome};
use engine_schema::{named_type, Schema};
use tokio_util::sync::CancellationToken;

use crate::response::{DataValue, FieldDataItem};

pub type ResultRule = Box<dyn for<'r, 'a> Rule<ResultValidationContext<'r, 'a>> + Send + Sync>;

#[derive(Clone, Copy)]
enum ResultNode<'r, 'a> {
    Root(&'r [FieldDataItem<'a>]),
    Item(&'r FieldDataItem<'a>),
}

/// One resolved field under validation. The root context stands for the
/// operation's root object and is never checked itself.
#[derive(Clone, Copy)]
pub struct ResultValidationContext<'r, 'a> {
    node: ResultNode<'r, 'a>,
    schema: &'r Schema,
    messages: &'r MessageCollection,
    cancellation: &'r CancellationToken,
}

impl<'r, 'a> ResultValidationContext<'r, 'a> {
    pub fn root(
        items: &'r [FieldDataItem<'a>],
        schema: &'r Schema,
        messages: &'r MessageCollection,
        cancellation: &'r CancellationToken,
    ) -> Self {
        ResultValidationContext {
            node: ResultNode::Root(items),
            schema,
            messages,
            cancellation,
        }
    }

    pub fn item(&self) -> Option<&'r FieldDataItem<'a>> {
        match self.node {
            ResultNode::Root(_) => None,
            ResultNode::Item(item) => Some(item),
        }
    }

    pub fn schema(&self) -> &'r Schema {
        self.schema
    }

    pub fn report(&self, item: &FieldDataItem<'_>, text: String) {
        self.messages.add(
            Message::critical(MessageCode::InvalidResult, text)
                .with_origin(SourceOrigin::at(item.field.origin).with_path(item.path.clone())),
        );
    }

    fn child(&self, item: &'r FieldDataItem<'a>) -> Self {
        ResultValidationContext {
            node: ResultNode::Item(item),
            ..*self
        }
    }
}

impl ChildContexts for ResultValidationContext<'_, '_> {
    fn has_children(&self) -> bool {
        match self.node {
            ResultNode::Root(items) => !items.is_empty(),
            ResultNode::Item(item) => {
                item.is_resolved() && matches!(item.value, DataValue::Object(_) | DataValue::List(_))
            }
        }
    }

    fn child_contexts(&self) -> Vec<Self> {
        let items = match self.node {
            ResultNode::Root(items) => items.iter().collect(),
            ResultNode::Item(item) => item.children(),
        };
        items
            .into_iter()
            .filter(|item| item.is_resolved())
            .map(|item| self.child(item))
            .collect()
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// The result rules, in the order they are applied.
pub fn result_rules() -> Vec<ResultRule> {
    vec![
        Box::new(NonNullFieldHasValue),
        Box::new(ListFieldReturnsList),
        Box::new(ObjectFieldReturnsKnownType),
    ]
}

pub fn validate_result(
    items: &[FieldDataItem<'_>],
    schema: &Schema,
    rules: &[ResultRule],
    messages: &MessageCollection,
    cancellation: &CancellationToken,
) -> ValidationOutcome {
    let _span = tracing::debug_span!("result_validation", rules = rules.len()).entered();
    let before = messages.len();
    let outcome = run_rules(ResultValidationContext::root(items, schema, messages, cancellation), rules);
    tracing::debug!(%outcome, errors = messages.len() - before, "result validated");
    outcome
}

/// Non-null fields and list items hold a value.
pub struct NonNullFieldHasValue;

impl<'r, 'a> Rule<ResultValidationContext<'r, 'a>> for NonNullFieldHasValue {
    fn name(&self) -> &'static str {
        "NonNullFieldHasValue"
    }

    fn apply(&self, ctx: &ResultValidationContext<'r, 'a>) {
        let Some(item) = ctx.item() else {
            return;
        };
        if let Some(ty) = null_for_non_null(&item.field.ty, &item.value) {
            ctx.report(
                item,
                format!(r#"Field "{}" resolved to null for the non-null type "{ty}""#, item.path),
            );
        }
    }
}

fn null_for_non_null<'t>(ty: &'t Type, value: &DataValue<'_>) -> Option<&'t Type> {
    match (value, &ty.base) {
        (DataValue::Null, _) => (!ty.nullable).then_some(ty),
        (DataValue::List(items), BaseType::List(item_type)) => {
            items.iter().find_map(|item| null_for_non_null(item_type, item))
        }
        _ => None,
    }
}

/// List fields return lists and other fields do not.
pub struct ListFieldReturnsList;

impl<'r, 'a> Rule<ResultValidationContext<'r, 'a>> for ListFieldReturnsList {
    fn name(&self) -> &'static str {
        "ListFieldReturnsList"
    }

    fn apply(&self, ctx: &ResultValidationContext<'r, 'a>) {
        let Some(item) = ctx.item() else {
            return;
        };
        let problem = match list_mismatch(&item.field.ty, &item.value) {
            Some(ListMismatch::ExpectedList(ty)) => format!(r#"did not return a list for the type "{ty}""#),
            Some(ListMismatch::UnexpectedList(ty)) => format!(r#"returned a list for the type "{ty}""#),
            None => return,
        };
        ctx.report(item, format!(r#"Field "{}" {problem}"#, item.path));
    }
}

enum ListMismatch<'t> {
    ExpectedList(&'t Type),
    UnexpectedList(&'t Type),
}

fn list_mismatch<'t>(ty: &'t Type, value: &DataValue<'_>) -> Option<ListMismatch<'t>> {
    match (&ty.base, value) {
        (_, DataValue::Null) => None,
        (BaseType::List(item_type), DataValue::List(items)) => {
            items.iter().find_map(|item| list_mismatch(item_type, item))
        }
        (BaseType::List(_), _) => Some(ListMismatch::ExpectedList(ty)),
        (BaseType::Named(_), DataValue::List(_)) => Some(ListMismatch::UnexpectedList(ty)),
        (BaseType::Named(_), _) => None,
    }
}

/// Object values belong to an object type of the schema that is a possible
/// type of the field, and only composite fields hold objects.
pub struct ObjectFieldReturnsKnownType;

impl<'r, 'a> Rule<ResultValidationContext<'r, 'a>> for ObjectFieldReturnsKnownType {
    fn name(&self) -> &'static str {
        "ObjectFieldReturnsKnownType"
    }

    fn apply(&self, ctx: &ResultValidationContext<'r, 'a>) {
        let Some(item) = ctx.item() else {
            return;
        };
        if let Some(problem) = unexpected_value(ctx.schema(), named_type(&item.field.ty), &item.value) {
            ctx.report(item, format!(r#"Field "{}" returned {problem}"#, item.path));
        }
    }
}

fn unexpected_value(schema: &Schema, expected: &str, value: &DataValue<'_>) -> Option<String> {
    let composite = schema.get_type(expected).is_some_and(|def| def.is_composite());
    match value {
        DataValue::Null => None,
        DataValue::List(items) => items.iter().find_map(|item| unexpected_value(schema, expected, item)),
        DataValue::Leaf(_) if composite => Some(format!(r#"a scalar value where "{expected}" was expected"#)),
        DataValue::Leaf(_) => None,
        DataValue::Object(object) if !composite => Some(format!(
            r#"an instance of {} where the leaf type "{expected}" was expected"#,
            object.host_type
        )),
        DataValue::Object(object) => match object.object {
            None => Some(format!(
                "an instance of {} which has no type in the schema",
                object.host_type
            )),
            Some(def) if !schema.is_possible_type(expected, &def.name) => Some(format!(
                r#"an object of type "{}" which is not a possible type of "{expected}""#,
                def.name
            )),
            Some(_) => None,
        },
    }
}
