mod fields_on_correct_type;
mod fragments_on_composite_types;
mod known_argument_names;
mod known_directives;
mod known_fragment_names;
mod known_root_type;
mod lone_anonymous_operation;
mod max_depth;
mod no_fragment_cycles;
mod no_undefined_variables;
mod no_unused_fragments;
mod no_unused_variables;
mod provided_required_arguments;
mod scalar_leafs;
mod unique_directives_per_location;
mod unique_operation_names;

pub use fields_on_correct_type::FieldsOnCorrectType;
pub use fragments_on_composite_types::FragmentsOnCompositeTypes;
pub use known_argument_names::KnownArgumentNames;
pub use known_directives::KnownDirectives;
pub use known_fragment_names::KnownFragmentNames;
pub use known_root_type::KnownRootType;
pub use lone_anonymous_operation::LoneAnonymousOperation;
pub use max_depth::MaxDepth;
pub use no_fragment_cycles::NoFragmentCycles;
pub use no_undefined_variables::NoUndefinedVariables;
pub use no_unused_fragments::NoUnusedFragments;
pub use no_unused_variables::NoUnusedVariables;
pub use provided_required_arguments::ProvidedRequiredArguments;
pub use scalar_leafs::ScalarLeafs;
pub use unique_directives_per_location::UniqueDirectivesPerLocation;
pub use unique_operation_names::UniqueOperationNames;

use async_graphql_value::{Name, Value};
use engine_schema::FieldDefinition;

use super::DocumentValidationContext;
use crate::{Document, PartId, PartKind};

/// Schema definition of the field part in focus.
fn field_definition<'a>(ctx: &DocumentValidationContext<'a>) -> Option<&'a FieldDefinition> {
    match &ctx.part()?.kind {
        PartKind::Field { name, .. } => ctx.parent_type()?.field(name),
        _ => None,
    }
}

/// Variables referenced anywhere in `value`.
fn variables_in(value: &Value) -> Vec<&Name> {
    let mut variables = Vec::new();
    let mut stack = vec![value];
    while let Some(value) = stack.pop() {
        match value {
            Value::Variable(name) => variables.push(name),
            Value::List(items) => stack.extend(items.iter()),
            Value::Object(fields) => stack.extend(fields.values()),
            _ => {}
        }
    }
    variables
}

/// Operation or fragment definition `id` belongs to.
fn definition_of(document: &Document, mut id: PartId) -> PartId {
    while let Some(parent) = document.get(id).and_then(|part| part.parent) {
        id = parent;
    }
    id
}

/// ` by operation "Foo"` style suffix naming an operation, empty for anonymous ones.
fn describe_operation(document: &Document, operation: PartId, preposition: &str) -> String {
    match document.operation_name(operation) {
        Some(name) => format!(r#" {preposition} operation "{name}""#),
        None => String::new(),
    }
}
