use async_graphql_value::{ConstValue, Name};
use engine_error::{ResponsePath, SourceOrigin};
use engine_operation::DirectiveInvocation;
use engine_schema::DirectiveDefinition;
use indexmap::IndexMap;

use super::{ContextBase, ExecutionContext, FieldExecutionContext, QueryExecutionContext};

/// One directive about to be applied, either to a field or to the whole
/// operation.
pub struct DirectiveExecutionContext<'a> {
    base: ContextBase,
    query: &'a QueryExecutionContext,
    field: Option<&'a FieldExecutionContext<'a>>,
    directive: &'a DirectiveInvocation,
    definition: Option<&'a DirectiveDefinition>,
    arguments: IndexMap<Name, ConstValue>,
}

impl<'a> DirectiveExecutionContext<'a> {
    pub fn new(field: &'a FieldExecutionContext<'a>, directive: &'a DirectiveInvocation) -> Self {
        Self::build(field.base().derive(), field.query(), Some(field), directive)
    }

    /// Directive of the operation itself, applied before any root field.
    pub fn for_operation(query: &'a QueryExecutionContext, directive: &'a DirectiveInvocation) -> Self {
        Self::build(query.base().derive(), query, None, directive)
    }

    fn build(
        base: ContextBase,
        query: &'a QueryExecutionContext,
        field: Option<&'a FieldExecutionContext<'a>>,
        directive: &'a DirectiveInvocation,
    ) -> Self {
        let definition = query.schema().directive(&directive.name);
        let mut arguments = directive.resolve_arguments(query.variables());
        if let Some(definition) = definition {
            for (name, argument) in &definition.arguments {
                if let Some(default) = &argument.default_value {
                    if !arguments.keys().any(|key| key.as_str() == name) {
                        arguments.insert(Name::new(name), default.clone());
                    }
                }
            }
        }
        DirectiveExecutionContext {
            base,
            query,
            field,
            directive,
            definition,
            arguments,
        }
    }

    pub fn query(&self) -> &'a QueryExecutionContext {
        self.query
    }

    /// The field the directive applies to, `None` for operation directives.
    pub fn field(&self) -> Option<&'a FieldExecutionContext<'a>> {
        self.field
    }

    pub fn name(&self) -> &str {
        &self.directive.name
    }

    pub fn definition(&self) -> Option<&'a DirectiveDefinition> {
        self.definition
    }

    pub fn argument(&self, name: &str) -> Option<&ConstValue> {
        self.arguments
            .iter()
            .find_map(|(key, value)| (key.as_str() == name).then_some(value))
    }

    pub fn arguments(&self) -> &IndexMap<Name, ConstValue> {
        &self.arguments
    }

    pub fn origin(&self) -> SourceOrigin {
        let path = self.field.map_or_else(ResponsePath::root, |field| field.path().clone());
        SourceOrigin::at(self.directive.origin).with_path(path)
    }
}

impl ExecutionContext for DirectiveExecutionContext<'_> {
    fn base(&self) -> &ContextBase {
        &self.base
    }
}
