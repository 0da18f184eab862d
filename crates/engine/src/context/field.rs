use engine_error::{ResponsePath, SourceOrigin};
use engine_invocation::Arguments;
use engine_operation::FieldInvocationContext;
use engine_schema::{FieldDefinition, ObjectDefinition};

use super::{ContextBase, ExecutionContext, QueryExecutionContext};

/// Resolution of one planned field on one source object.
pub struct FieldExecutionContext<'a> {
    base: ContextBase,
    query: &'a QueryExecutionContext,
    field: &'a FieldInvocationContext,
    object: &'a ObjectDefinition,
    definition: &'a FieldDefinition,
    path: ResponsePath,
    arguments: Arguments,
}

impl<'a> FieldExecutionContext<'a> {
    /// Binds the field's arguments against the request variables. Arguments
    /// left out fall back to their schema default.
    pub fn new(
        base: ContextBase,
        query: &'a QueryExecutionContext,
        field: &'a FieldInvocationContext,
        object: &'a ObjectDefinition,
        definition: &'a FieldDefinition,
        path: ResponsePath,
    ) -> Self {
        let mut arguments = field.resolve_arguments(query.variables());
        for (name, argument) in &definition.arguments {
            if let Some(default) = &argument.default_value {
                if !arguments.keys().any(|key| key.as_str() == name) {
                    arguments.insert(async_graphql_value::Name::new(name), default.clone());
                }
            }
        }
        FieldExecutionContext {
            base,
            query,
            field,
            object,
            definition,
            path,
            arguments,
        }
    }

    pub fn query(&self) -> &'a QueryExecutionContext {
        self.query
    }

    pub fn field(&self) -> &'a FieldInvocationContext {
        self.field
    }

    /// Concrete object type of the source value.
    pub fn object(&self) -> &'a ObjectDefinition {
        self.object
    }

    pub fn definition(&self) -> &'a FieldDefinition {
        self.definition
    }

    pub fn path(&self) -> &ResponsePath {
        &self.path
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// `Type.field`, as used in diagnostics and security challenges.
    pub fn coordinate(&self) -> String {
        format!("{}.{}", self.object.name, self.definition.name)
    }

    pub fn origin(&self) -> SourceOrigin {
        SourceOrigin::at(self.field.origin).with_path(self.path.clone())
    }
}

impl ExecutionContext for FieldExecutionContext<'_> {
    fn base(&self) -> &ContextBase {
        &self.base
    }
}
