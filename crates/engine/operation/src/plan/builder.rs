use async_graphql_parser::types::{OperationType, Type};
use async_graphql_value::Name;
use engine_schema::Schema;

use super::{
    ArgumentValue, DirectiveInvocation, FieldInvocationContext, FieldInvocationPlan, PlanCacheKey, TypeRestriction,
    VariableDefinition,
};
use crate::{Document, PartId, PartKind};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("The document has errors and cannot be planned")]
    InvalidDocument,
    #[error("The document does not contain any operation")]
    NoOperation,
    #[error("An operation name is required when the document contains several operations")]
    OperationNameRequired,
    #[error(r#"Unknown operation named "{0}""#)]
    UnknownOperation(String),
    #[error("Schema is not configured for {0} operations")]
    MissingRootType(OperationType),
    #[error(r#"Unknown field "{field}" on type "{ty}""#)]
    UnknownField { ty: String, field: String },
    #[error(r#"Unknown fragment "{0}""#)]
    UnknownFragment(String),
    #[error(r#"Fragment "{0}" spreads itself"#)]
    FragmentCycle(String),
}

struct PlanBuilder<'a> {
    document: &'a Document,
    schema: &'a Schema,
    fragment_path: Vec<&'a str>,
    cacheable: bool,
}

/// Where the selections being collected end up.
struct Scope<'s> {
    /// Output type of the field owning the selection set.
    static_type: &'s str,
    /// Type the selections are made on, narrowed by fragment type conditions.
    selected_on: &'s str,
    restrict: Option<TypeRestriction>,
    directives: Vec<DirectiveInvocation>,
}

impl FieldInvocationPlan {
    /// Builds the plan of operation `operation_name` in a validated document.
    pub fn build(
        document: &Document,
        schema: &Schema,
        operation_name: Option<&str>,
        key: PlanCacheKey,
    ) -> Result<FieldInvocationPlan, PlanError> {
        if !document.is_valid() {
            return Err(PlanError::InvalidDocument);
        }
        let operation = match operation_name {
            Some(name) => document
                .operation(Some(name))
                .ok_or_else(|| PlanError::UnknownOperation(name.to_string()))?,
            None => document.operation(None).ok_or(if document.operations().is_empty() {
                PlanError::NoOperation
            } else {
                PlanError::OperationNameRequired
            })?,
        };
        let PartKind::Operation { ty, name } = &document[operation].kind else {
            return Err(PlanError::NoOperation);
        };
        let root_type = schema.root_type(*ty).ok_or(PlanError::MissingRootType(*ty))?;

        let variables = document
            .children(operation)
            .filter_map(|(_, part)| match &part.kind {
                PartKind::Variable {
                    name,
                    ty,
                    default_value,
                } => Some(VariableDefinition {
                    name: name.clone(),
                    ty: ty.clone(),
                    default_value: default_value.clone(),
                    origin: part.origin,
                }),
                _ => None,
            })
            .collect();

        let mut builder = PlanBuilder {
            document,
            schema,
            fragment_path: Vec::new(),
            cacheable: true,
        };
        let directives = builder.directives(operation);
        let mut root = Vec::new();
        builder.collect(
            operation,
            Scope {
                static_type: &root_type.name,
                selected_on: &root_type.name,
                restrict: None,
                directives: Vec::new(),
            },
            &mut root,
        )?;

        let plan = FieldInvocationPlan {
            id: ulid::Ulid::new(),
            key,
            operation_type: *ty,
            operation_name: name.as_ref().map(ToString::to_string),
            root_type: root_type.name.clone(),
            variables,
            directives,
            root,
            cacheable: builder.cacheable,
        };
        tracing::debug!(
            plan_id = %plan.id,
            fields = plan.field_count(),
            cacheable = plan.cacheable,
            "field invocation plan built"
        );
        Ok(plan)
    }
}

impl<'a> PlanBuilder<'a> {
    fn directives(&mut self, id: PartId) -> Vec<DirectiveInvocation> {
        let directives = self
            .document
            .directives(id)
            .filter_map(|(directive, part)| match &part.kind {
                PartKind::Directive { name } => Some(DirectiveInvocation {
                    name: name.clone(),
                    arguments: self
                        .document
                        .arguments(directive)
                        .map(|(name, value)| (name.clone(), ArgumentValue::from(value.clone())))
                        .collect(),
                    origin: part.origin,
                }),
                _ => None,
            })
            .collect::<Vec<_>>();
        if !directives.is_empty() {
            self.cacheable = false;
        }
        directives
    }

    /// Narrows the current restriction to objects of type `condition`. `None`
    /// when every possible type of `static_type` still applies.
    fn narrow(&self, static_type: &str, current: Option<&TypeRestriction>, condition: &str) -> Option<TypeRestriction> {
        let static_types = self.schema.possible_types(static_type);
        let narrowed = TypeRestriction::new(
            static_types
                .iter()
                .copied()
                .filter(|object| self.schema.is_possible_type(condition, object)),
        );
        let narrowed = match current {
            Some(current) => current.intersect(&narrowed),
            None => narrowed,
        };
        (narrowed.len() != static_types.len()).then_some(narrowed)
    }

    fn collect(&mut self, id: PartId, scope: Scope<'_>, out: &mut Vec<FieldInvocationContext>) -> Result<(), PlanError> {
        let document = self.document;
        for (selection, part) in document.selections(id) {
            let mut directives = scope.directives.clone();
            directives.extend(self.directives(selection));

            match &part.kind {
                PartKind::Field { alias, name } => {
                    let field = self.field(selection, alias.as_ref(), name, &scope, directives)?;
                    merge(out, field);
                }
                PartKind::FragmentSpread { fragment_name } => {
                    let fragment = document
                        .fragment(fragment_name)
                        .ok_or_else(|| PlanError::UnknownFragment(fragment_name.to_string()))?;
                    if self.fragment_path.contains(&fragment_name.as_str()) {
                        return Err(PlanError::FragmentCycle(fragment_name.to_string()));
                    }
                    let PartKind::FragmentDefinition { type_condition, .. } = &document[fragment].kind else {
                        return Err(PlanError::UnknownFragment(fragment_name.to_string()));
                    };
                    let restrict = self.narrow(scope.static_type, scope.restrict.as_ref(), type_condition);
                    let mut directives = directives;
                    directives.extend(self.directives(fragment));
                    self.fragment_path.push(fragment_name.as_str());
                    let result = self.collect(
                        fragment,
                        Scope {
                            static_type: scope.static_type,
                            selected_on: type_condition,
                            restrict,
                            directives,
                        },
                        out,
                    );
                    self.fragment_path.pop();
                    result?;
                }
                PartKind::InlineFragment { type_condition } => {
                    let (selected_on, restrict) = match type_condition {
                        Some(condition) => (
                            condition.as_str(),
                            self.narrow(scope.static_type, scope.restrict.as_ref(), condition),
                        ),
                        None => (scope.selected_on, scope.restrict.clone()),
                    };
                    self.collect(
                        selection,
                        Scope {
                            static_type: scope.static_type,
                            selected_on,
                            restrict,
                            directives,
                        },
                        out,
                    )?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn field(
        &mut self,
        id: PartId,
        alias: Option<&Name>,
        name: &Name,
        scope: &Scope<'_>,
        directives: Vec<DirectiveInvocation>,
    ) -> Result<FieldInvocationContext, PlanError> {
        let (document, schema) = (self.document, self.schema);
        let arguments = document
            .arguments(id)
            .map(|(name, value)| (name.clone(), ArgumentValue::from(value.clone())))
            .collect();

        let (ty, children) = if name.as_str() == "__typename" {
            (typename_type(), Vec::new())
        } else {
            let definition = schema
                .field(scope.selected_on, name)
                .ok_or_else(|| PlanError::UnknownField {
                    ty: scope.selected_on.to_string(),
                    field: name.to_string(),
                })?;
            let mut children = Vec::new();
            let output = definition.named_type();
            if schema.get_type(output).is_some_and(|def| def.is_composite()) {
                self.collect(
                    id,
                    Scope {
                        static_type: output,
                        selected_on: output,
                        restrict: None,
                        directives: Vec::new(),
                    },
                    &mut children,
                )?;
            }
            (definition.ty.clone(), children)
        };

        let mut field = FieldInvocationContext {
            response_key: alias.unwrap_or(name).clone(),
            field_name: name.clone(),
            parent_type: scope.selected_on.to_string(),
            ty,
            arguments,
            directives,
            restrict: None,
            origin: document[id].origin,
            children,
        };
        if let Some(restriction) = &scope.restrict {
            field.restrict(restriction.types());
        }
        Ok(field)
    }
}

fn typename_type() -> Type {
    Type {
        base: async_graphql_parser::types::BaseType::Named(Name::new("String")),
        nullable: false,
    }
}

/// Adds `field` to `out`, merging it into an earlier selection of the same
/// response key applying under the same conditions.
fn merge(out: &mut Vec<FieldInvocationContext>, field: FieldInvocationContext) {
    let existing = out.iter_mut().find(|existing| {
        existing.response_key == field.response_key
            && existing.field_name == field.field_name
            && existing.restrict == field.restrict
            && existing.directives == field.directives
            && existing.arguments == field.arguments
    });
    match existing {
        Some(existing) => {
            for child in field.children {
                merge(&mut existing.children, child);
            }
        }
        None => out.push(field),
    }
}
