//! The executable form of an operation: one invocation context per selected
//! field, fragments expanded.

mod builder;

use std::convert::Infallible;

use async_graphql_parser::types::{OperationType, Type};
use async_graphql_value::{ConstValue, Name, Value};
use engine_error::Location;
use engine_schema::{FieldDefinition, SchemaId, SchemaInner};
use indexmap::{IndexMap, IndexSet};

pub use builder::PlanError;

/// Coerced variable values of a request.
pub type Variables = IndexMap<Name, ConstValue>;

/// Identity of a plan in a plan cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlanCacheKey {
    pub schema_id: SchemaId,
    pub operation_name: Option<String>,
    pub query_hash: blake3::Hash,
}

impl PlanCacheKey {
    pub fn new(schema_id: SchemaId, operation_name: Option<&str>, query: &str) -> Self {
        PlanCacheKey {
            schema_id,
            operation_name: operation_name.map(str::to_string),
            query_hash: blake3::hash(query.as_bytes()),
        }
    }
}

impl std::fmt::Display for PlanCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.schema_id,
            self.operation_name.as_deref().unwrap_or("-"),
            self.query_hash.to_hex()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Literal(ConstValue),
    Variable(Name),
    /// A list or object with variables somewhere inside.
    Template(Value),
}

impl From<Value> for ArgumentValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Variable(name) => ArgumentValue::Variable(name),
            value => match value.clone().into_const() {
                Some(literal) => ArgumentValue::Literal(literal),
                None => ArgumentValue::Template(value),
            },
        }
    }
}

impl ArgumentValue {
    /// Value for the given variables. `None` when the argument is a variable
    /// that was not provided, so that the default applies.
    pub fn resolve(&self, variables: &Variables) -> Option<ConstValue> {
        match self {
            ArgumentValue::Literal(value) => Some(value.clone()),
            ArgumentValue::Variable(name) => variables.get(name).cloned(),
            ArgumentValue::Template(value) => {
                let resolved = value.clone().into_const_with(|name| {
                    Ok::<_, Infallible>(variables.get(&name).cloned().unwrap_or(ConstValue::Null))
                });
                match resolved {
                    Ok(value) => Some(value),
                    Err(never) => match never {},
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveInvocation {
    pub name: Name,
    pub arguments: IndexMap<Name, ArgumentValue>,
    pub origin: Location,
}

impl DirectiveInvocation {
    pub fn resolve_arguments(&self, variables: &Variables) -> IndexMap<Name, ConstValue> {
        resolve_arguments(&self.arguments, variables)
    }
}

/// Object types a field applies to when it was selected through a fragment
/// narrower than its parent's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRestriction(IndexSet<String>);

impl TypeRestriction {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeRestriction(types.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, object: &str) -> bool {
        self.0.contains(object)
    }

    /// Types allowed by both restrictions, in this restriction's order.
    pub fn intersect(&self, other: &TypeRestriction) -> TypeRestriction {
        TypeRestriction(self.0.iter().filter(|ty| other.0.contains(*ty)).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
    pub origin: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInvocationContext {
    pub response_key: Name,
    pub field_name: Name,
    /// Type the field was selected on, possibly an interface or union.
    pub parent_type: String,
    pub ty: Type,
    pub arguments: IndexMap<Name, ArgumentValue>,
    /// Directives of enclosing fragments first, then the field's own.
    pub directives: Vec<DirectiveInvocation>,
    pub restrict: Option<TypeRestriction>,
    pub origin: Location,
    pub children: Vec<FieldInvocationContext>,
}

impl FieldInvocationContext {
    pub fn is_typename(&self) -> bool {
        self.field_name.as_str() == "__typename"
    }

    /// Limits the field to objects of `types`. A field restricted already only
    /// keeps the types allowed by both restrictions.
    pub fn restrict<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let restriction = TypeRestriction::new(types);
        self.restrict = Some(match self.restrict.take() {
            Some(current) => current.intersect(&restriction),
            None => restriction,
        });
    }

    /// Whether the field applies to an object of type `object`.
    pub fn applies_to(&self, object: &str) -> bool {
        match &self.restrict {
            Some(restrict) => restrict.allows(object),
            None => true,
        }
    }

    /// Field definition on the concrete object type being resolved.
    pub fn definition<'s>(&self, schema: &'s SchemaInner, object: &str) -> Option<&'s FieldDefinition> {
        schema.field(object, &self.field_name)
    }

    pub fn resolve_arguments(&self, variables: &Variables) -> IndexMap<Name, ConstValue> {
        resolve_arguments(&self.arguments, variables)
    }
}

fn resolve_arguments(arguments: &IndexMap<Name, ArgumentValue>, variables: &Variables) -> IndexMap<Name, ConstValue> {
    arguments
        .iter()
        .filter_map(|(name, value)| value.resolve(variables).map(|value| (name.clone(), value)))
        .collect()
}

#[derive(Debug)]
pub struct FieldInvocationPlan {
    id: ulid::Ulid,
    key: PlanCacheKey,
    operation_type: OperationType,
    operation_name: Option<String>,
    root_type: String,
    variables: Vec<VariableDefinition>,
    directives: Vec<DirectiveInvocation>,
    root: Vec<FieldInvocationContext>,
    cacheable: bool,
}

impl FieldInvocationPlan {
    pub fn id(&self) -> ulid::Ulid {
        self.id
    }

    pub fn key(&self) -> &PlanCacheKey {
        &self.key
    }

    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    pub fn variables(&self) -> &[VariableDefinition] {
        &self.variables
    }

    /// Directives attached to the operation itself.
    pub fn directives(&self) -> &[DirectiveInvocation] {
        &self.directives
    }

    pub fn root(&self) -> &[FieldInvocationContext] {
        &self.root
    }

    /// Plans without directives may be reused verbatim by later requests.
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn field_count(&self) -> usize {
        let mut count = 0;
        let mut stack = self.root.iter().collect::<Vec<_>>();
        while let Some(field) = stack.pop() {
            count += 1;
            stack.extend(field.children.iter());
        }
        count
    }
}
