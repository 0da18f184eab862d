use std::{any::TypeId, collections::HashMap, fmt::Write, ops::Deref, sync::Arc};

use async_graphql_parser::types::OperationType;
use engine_invocation::InvocationCache;
use indexmap::IndexMap;

use crate::{DirectiveDefinition, FieldDefinition, InputValueDefinition, ObjectDefinition, TypeDefinition};

/// Unique identity of a built schema, part of every plan cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaId(ulid::Ulid);

impl SchemaId {
    pub(crate) fn generate() -> Self {
        SchemaId(ulid::Ulid::new())
    }
}

impl std::fmt::Display for SchemaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[doc(hidden)]
pub struct SchemaInner {
    pub(crate) id: SchemaId,
    pub(crate) types: IndexMap<String, TypeDefinition>,
    pub(crate) directives: IndexMap<String, DirectiveDefinition>,
    pub(crate) query_type: String,
    pub(crate) mutation_type: Option<String>,
    pub(crate) subscription_type: Option<String>,
    pub(crate) host_types: HashMap<TypeId, String>,
    pub(crate) invocation: InvocationCache,
    pub(crate) isolation_gate: tokio::sync::Mutex<()>,
}

/// The schema a request is validated and executed against.
///
/// Cloning a schema is cheap, so it can be easily shared.
#[derive(Clone)]
pub struct Schema(pub(crate) Arc<SchemaInner>);

impl Deref for Schema {
    type Target = SchemaInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("id", &self.id)
            .field("query_type", &self.query_type)
            .field("types", &self.types.len())
            .finish_non_exhaustive()
    }
}

impl SchemaInner {
    pub fn id(&self) -> SchemaId {
        self.id
    }

    pub fn query_type(&self) -> Option<&ObjectDefinition> {
        self.object(&self.query_type)
    }

    pub fn mutation_type(&self) -> Option<&ObjectDefinition> {
        self.mutation_type.as_deref().and_then(|name| self.object(name))
    }

    pub fn subscription_type(&self) -> Option<&ObjectDefinition> {
        self.subscription_type.as_deref().and_then(|name| self.object(name))
    }

    pub fn root_type(&self, operation: OperationType) -> Option<&ObjectDefinition> {
        match operation {
            OperationType::Query => self.query_type(),
            OperationType::Mutation => self.mutation_type(),
            OperationType::Subscription => self.subscription_type(),
        }
    }

    pub fn get_type(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> + '_ {
        self.types.values()
    }

    pub fn object(&self, name: &str) -> Option<&ObjectDefinition> {
        self.get_type(name).and_then(TypeDefinition::as_object)
    }

    /// Field `name` on the type called `ty`, for objects and interfaces.
    pub fn field(&self, ty: &str, name: &str) -> Option<&FieldDefinition> {
        self.get_type(ty).and_then(|def| def.field(name))
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    pub fn directives(&self) -> impl Iterator<Item = &DirectiveDefinition> + '_ {
        self.directives.values()
    }

    /// Object type whose values are instances of the Rust type `type_id`.
    pub fn object_for_host(&self, type_id: TypeId) -> Option<&ObjectDefinition> {
        self.host_types.get(&type_id).and_then(|name| self.object(name))
    }

    /// Concrete object types a value of type `name` can have.
    pub fn possible_types<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        match self.get_type(name) {
            Some(TypeDefinition::Object(def)) => vec![def.name.as_str()],
            Some(TypeDefinition::Interface(def)) => def.possible_types.iter().map(String::as_str).collect(),
            Some(TypeDefinition::Union(def)) => def.members.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether an object of type `object` is a valid value of type `ty`.
    pub fn is_possible_type(&self, ty: &str, object: &str) -> bool {
        ty == object
            || match self.get_type(ty) {
                Some(TypeDefinition::Interface(def)) => def.possible_types.contains(object),
                Some(TypeDefinition::Union(def)) => def.members.contains(object),
                _ => false,
            }
    }

    /// Whether some object can be both a `a` and a `b`.
    pub fn types_overlap(&self, a: &str, b: &str) -> bool {
        let b_types = self.possible_types(b);
        self.possible_types(a).iter().any(|ty| b_types.contains(ty))
    }

    pub fn invocation(&self) -> &InvocationCache {
        &self.invocation
    }

    /// Gate serializing every isolated resolver of this schema.
    pub fn isolation_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.isolation_gate
    }

    /// Schema definition language rendering, built-in scalars and directives excluded.
    pub fn sdl(&self) -> String {
        let mut sdl = String::new();
        for def in self.types.values() {
            if crate::builder::BUILTIN_SCALARS.contains(&def.name()) {
                continue;
            }
            write_type(&mut sdl, def);
            sdl.push('\n');
        }
        for directive in self.directives.values() {
            if crate::builder::BUILTIN_DIRECTIVES.contains(&directive.name.as_str()) {
                continue;
            }
            let locations = directive.locations.iter().map(ToString::to_string).collect::<Vec<_>>();
            let _ = writeln!(
                sdl,
                "directive @{}{}{} on {}\n",
                directive.name,
                arguments_sdl(&directive.arguments),
                if directive.is_repeatable { " repeatable" } else { "" },
                locations.join(" | ")
            );
        }
        sdl.trim_end().to_string()
    }
}

fn arguments_sdl(arguments: &IndexMap<String, InputValueDefinition>) -> String {
    if arguments.is_empty() {
        return String::new();
    }
    let arguments = arguments.values().map(input_value_sdl).collect::<Vec<_>>();
    format!("({})", arguments.join(", "))
}

fn input_value_sdl(value: &InputValueDefinition) -> String {
    match &value.default_value {
        Some(default) => format!("{}: {} = {default}", value.name, value.ty),
        None => format!("{}: {}", value.name, value.ty),
    }
}

fn write_fields<'a>(sdl: &mut String, fields: impl Iterator<Item = &'a FieldDefinition>) {
    sdl.push_str(" {\n");
    for field in fields {
        let _ = write!(sdl, "  {}{}: {}", field.name, arguments_sdl(&field.arguments), field.ty);
        if let Some(reason) = &field.deprecation {
            let _ = write!(sdl, " @deprecated(reason: {reason:?})");
        }
        sdl.push('\n');
    }
    sdl.push_str("}\n");
}

fn write_type(sdl: &mut String, def: &TypeDefinition) {
    match def {
        TypeDefinition::Object(object) => {
            let _ = write!(sdl, "type {}", object.name);
            if !object.interfaces.is_empty() {
                let interfaces = object.interfaces.iter().map(String::as_str).collect::<Vec<_>>();
                let _ = write!(sdl, " implements {}", interfaces.join(" & "));
            }
            write_fields(sdl, object.fields.values());
        }
        TypeDefinition::Interface(interface) => {
            let _ = write!(sdl, "interface {}", interface.name);
            write_fields(sdl, interface.fields.values());
        }
        TypeDefinition::Union(union) => {
            let members = union.members.iter().map(String::as_str).collect::<Vec<_>>();
            let _ = writeln!(sdl, "union {} = {}", union.name, members.join(" | "));
        }
        TypeDefinition::Scalar(scalar) => {
            let _ = writeln!(sdl, "scalar {}", scalar.name);
        }
        TypeDefinition::Enum(enumeration) => {
            let _ = writeln!(sdl, "enum {} {{", enumeration.name);
            for value in &enumeration.values {
                let _ = writeln!(sdl, "  {value}");
            }
            sdl.push_str("}\n");
        }
        TypeDefinition::InputObject(input) => {
            let _ = writeln!(sdl, "input {} {{", input.name);
            for field in input.fields.values() {
                let _ = writeln!(sdl, "  {}", input_value_sdl(field));
            }
            sdl.push_str("}\n");
        }
    }
}
