use std::any::TypeId;

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::ConstValue;
use indexmap::{IndexMap, IndexSet};

use crate::{FieldOrigin, SecurityPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Object,
    Interface,
    Union,
    Scalar,
    Enum,
    InputObject,
}

/// Locations in an executable document where a directive may appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
}

#[derive(Debug)]
pub enum TypeDefinition {
    Object(ObjectDefinition),
    Interface(InterfaceDefinition),
    Union(UnionDefinition),
    Scalar(ScalarDefinition),
    Enum(EnumDefinition),
    InputObject(InputObjectDefinition),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Object(def) => &def.name,
            TypeDefinition::Interface(def) => &def.name,
            TypeDefinition::Union(def) => &def.name,
            TypeDefinition::Scalar(def) => &def.name,
            TypeDefinition::Enum(def) => &def.name,
            TypeDefinition::InputObject(def) => &def.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDefinition::Object(_) => TypeKind::Object,
            TypeDefinition::Interface(_) => TypeKind::Interface,
            TypeDefinition::Union(_) => TypeKind::Union,
            TypeDefinition::Scalar(_) => TypeKind::Scalar,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::InputObject(_) => TypeKind::InputObject,
        }
    }

    /// Object, interface or union: a type that takes a selection set.
    pub fn is_composite(&self) -> bool {
        matches!(self.kind(), TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind(), TypeKind::Interface | TypeKind::Union)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind(), TypeKind::Scalar | TypeKind::Enum)
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind(), TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject)
    }

    pub fn is_output(&self) -> bool {
        self.kind() != TypeKind::InputObject
    }

    /// Field lookup on objects and interfaces. `__typename` is handled by callers.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        match self {
            TypeDefinition::Object(def) => def.fields.get(name),
            TypeDefinition::Interface(def) => def.fields.get(name),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectDefinition> {
        match self {
            TypeDefinition::Object(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDefinition> {
        match self {
            TypeDefinition::Enum(def) => Some(def),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObjectDefinition> {
        match self {
            TypeDefinition::InputObject(def) => Some(def),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct ObjectDefinition {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: IndexSet<String>,
    /// Rust type whose values are instances of this object.
    pub host_type: Option<TypeId>,
}

#[derive(Debug)]
pub struct InterfaceDefinition {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    /// Objects implementing the interface, filled in when the schema is built.
    pub possible_types: IndexSet<String>,
}

#[derive(Debug)]
pub struct UnionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub members: IndexSet<String>,
}

#[derive(Debug)]
pub struct ScalarDefinition {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug)]
pub struct EnumDefinition {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexSet<String>,
}

#[derive(Debug)]
pub struct InputObjectDefinition {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDefinition>,
}

#[derive(Debug)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub arguments: IndexMap<String, InputValueDefinition>,
    /// Member backing the field. Interface fields have none.
    pub origin: Option<FieldOrigin>,
    /// Explicitly marked to run under the schema's isolation gate.
    pub isolated: bool,
    pub security: Option<SecurityPolicy>,
    pub deprecation: Option<String>,
}

impl FieldDefinition {
    pub fn named_type(&self) -> &str {
        named_type(&self.ty)
    }

    pub fn argument(&self, name: &str) -> Option<&InputValueDefinition> {
        self.arguments.get(name)
    }
}

#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
}

impl InputValueDefinition {
    /// Non-null without a default value.
    pub fn is_required(&self) -> bool {
        !self.ty.nullable && self.default_value.is_none()
    }
}

#[derive(Debug)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub is_repeatable: bool,
}

/// Innermost named type of a possibly wrapped type.
pub fn named_type(ty: &Type) -> &str {
    match &ty.base {
        BaseType::Named(name) => name.as_str(),
        BaseType::List(inner) => named_type(inner),
    }
}
