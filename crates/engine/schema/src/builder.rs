use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::{ConstValue, Name};
use engine_invocation::{Constructor, HostRegistry, HostType, InvocationCache, Member, MemberKey, MemberShape};
use indexmap::{IndexMap, IndexSet};

use crate::{
    definition::named_type, DirectiveDefinition, DirectiveLocation, EnumDefinition, FieldDefinition, FieldOrigin,
    InputObjectDefinition, InputValueDefinition, InterfaceDefinition, ObjectDefinition, OriginKind,
    ScalarDefinition, Schema, SchemaError, SchemaId, SchemaInner, SecurityPolicy, TypeDefinition, UnionDefinition,
};

pub(crate) const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];
pub(crate) const BUILTIN_DIRECTIVES: [&str; 2] = ["skip", "include"];

/// An argument of a field or directive.
#[derive(Debug, Clone)]
pub struct Argument {
    name: String,
    ty: String,
    default_value: Option<ConstValue>,
    description: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Argument {
            name: name.into(),
            ty: ty.into(),
            default_value: None,
            description: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A field of an object type, resolved by a member of the host type `T`.
pub struct Field<T> {
    name: String,
    ty: String,
    description: Option<String>,
    arguments: Vec<Argument>,
    member: Member<T>,
    isolated: bool,
    security: Option<SecurityPolicy>,
    deprecation: Option<String>,
}

impl<T: Any + Send + Sync> Field<T> {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, member: Member<T>) -> Self {
        Field {
            name: name.into(),
            ty: ty.into(),
            description: None,
            arguments: Vec::new(),
            member,
            isolated: false,
            security: None,
            deprecation: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Resolve this field under the schema's isolation gate.
    #[must_use]
    pub fn isolated(mut self) -> Self {
        self.isolated = true;
        self
    }

    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.security = Some(SecurityPolicy {
            authenticated: true,
            ..self.security.unwrap_or_default()
        });
        self
    }

    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security = Some(self.security.unwrap_or_default().with_roles(roles));
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(reason.into());
        self
    }
}

/// An object type backed by the Rust type `T`.
pub struct ObjectType<T> {
    name: String,
    description: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<Field<T>>,
    constructors: Vec<Constructor<T>>,
    setters: Vec<(String, Member<T>)>,
}

impl<T: Any + Send + Sync> ObjectType<T> {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            setters: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    #[must_use]
    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Constructors are used to create root instances when no service provides one.
    #[must_use]
    pub fn constructor(mut self, constructor: Constructor<T>) -> Self {
        self.constructors.push(constructor);
        self
    }

    #[must_use]
    pub fn setter(mut self, name: impl Into<String>, setter: Member<T>) -> Self {
        self.setters.push((name.into(), setter));
        self
    }
}

/// A field signature without a resolver, as declared on interfaces.
#[derive(Debug, Clone)]
struct AbstractField {
    name: String,
    ty: String,
    arguments: Vec<Argument>,
}

pub struct InterfaceType {
    name: String,
    description: Option<String>,
    fields: Vec<AbstractField>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn field(self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.field_with_arguments(name, ty, Vec::new())
    }

    #[must_use]
    pub fn field_with_arguments(mut self, name: impl Into<String>, ty: impl Into<String>, arguments: Vec<Argument>) -> Self {
        self.fields.push(AbstractField {
            name: name.into(),
            ty: ty.into(),
            arguments,
        });
        self
    }
}

pub struct UnionType {
    name: String,
    members: Vec<String>,
}

impl UnionType {
    pub fn new(name: impl Into<String>) -> Self {
        UnionType {
            name: name.into(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn member(mut self, member: impl Into<String>) -> Self {
        self.members.push(member.into());
        self
    }
}

pub struct EnumType {
    name: String,
    values: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        EnumType {
            name: name.into(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }
}

pub struct InputObjectType {
    name: String,
    fields: Vec<Argument>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        InputObjectType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: Argument) -> Self {
        self.fields.push(field);
        self
    }
}

pub struct DirectiveType {
    name: String,
    description: Option<String>,
    locations: Vec<DirectiveLocation>,
    arguments: Vec<Argument>,
    is_repeatable: bool,
}

impl DirectiveType {
    pub fn new(name: impl Into<String>) -> Self {
        DirectiveType {
            name: name.into(),
            description: None,
            locations: Vec::new(),
            arguments: Vec::new(),
            is_repeatable: false,
        }
    }

    #[must_use]
    pub fn location(mut self, location: DirectiveLocation) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.is_repeatable = true;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub struct SchemaBuilder {
    query_type: String,
    mutation_type: Option<String>,
    types: Vec<TypeDefinition>,
    directives: Vec<DirectiveDefinition>,
    registry: HostRegistry,
    host_types: HashMap<TypeId, String>,
    errors: Vec<SchemaError>,
}

impl Schema {
    /// Starts a schema whose query root is backed by `Q`.
    pub fn build<Q: Any + Send + Sync>(query: ObjectType<Q>) -> SchemaBuilder {
        let mut builder = SchemaBuilder {
            query_type: query.name.clone(),
            mutation_type: None,
            types: Vec::new(),
            directives: Vec::new(),
            registry: HostRegistry::new(),
            host_types: HashMap::new(),
            errors: Vec::new(),
        };
        builder.add_object(query, true);
        builder
    }
}

fn parse_type(location: &str, ty: &str) -> Result<Type, SchemaError> {
    Type::new(ty).ok_or_else(|| SchemaError::InvalidTypeReference {
        location: location.to_string(),
        ty: ty.to_string(),
    })
}

impl SchemaBuilder {
    #[must_use]
    pub fn mutation<M: Any + Send + Sync>(mut self, mutation: ObjectType<M>) -> Self {
        self.mutation_type = Some(mutation.name.clone());
        self.add_object(mutation, true);
        self
    }

    #[must_use]
    pub fn object<T: Any + Send + Sync>(mut self, object: ObjectType<T>) -> Self {
        self.add_object(object, false);
        self
    }

    #[must_use]
    pub fn interface(mut self, interface: InterfaceType) -> Self {
        let mut fields = IndexMap::new();
        for field in interface.fields {
            let location = format!("{}.{}", interface.name, field.name);
            let Some(ty) = self.record(parse_type(&location, &field.ty)) else {
                continue;
            };
            let arguments = self.input_values(&location, field.arguments);
            fields.insert(
                field.name.clone(),
                FieldDefinition {
                    name: field.name,
                    description: None,
                    ty,
                    arguments,
                    origin: None,
                    isolated: false,
                    security: None,
                    deprecation: None,
                },
            );
        }
        self.types.push(TypeDefinition::Interface(InterfaceDefinition {
            name: interface.name,
            description: interface.description,
            fields,
            possible_types: IndexSet::new(),
        }));
        self
    }

    #[must_use]
    pub fn union(mut self, union: UnionType) -> Self {
        self.types.push(TypeDefinition::Union(UnionDefinition {
            name: union.name,
            description: None,
            members: union.members.into_iter().collect(),
        }));
        self
    }

    #[must_use]
    pub fn enumeration(mut self, enumeration: EnumType) -> Self {
        self.types.push(TypeDefinition::Enum(EnumDefinition {
            name: enumeration.name,
            description: None,
            values: enumeration.values.into_iter().collect(),
        }));
        self
    }

    #[must_use]
    pub fn scalar(mut self, name: impl Into<String>) -> Self {
        self.types.push(TypeDefinition::Scalar(ScalarDefinition {
            name: name.into(),
            description: None,
        }));
        self
    }

    #[must_use]
    pub fn input_object(mut self, input: InputObjectType) -> Self {
        let fields = self.input_values(&input.name, input.fields);
        self.types.push(TypeDefinition::InputObject(InputObjectDefinition {
            name: input.name,
            description: None,
            fields,
        }));
        self
    }

    #[must_use]
    pub fn directive(mut self, directive: DirectiveType) -> Self {
        let location = format!("@{}", directive.name);
        let arguments = self.input_values(&location, directive.arguments);
        self.directives.push(DirectiveDefinition {
            name: directive.name,
            description: directive.description,
            locations: directive.locations,
            arguments,
            is_repeatable: directive.is_repeatable,
        });
        self
    }

    fn record<V>(&mut self, result: Result<V, SchemaError>) -> Option<V> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    fn input_values(&mut self, location: &str, arguments: Vec<Argument>) -> IndexMap<String, InputValueDefinition> {
        let mut values = IndexMap::new();
        for argument in arguments {
            let location = format!("{location}({}:)", argument.name);
            let Some(ty) = self.record(parse_type(&location, &argument.ty)) else {
                continue;
            };
            values.insert(
                argument.name.clone(),
                InputValueDefinition {
                    name: argument.name,
                    description: argument.description,
                    ty,
                    default_value: argument.default_value,
                },
            );
        }
        values
    }

    fn add_object<T: Any + Send + Sync>(&mut self, object: ObjectType<T>, root: bool) {
        let type_id = TypeId::of::<T>();
        let host_name = std::any::type_name::<T>();
        if let Some(first) = self.host_types.insert(type_id, object.name.clone()) {
            self.errors.push(SchemaError::DuplicateHostType {
                host: host_name,
                first,
                second: object.name.clone(),
            });
        }

        let mut host = HostType::builder::<T>();
        let mut fields = IndexMap::new();
        for field in object.fields {
            let location = format!("{}.{}", object.name, field.name);
            if fields.contains_key(&field.name) {
                self.errors.push(SchemaError::DuplicateField {
                    ty: object.name.clone(),
                    field: field.name.clone(),
                });
                continue;
            }
            let kind = match field.member.shape() {
                MemberShape::Property => OriginKind::Property,
                MemberShape::Method { params, .. } => {
                    for param in params {
                        if !field.arguments.iter().any(|argument| argument.name == param.name) {
                            self.errors.push(SchemaError::UnboundParameter {
                                location: location.clone(),
                                param: param.name.to_string(),
                            });
                        }
                    }
                    if root {
                        OriginKind::Action
                    } else {
                        OriginKind::Method
                    }
                }
                MemberShape::Setter => {
                    self.errors.push(SchemaError::InvalidResolver { location });
                    continue;
                }
            };
            let Some(ty) = self.record(parse_type(&location, &field.ty)) else {
                continue;
            };
            let arguments = self.input_values(&location, field.arguments);
            let origin = FieldOrigin {
                kind,
                member: MemberKey::new(type_id, field.name.as_str()),
                owner_name: host_name,
            };
            host = host.member(field.name.as_str(), field.member);
            fields.insert(
                field.name.clone(),
                FieldDefinition {
                    name: field.name,
                    description: field.description,
                    ty,
                    arguments,
                    origin: Some(origin),
                    isolated: field.isolated,
                    security: field.security,
                    deprecation: field.deprecation,
                },
            );
        }
        for constructor in object.constructors {
            host = host.constructor(constructor);
        }
        for (name, setter) in object.setters {
            host = host.member(name, setter);
        }
        self.registry.register(host.build());

        self.types.push(TypeDefinition::Object(ObjectDefinition {
            name: object.name,
            description: object.description,
            fields,
            interfaces: object.interfaces.into_iter().collect(),
            host_type: Some(type_id),
        }));
    }

    pub fn finish(self) -> Result<Schema, SchemaError> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let mut types = IndexMap::new();
        for name in BUILTIN_SCALARS {
            types.insert(
                name.to_string(),
                TypeDefinition::Scalar(ScalarDefinition {
                    name: name.to_string(),
                    description: None,
                }),
            );
        }
        for def in self.types {
            let name = def.name().to_string();
            if types.contains_key(&name) {
                return Err(SchemaError::DuplicateType(name));
            }
            types.insert(name, def);
        }

        let mut directives = builtin_directives();
        for directive in self.directives {
            directives.insert(directive.name.clone(), directive);
        }

        link_interfaces(&mut types)?;
        check_unions(&types)?;
        check_references(&types, &directives)?;

        for (operation, name) in [("query", Some(&self.query_type)), ("mutation", self.mutation_type.as_ref())] {
            let Some(name) = name else { continue };
            if !matches!(types.get(name), Some(TypeDefinition::Object(_))) {
                return Err(SchemaError::InvalidRootType {
                    operation,
                    name: name.clone(),
                });
            }
        }

        let id = SchemaId::generate();
        tracing::debug!(schema_id = %id, types = types.len(), host_types = self.registry.len(), "schema built");

        Ok(Schema(Arc::new(SchemaInner {
            id,
            types,
            directives,
            query_type: self.query_type,
            mutation_type: self.mutation_type,
            subscription_type: None,
            host_types: self.host_types,
            invocation: InvocationCache::new(Arc::new(self.registry)),
            isolation_gate: tokio::sync::Mutex::new(()),
        })))
    }
}

fn builtin_directives() -> IndexMap<String, DirectiveDefinition> {
    let mut directives = IndexMap::new();
    for (name, description) in [
        (
            "include",
            "Directs the executor to include this field or fragment only when the `if` argument is true.",
        ),
        (
            "skip",
            "Directs the executor to skip this field or fragment when the `if` argument is true.",
        ),
    ] {
        let mut arguments = IndexMap::new();
        arguments.insert(
            "if".to_string(),
            InputValueDefinition {
                name: "if".to_string(),
                description: None,
                ty: Type {
                    base: BaseType::Named(Name::new("Boolean")),
                    nullable: false,
                },
                default_value: None,
            },
        );
        directives.insert(
            name.to_string(),
            DirectiveDefinition {
                name: name.to_string(),
                description: Some(description.to_string()),
                locations: vec![
                    DirectiveLocation::Field,
                    DirectiveLocation::FragmentSpread,
                    DirectiveLocation::InlineFragment,
                ],
                arguments,
                is_repeatable: false,
            },
        );
    }
    directives
}

fn link_interfaces(types: &mut IndexMap<String, TypeDefinition>) -> Result<(), SchemaError> {
    let mut implementations: Vec<(String, String)> = Vec::new();
    for def in types.values() {
        let TypeDefinition::Object(object) = def else { continue };
        for interface in &object.interfaces {
            let Some(TypeDefinition::Interface(iface)) = types.get(interface) else {
                return Err(SchemaError::NotAnInterface {
                    object: object.name.clone(),
                    interface: interface.clone(),
                });
            };
            if let Some(missing) = iface.fields.keys().find(|field| !object.fields.contains_key(*field)) {
                return Err(SchemaError::InterfaceNotImplemented {
                    object: object.name.clone(),
                    interface: interface.clone(),
                    field: missing.clone(),
                });
            }
            implementations.push((interface.clone(), object.name.clone()));
        }
    }
    for (interface, object) in implementations {
        if let Some(TypeDefinition::Interface(iface)) = types.get_mut(&interface) {
            iface.possible_types.insert(object);
        }
    }
    Ok(())
}

fn check_unions(types: &IndexMap<String, TypeDefinition>) -> Result<(), SchemaError> {
    for def in types.values() {
        let TypeDefinition::Union(union) = def else { continue };
        for member in &union.members {
            if !matches!(types.get(member), Some(TypeDefinition::Object(_))) {
                return Err(SchemaError::InvalidUnionMember {
                    union: union.name.clone(),
                    member: member.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_references(
    types: &IndexMap<String, TypeDefinition>,
    directives: &IndexMap<String, DirectiveDefinition>,
) -> Result<(), SchemaError> {
    let check_input = |location: String, value: &InputValueDefinition| {
        let name = named_type(&value.ty);
        match types.get(name) {
            None => Err(SchemaError::UnknownType {
                location,
                name: name.to_string(),
            }),
            Some(def) if !def.is_input() => Err(SchemaError::NotAnInputType {
                location,
                name: name.to_string(),
            }),
            Some(_) => Ok(()),
        }
    };

    for def in types.values() {
        let fields = match def {
            TypeDefinition::Object(object) => &object.fields,
            TypeDefinition::Interface(interface) => &interface.fields,
            TypeDefinition::InputObject(input) => {
                for value in input.fields.values() {
                    check_input(format!("{}.{}", input.name, value.name), value)?;
                }
                continue;
            }
            _ => continue,
        };
        for field in fields.values() {
            let location = format!("{}.{}", def.name(), field.name);
            let name = field.named_type();
            match types.get(name) {
                None => {
                    return Err(SchemaError::UnknownType {
                        location,
                        name: name.to_string(),
                    })
                }
                Some(def) if !def.is_output() => {
                    return Err(SchemaError::NotAnOutputType {
                        location,
                        name: name.to_string(),
                    })
                }
                Some(_) => {}
            }
            for argument in field.arguments.values() {
                check_input(format!("{location}({}:)", argument.name), argument)?;
            }
        }
    }

    for directive in directives.values() {
        for argument in directive.arguments.values() {
            check_input(format!("@{}({}:)", directive.name, argument.name), argument)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use engine_invocation::{Member, ResolverError};
    use pretty_assertions::assert_eq;

    use super::*;

    struct Query;

    struct User {
        name: String,
    }

    fn query() -> ObjectType<Query> {
        ObjectType::new("Query").field(Field::new(
            "me",
            "User",
            Member::method0(|_: &Query| {
                Ok(Arc::new(User {
                    name: "ada".to_string(),
                }))
            }),
        ))
    }

    fn user() -> ObjectType<User> {
        ObjectType::new("User")
            .implements("Node")
            .field(Field::new("name", "String!", Member::property(|user: &User| user.name.clone())))
            .field(
                Field::new(
                    "greeting",
                    "String!",
                    Member::method1(["prefix"], |user: &User, prefix: String| {
                        Ok::<_, ResolverError>(format!("{prefix} {}", user.name))
                    }),
                )
                .argument(Argument::new("prefix", "String!"))
                .isolated(),
            )
    }

    #[test]
    fn builds_a_schema() {
        let schema = Schema::build(query())
            .object(user())
            .interface(InterfaceType::new("Node").field("name", "String!"))
            .finish()
            .unwrap();

        let me = schema.field("Query", "me").unwrap();
        assert_eq!(me.origin.as_ref().map(|origin| origin.kind), Some(OriginKind::Action));

        let greeting = schema.field("User", "greeting").unwrap();
        assert!(greeting.isolated);
        assert_eq!(greeting.origin.as_ref().map(|origin| origin.kind), Some(OriginKind::Method));
        assert!(greeting.argument("prefix").is_some_and(InputValueDefinition::is_required));

        assert_eq!(schema.possible_types("Node"), vec!["User"]);
        assert!(schema.is_possible_type("Node", "User"));
        assert_eq!(
            schema.object_for_host(TypeId::of::<User>()).map(|def| def.name.as_str()),
            Some("User")
        );
        assert!(schema.directive("skip").is_some());
        assert!(schema.get_type("Boolean").is_some_and(TypeDefinition::is_leaf));
    }

    #[test]
    fn unknown_field_type() {
        let err = Schema::build(query()).finish().unwrap_err();
        assert_eq!(err.to_string(), "At Query.me, unknown type 'User'");
    }

    #[test]
    fn unbound_parameter() {
        let object = ObjectType::new("User").field(Field::new(
            "greeting",
            "String!",
            Member::method1(["prefix"], |user: &User, prefix: String| {
                Ok::<_, ResolverError>(format!("{prefix} {}", user.name))
            }),
        ));
        let err = Schema::build(query()).object(object).finish().unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnboundParameter {
                location: "User.greeting".into(),
                param: "prefix".into()
            }
        );
    }

    #[test]
    fn missing_interface_field() {
        let err = Schema::build(query())
            .object(user())
            .interface(InterfaceType::new("Node").field("id", "ID!"))
            .finish()
            .unwrap_err();
        assert_eq!(err.to_string(), "'User' must define field 'id' to implement 'Node'");
    }

    #[test]
    fn host_type_backs_one_object() {
        let err = Schema::build(query())
            .object(user())
            .object(ObjectType::<User>::new("Person"))
            .interface(InterfaceType::new("Node").field("name", "String!"))
            .finish()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateHostType { .. }));
    }
}
