mod builder;
mod definition;
mod error;
mod origin;
mod schema;

pub use builder::{
    Argument, DirectiveType, EnumType, Field, InputObjectType, InterfaceType, ObjectType, SchemaBuilder, UnionType,
};
pub use definition::*;
pub use error::SchemaError;
pub use origin::{FieldOrigin, OriginKind, SecurityPolicy};
pub use schema::{Schema, SchemaId, SchemaInner};
