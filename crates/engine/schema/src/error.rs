#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("Field '{field}' is defined more than once on '{ty}'")]
    DuplicateField { ty: String, field: String },
    #[error("At {location}, '{ty}' is not a valid type reference")]
    InvalidTypeReference { location: String, ty: String },
    #[error("At {location}, unknown type '{name}'")]
    UnknownType { location: String, name: String },
    #[error("At {location}, '{name}' is not an output type")]
    NotAnOutputType { location: String, name: String },
    #[error("At {location}, '{name}' is not an input type")]
    NotAnInputType { location: String, name: String },
    #[error("The {operation} root type '{name}' must be an object type")]
    InvalidRootType { operation: &'static str, name: String },
    #[error("'{object}' declares '{interface}' but it is not an interface")]
    NotAnInterface { object: String, interface: String },
    #[error("'{object}' must define field '{field}' to implement '{interface}'")]
    InterfaceNotImplemented {
        object: String,
        interface: String,
        field: String,
    },
    #[error("Union '{union}' member '{member}' must be an object type")]
    InvalidUnionMember { union: String, member: String },
    #[error("Host type {host} backs both '{first}' and '{second}'")]
    DuplicateHostType {
        host: &'static str,
        first: String,
        second: String,
    },
    #[error("At {location}, parameter '{param}' has no matching argument")]
    UnboundParameter { location: String, param: String },
    #[error("At {location}, a setter cannot resolve a field")]
    InvalidResolver { location: String },
}
