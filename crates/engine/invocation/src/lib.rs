//! Fast invocation of the Rust members backing schema fields.
//!
//! Members are declared with typed closures ([`Member`], [`Constructor`]) and
//! registered per host type in a [`HostRegistry`]. The [`InvocationCache`]
//! turns a (type, member) pair into a reusable thunk on first use.

mod argument;
mod cache;
mod error;
mod member;
mod value;

pub use argument::{coerce, Arguments, FromArgument, Json, Param, ParamKind, ValueKind};
pub use cache::{
    ArgKinds, ConstructorThunk, InvocationCache, MemberKey, MethodThunk, PropertyThunk, SetterThunk,
};
pub use error::{InvocationError, ResolverError};
pub use member::{Constructor, HostRegistry, HostType, HostTypeBuilder, Member, MemberShape};
pub use value::{HostInstance, HostObject, HostValue, IntoHostValue};
