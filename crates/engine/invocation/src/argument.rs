use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;

use crate::InvocationError;

/// Arguments of a single invocation, keyed by parameter name.
pub type Arguments = IndexMap<Name, ConstValue>;

/// Runtime kind of an argument value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ValueKind {
    Null,
    Boolean,
    Int,
    Float,
    String,
    Enum,
    Binary,
    List,
    Object,
}

impl ValueKind {
    pub fn of(value: &ConstValue) -> Self {
        match value {
            ConstValue::Null => ValueKind::Null,
            ConstValue::Boolean(_) => ValueKind::Boolean,
            ConstValue::Number(n) if n.is_f64() => ValueKind::Float,
            ConstValue::Number(_) => ValueKind::Int,
            ConstValue::String(_) => ValueKind::String,
            ConstValue::Enum(_) => ValueKind::Enum,
            ConstValue::Binary(_) => ValueKind::Binary,
            ConstValue::List(_) => ValueKind::List,
            ConstValue::Object(_) => ValueKind::Object,
        }
    }
}

/// Declared kind of a member parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ParamKind {
    Boolean,
    Int,
    Float,
    String,
    Enum,
    List,
    Object,
    Any,
}

impl ParamKind {
    /// Whether a non-null value of `kind` can be coerced into this parameter.
    pub fn accepts(self, kind: ValueKind) -> bool {
        match (self, kind) {
            (_, ValueKind::Null) => false,
            (ParamKind::Any | ParamKind::List, _) => true,
            (ParamKind::Boolean, ValueKind::Boolean)
            | (ParamKind::Int, ValueKind::Int)
            | (ParamKind::Float, ValueKind::Int | ValueKind::Float)
            | (ParamKind::String | ParamKind::Enum, ValueKind::String | ValueKind::Enum)
            | (ParamKind::Object, ValueKind::Object) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub nullable: bool,
}

impl Param {
    pub fn of<A: FromArgument>(name: &'static str) -> Self {
        Param {
            name,
            kind: A::KIND,
            nullable: A::NULLABLE,
        }
    }

    pub fn accepts(&self, kind: ValueKind) -> bool {
        (kind == ValueKind::Null && self.nullable) || self.kind.accepts(kind)
    }
}

/// Coerces `value` into the shape `param` declares.
///
/// Both the compiled and the dynamic invocation paths go through this
/// function so they agree on every input.
pub fn coerce(param: &Param, value: ConstValue) -> Result<ConstValue, InvocationError> {
    let kind = ValueKind::of(&value);
    if kind == ValueKind::Null {
        return if param.nullable {
            Ok(ConstValue::Null)
        } else {
            Err(InvocationError::invalid_argument(param.name, "null is not allowed"))
        };
    }
    if !param.kind.accepts(kind) {
        return Err(InvocationError::invalid_argument(
            param.name,
            format!("expected {}, found {kind}", param.kind),
        ));
    }

    Ok(match (param.kind, value) {
        (ParamKind::Float, ConstValue::Number(n)) => match n.as_f64().and_then(serde_json::Number::from_f64) {
            Some(n) => ConstValue::Number(n),
            None => return Err(InvocationError::invalid_argument(param.name, "not a finite number")),
        },
        (ParamKind::String, ConstValue::Enum(name)) => ConstValue::String(name.to_string()),
        (ParamKind::Enum, ConstValue::String(s)) => ConstValue::Enum(Name::new(s)),
        (ParamKind::List, value @ ConstValue::List(_)) => value,
        (ParamKind::List, value) => ConstValue::List(vec![value]),
        (_, value) => value,
    })
}

/// Conversion from a coerced argument value into a typed Rust parameter.
pub trait FromArgument: Sized + Send + 'static {
    const KIND: ParamKind;
    const NULLABLE: bool = false;

    /// `value` has already been through [`coerce`] with this type's parameter.
    fn from_argument(value: ConstValue) -> Result<Self, String>;
}

impl FromArgument for bool {
    const KIND: ParamKind = ParamKind::Boolean;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Boolean(b) => Ok(b),
            other => Err(format!("expected a boolean, found {other}")),
        }
    }
}

impl FromArgument for i64 {
    const KIND: ParamKind = ParamKind::Int;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Number(n) => n.as_i64().ok_or_else(|| format!("{n} is not an integer")),
            other => Err(format!("expected an integer, found {other}")),
        }
    }
}

impl FromArgument for i32 {
    const KIND: ParamKind = ParamKind::Int;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        let n = i64::from_argument(value)?;
        i32::try_from(n).map_err(|_| format!("{n} does not fit a 32-bit integer"))
    }
}

impl FromArgument for f64 {
    const KIND: ParamKind = ParamKind::Float;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is not a float")),
            other => Err(format!("expected a float, found {other}")),
        }
    }
}

impl FromArgument for String {
    const KIND: ParamKind = ParamKind::String;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::String(s) => Ok(s),
            ConstValue::Enum(name) => Ok(name.to_string()),
            other => Err(format!("expected a string, found {other}")),
        }
    }
}

impl FromArgument for ConstValue {
    const KIND: ParamKind = ParamKind::Any;
    const NULLABLE: bool = true;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        Ok(value)
    }
}

impl<T: FromArgument> FromArgument for Option<T> {
    const KIND: ParamKind = T::KIND;
    const NULLABLE: bool = true;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        match value {
            ConstValue::Null => Ok(None),
            value => T::from_argument(value).map(Some),
        }
    }
}

impl<T: FromArgument> FromArgument for Vec<T> {
    const KIND: ParamKind = ParamKind::List;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        let ConstValue::List(items) = value else {
            return Err(format!("expected a list, found {value}"));
        };
        let item = Param::of::<T>("item");
        items
            .into_iter()
            .map(|value| {
                let value = coerce(&item, value).map_err(|err| err.to_string())?;
                T::from_argument(value)
            })
            .collect()
    }
}

/// Argument deserialized with serde, typically an input object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> FromArgument for Json<T>
where
    T: serde::de::DeserializeOwned + Send + 'static,
{
    const KIND: ParamKind = ParamKind::Any;

    fn from_argument(value: ConstValue) -> Result<Self, String> {
        let json = value.into_json().map_err(|err| err.to_string())?;
        serde_json::from_value(json).map(Json).map_err(|err| err.to_string())
    }
}
