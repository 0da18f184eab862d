//! Coercion of request variables against the declared variable types.

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::{ConstValue, Name};
use engine_error::{Location, Message, MessageCode};
use engine_operation::{VariableDefinition, Variables};
use engine_schema::{EnumDefinition, InputObjectDefinition, Schema, TypeDefinition};
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputValueError {
    #[error(r#"Variable "${name}" of required type "{ty}" was not provided"#)]
    MissingVariable { name: Name, ty: String, location: Location },
    #[error(r#"Variable "${name}" got an invalid value{path}: found null for the non-null type "{expected}""#)]
    UnexpectedNull {
        name: Name,
        expected: String,
        path: String,
        location: Location,
    },
    #[error(r#"Variable "${name}" got an invalid value{path}: expected a value of type "{expected}", found {actual}"#)]
    IncorrectType {
        name: Name,
        expected: String,
        actual: String,
        path: String,
        location: Location,
    },
    #[error(r#"Variable "${name}" got an invalid value{path}: "{value}" is not a value of the enum "{r#enum}""#)]
    UnknownEnumValue {
        name: Name,
        r#enum: String,
        value: String,
        path: String,
        location: Location,
    },
    #[error(r#"Variable "${name}" got an invalid value{path}: "{field}" is not a field of "{input_object}""#)]
    UnknownInputField {
        name: Name,
        input_object: String,
        field: String,
        path: String,
        location: Location,
    },
    #[error(r#"Variable "${name}" has the unknown type "{ty}""#)]
    UnknownType { name: Name, ty: String, location: Location },
}

impl InputValueError {
    pub fn location(&self) -> Location {
        match self {
            InputValueError::MissingVariable { location, .. }
            | InputValueError::UnexpectedNull { location, .. }
            | InputValueError::IncorrectType { location, .. }
            | InputValueError::UnknownEnumValue { location, .. }
            | InputValueError::UnknownInputField { location, .. }
            | InputValueError::UnknownType { location, .. } => *location,
        }
    }
}

impl From<InputValueError> for Message {
    fn from(err: InputValueError) -> Self {
        let location = err.location();
        Message::critical(MessageCode::VariableError, err.to_string()).with_origin(location)
    }
}

/// Coerces the provided variables. Variables that are not provided take the
/// default of their definition, or are left out when there is none. Every
/// variable is checked, so all errors are reported at once.
pub fn coerce_variables(
    schema: &Schema,
    definitions: &[VariableDefinition],
    mut provided: Variables,
) -> Result<Variables, Vec<InputValueError>> {
    let mut variables = Variables::new();
    let mut errors = Vec::new();
    for definition in definitions {
        let value = match provided.swap_remove(&definition.name) {
            Some(value) => value,
            None => match &definition.default_value {
                Some(default) => default.clone(),
                None if !definition.ty.nullable => {
                    errors.push(InputValueError::MissingVariable {
                        name: definition.name.clone(),
                        ty: definition.ty.to_string(),
                        location: definition.origin,
                    });
                    continue;
                }
                None => continue,
            },
        };
        let mut ctx = VariableCoercionContext {
            schema,
            definition,
            value_path: Vec::new(),
        };
        match ctx.coerce_input_value(&definition.ty, value) {
            Ok(value) => {
                variables.insert(definition.name.clone(), value);
            }
            Err(err) => errors.push(err),
        }
    }
    if !provided.is_empty() {
        tracing::debug!(
            ignored = ?provided.keys().map(Name::as_str).collect::<Vec<_>>(),
            "undeclared variables ignored"
        );
    }
    if errors.is_empty() {
        Ok(variables)
    } else {
        Err(errors)
    }
}

enum ValuePathSegment {
    Index(usize),
    Field(String),
}

struct VariableCoercionContext<'a> {
    schema: &'a Schema,
    definition: &'a VariableDefinition,
    value_path: Vec<ValuePathSegment>,
}

impl<'a> VariableCoercionContext<'a> {
    fn coerce_input_value(&mut self, ty: &Type, value: ConstValue) -> Result<ConstValue, InputValueError> {
        if value == ConstValue::Null {
            if ty.nullable {
                return Ok(ConstValue::Null);
            }
            return Err(InputValueError::UnexpectedNull {
                name: self.definition.name.clone(),
                expected: ty.to_string(),
                path: self.path(),
                location: self.definition.origin,
            });
        }

        match &ty.base {
            BaseType::List(item_type) => match value {
                ConstValue::List(items) => {
                    let mut coerced = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        self.value_path.push(ValuePathSegment::Index(index));
                        coerced.push(self.coerce_input_value(item_type, item)?);
                        self.value_path.pop();
                    }
                    Ok(ConstValue::List(coerced))
                }
                // A single value stands for a list of one.
                value => Ok(ConstValue::List(vec![self.coerce_input_value(item_type, value)?])),
            },
            BaseType::Named(name) => match self.schema.get_type(name) {
                Some(TypeDefinition::Scalar(scalar)) => self.coerce_scalar(&scalar.name, value),
                Some(TypeDefinition::Enum(r#enum)) => self.coerce_enum(r#enum, value),
                Some(TypeDefinition::InputObject(input_object)) => self.coerce_input_object(input_object, value),
                _ => Err(InputValueError::UnknownType {
                    name: self.definition.name.clone(),
                    ty: name.to_string(),
                    location: self.definition.origin,
                }),
            },
        }
    }

    fn coerce_scalar(&mut self, scalar: &str, value: ConstValue) -> Result<ConstValue, InputValueError> {
        match (scalar, value) {
            ("Int", ConstValue::Number(number)) if number.as_i64().is_some_and(|n| i32::try_from(n).is_ok()) => {
                Ok(ConstValue::Number(number))
            }
            ("Float", ConstValue::Number(number)) => match number.as_f64().and_then(serde_json::Number::from_f64) {
                Some(number) => Ok(ConstValue::Number(number)),
                None => Err(self.incorrect_type(scalar, &ConstValue::Number(number))),
            },
            ("String", value @ ConstValue::String(_)) | ("Boolean", value @ ConstValue::Boolean(_)) => Ok(value),
            ("ID", ConstValue::String(id)) => Ok(ConstValue::String(id)),
            ("ID", ConstValue::Number(number)) if number.is_i64() || number.is_u64() => {
                Ok(ConstValue::String(number.to_string()))
            }
            ("Int" | "Float" | "String" | "Boolean" | "ID", value) => Err(self.incorrect_type(scalar, &value)),
            // Custom scalars are opaque to the engine.
            (_, value) => Ok(value),
        }
    }

    fn coerce_enum(&mut self, r#enum: &EnumDefinition, value: ConstValue) -> Result<ConstValue, InputValueError> {
        let value = match value {
            ConstValue::Enum(value) => value.to_string(),
            ConstValue::String(value) => value,
            value => return Err(self.incorrect_type(&r#enum.name, &value)),
        };
        if !r#enum.values.contains(&value) {
            return Err(InputValueError::UnknownEnumValue {
                name: self.definition.name.clone(),
                r#enum: r#enum.name.clone(),
                value,
                path: self.path(),
                location: self.definition.origin,
            });
        }
        Ok(ConstValue::Enum(Name::new(value)))
    }

    fn coerce_input_object(
        &mut self,
        input_object: &'a InputObjectDefinition,
        value: ConstValue,
    ) -> Result<ConstValue, InputValueError> {
        let ConstValue::Object(mut fields) = value else {
            return Err(self.incorrect_type(&input_object.name, &value));
        };

        let mut coerced = IndexMap::with_capacity(input_object.fields.len());
        for (name, input_field) in &input_object.fields {
            let key = Name::new(name);
            match fields.swap_remove(&key) {
                None => {
                    if let Some(default) = &input_field.default_value {
                        coerced.insert(key, default.clone());
                    } else if !input_field.ty.nullable {
                        self.value_path.push(ValuePathSegment::Field(name.clone()));
                        let err = InputValueError::UnexpectedNull {
                            name: self.definition.name.clone(),
                            expected: input_field.ty.to_string(),
                            path: self.path(),
                            location: self.definition.origin,
                        };
                        return Err(err);
                    }
                }
                Some(value) => {
                    self.value_path.push(ValuePathSegment::Field(name.clone()));
                    let value = self.coerce_input_value(&input_field.ty, value)?;
                    self.value_path.pop();
                    coerced.insert(key, value);
                }
            }
        }
        if let Some(field) = fields.keys().next() {
            return Err(InputValueError::UnknownInputField {
                name: self.definition.name.clone(),
                input_object: input_object.name.clone(),
                field: field.to_string(),
                path: self.path(),
                location: self.definition.origin,
            });
        }
        Ok(ConstValue::Object(coerced))
    }

    fn incorrect_type(&self, expected: &str, actual: &ConstValue) -> InputValueError {
        InputValueError::IncorrectType {
            name: self.definition.name.clone(),
            expected: expected.to_string(),
            actual: actual.to_string(),
            path: self.path(),
            location: self.definition.origin,
        }
    }

    /// ` at "filter.tags[1]"`, or nothing at the root of the variable.
    fn path(&self) -> String {
        if self.value_path.is_empty() {
            return String::new();
        }
        let mut path = String::new();
        for segment in &self.value_path {
            match segment {
                ValuePathSegment::Index(index) => path.push_str(&format!("[{index}]")),
                ValuePathSegment::Field(name) => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(name);
                }
            }
        }
        format!(r#" at "{path}""#)
    }
}
