use async_graphql_value::ConstValue;
use engine_error::ResponsePath;
use engine_invocation::HostValue;
use engine_operation::FieldInvocationContext;
use engine_schema::ObjectDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FieldStatus {
    Resolved,
    /// The resolver, a directive or a security check reported an error.
    Failed,
    /// A directive left the field out.
    Skipped,
    Cancelled,
}

/// One resolved field of one source object.
#[derive(Debug)]
pub struct FieldDataItem<'a> {
    pub field: &'a FieldInvocationContext,
    pub path: ResponsePath,
    pub status: FieldStatus,
    /// Raw resolver output.
    pub output: HostValue,
    pub value: DataValue<'a>,
}

/// Completed value of a field, shaped after its output.
#[derive(Debug, Default)]
pub enum DataValue<'a> {
    #[default]
    Null,
    Leaf(ConstValue),
    Object(ObjectData<'a>),
    List(Vec<DataValue<'a>>),
}

#[derive(Debug)]
pub struct ObjectData<'a> {
    /// `None` when the host value has no object type in the schema.
    pub object: Option<&'a ObjectDefinition>,
    pub host_type: &'static str,
    pub fields: Vec<FieldDataItem<'a>>,
}

impl<'a> FieldDataItem<'a> {
    pub(crate) fn resolved(field: &'a FieldInvocationContext, path: ResponsePath, output: HostValue, value: DataValue<'a>) -> Self {
        FieldDataItem {
            field,
            path,
            status: FieldStatus::Resolved,
            output,
            value,
        }
    }

    pub(crate) fn unresolved(field: &'a FieldInvocationContext, path: ResponsePath, status: FieldStatus) -> Self {
        FieldDataItem {
            field,
            path,
            status,
            output: HostValue::Null,
            value: DataValue::Null,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == FieldStatus::Resolved
    }

    /// Items of the objects this field resolved to, lists flattened.
    pub fn children(&self) -> Vec<&FieldDataItem<'a>> {
        let mut children = Vec::new();
        if self.is_resolved() {
            self.value.collect_fields(&mut children);
        }
        children
    }
}

impl<'a> DataValue<'a> {
    fn collect_fields<'s>(&'s self, out: &mut Vec<&'s FieldDataItem<'a>>) {
        match self {
            DataValue::Object(object) => out.extend(object.fields.iter()),
            DataValue::List(items) => {
                for item in items {
                    item.collect_fields(out);
                }
            }
            DataValue::Null | DataValue::Leaf(_) => {}
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DataValue::Null => serde_json::Value::Null,
            DataValue::Leaf(value) => value.clone().into_json().unwrap_or(serde_json::Value::Null),
            DataValue::Object(object) => serde_json::Value::Object(fields_to_json(&object.fields)),
            DataValue::List(items) => serde_json::Value::Array(items.iter().map(DataValue::to_json).collect()),
        }
    }
}

/// JSON object of the resolved items, keyed by response key in selection
/// order. Items that did not resolve are left out.
pub fn fields_to_json(items: &[FieldDataItem<'_>]) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::with_capacity(items.len());
    for item in items.iter().filter(|item| item.is_resolved()) {
        let value = item.value.to_json();
        match map.get_mut(item.field.response_key.as_str()) {
            Some(existing) => merge(existing, value),
            None => {
                map.insert(item.field.response_key.to_string(), value);
            }
        }
    }
    map
}

fn merge(existing: &mut serde_json::Value, value: serde_json::Value) {
    match (existing, value) {
        (serde_json::Value::Object(existing), serde_json::Value::Object(value)) => {
            for (key, value) in value {
                match existing.get_mut(&key) {
                    Some(current) => merge(current, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (existing, value) => *existing = value,
    }
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::types::Type;
    use async_graphql_value::Name;
    use engine_error::Location;
    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;

    fn field(key: &str) -> FieldInvocationContext {
        FieldInvocationContext {
            response_key: Name::new(key),
            field_name: Name::new(key),
            parent_type: "Query".into(),
            ty: Type::new("String").unwrap(),
            arguments: IndexMap::new(),
            directives: Vec::new(),
            restrict: None,
            origin: Location::new(1, 1),
            children: Vec::new(),
        }
    }

    #[test]
    fn only_resolved_fields_are_rendered() {
        let (name, email, age) = (field("name"), field("email"), field("age"));
        let items = vec![
            FieldDataItem::resolved(&name, ResponsePath::root(), HostValue::Null, DataValue::Leaf("ada".into())),
            FieldDataItem::unresolved(&email, ResponsePath::root(), FieldStatus::Failed),
            FieldDataItem::unresolved(&age, ResponsePath::root(), FieldStatus::Cancelled),
        ];

        assert_eq!(serde_json::Value::Object(fields_to_json(&items)), json!({"name": "ada"}));
    }

    #[test]
    fn duplicate_keys_are_merged() {
        let mut a = json!({"user": {"id": 1, "friends": [1]}});
        merge(&mut a, json!({"user": {"name": "ada", "friends": [2]}}));
        assert_eq!(a, json!({"user": {"id": 1, "friends": [2], "name": "ada"}}));
    }
}
