mod data;

use std::collections::BTreeMap;

use engine_error::{Location, Message, MessageCode, ResponsePath};

pub use data::{fields_to_json, DataValue, FieldDataItem, FieldStatus, ObjectData};

const REDACTED: &str = "Internal server error";

/// Outcome of a request: the resolved data, if execution started, and every
/// message the pipeline produced.
#[derive(Debug)]
pub struct Response {
    data: Option<serde_json::Value>,
    messages: Vec<Message>,
    expose_exceptions: bool,
}

/// A critical message as clients see it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<ResponsePath>,
    pub extensions: BTreeMap<String, serde_json::Value>,
}

impl Response {
    pub(crate) fn new(data: Option<serde_json::Value>, messages: Vec<Message>, expose_exceptions: bool) -> Self {
        Response {
            data,
            messages,
            expose_exceptions,
        }
    }

    /// Absent when the request failed before execution.
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Every message, whatever its severity, unredacted.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// No message reached critical severity.
    pub fn is_valid(&self) -> bool {
        !self.messages.iter().any(Message::is_critical)
    }

    /// Critical messages, with unhandled errors redacted unless exceptions are
    /// exposed. The `code` extension is the message code unless the resolver
    /// set its own.
    pub fn errors(&self) -> Vec<GraphqlError> {
        self.messages
            .iter()
            .filter(|message| message.is_critical())
            .map(|message| self.error(message))
            .collect()
    }

    fn error(&self, message: &Message) -> GraphqlError {
        let redacted = !self.expose_exceptions
            && matches!(
                message.code,
                MessageCode::UnhandledException | MessageCode::InternalServerError
            );
        let mut extensions = BTreeMap::new();
        if !redacted {
            extensions.extend(message.metadata.clone());
        }
        extensions
            .entry("code".to_string())
            .or_insert_with(|| serde_json::Value::String(message.code.to_string()));
        GraphqlError {
            message: if redacted {
                REDACTED.to_string()
            } else {
                message.text.to_string()
            },
            locations: message.origin().location.into_iter().collect(),
            path: message.origin().path.clone(),
            extensions,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut response = serde_json::Map::new();
        if let Some(data) = &self.data {
            response.insert("data".to_string(), data.clone());
        }
        let errors = self.errors();
        if !errors.is_empty() {
            response.insert(
                "errors".to_string(),
                serde_json::to_value(errors).unwrap_or(serde_json::Value::Null),
            );
        }
        serde_json::Value::Object(response)
    }
}

impl serde::Serialize for Response {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use engine_error::SourceOrigin;
    use serde_json::json;

    use super::*;

    fn messages() -> Vec<Message> {
        let failure = std::io::Error::other("connection refused to 10.0.0.3");
        vec![
            Message::warning(MessageCode::ResolverError, "slow resolver"),
            Message::critical(MessageCode::ResolverError, "User not found")
                .with_origin(SourceOrigin::at(Location::new(2, 3)).with_path(ResponsePath::root().child("user")))
                .with_metadata("reason", "NOT_FOUND"),
            Message::critical(MessageCode::UnhandledException, "connection refused to 10.0.0.3")
                .with_origin(Location::new(3, 3))
                .with_exception(Arc::new(failure)),
        ]
    }

    #[test]
    fn unhandled_errors_are_redacted() {
        let response = Response::new(Some(json!({"user": null})), messages(), false);

        assert!(!response.is_valid());
        assert_eq!(response.messages().len(), 3);
        insta::assert_json_snapshot!(response, @r###"
        {
          "data": {
            "user": null
          },
          "errors": [
            {
              "message": "User not found",
              "locations": [
                {
                  "line": 2,
                  "column": 3
                }
              ],
              "path": [
                "user"
              ],
              "extensions": {
                "code": "RESOLVER_ERROR",
                "reason": "NOT_FOUND"
              }
            },
            {
              "message": "Internal server error",
              "locations": [
                {
                  "line": 3,
                  "column": 3
                }
              ],
              "extensions": {
                "code": "UNHANDLED_EXCEPTION"
              }
            }
          ]
        }
        "###);
    }

    #[test]
    fn exposed_exceptions_keep_their_text() {
        let response = Response::new(None, messages(), true);

        let errors = response.errors();
        assert_eq!(errors[1].message, "connection refused to 10.0.0.3");
        assert_eq!(response.to_json().get("data"), None);
    }

    #[test]
    fn valid_response_has_no_errors() {
        let response = Response::new(Some(json!({"a": 1})), Vec::new(), false);
        assert!(response.is_valid());
        assert_eq!(response.to_json(), json!({"data": {"a": 1}}));
    }
}
