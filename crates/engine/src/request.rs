use std::{any::Any, sync::Arc};

use async_graphql_value::{ConstValue, Name};
use engine_operation::Variables;
use tokio_util::sync::CancellationToken;

use crate::{context::Items, Identity, ServiceProvider};

/// A query to execute, with everything scoped to it.
///
/// Only the query text, the operation name and the variables come from the
/// wire, everything else is set by the host.
#[derive(Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(skip)]
    pub identity: Identity,
    #[serde(skip)]
    pub services: Option<Arc<dyn ServiceProvider>>,
    #[serde(skip)]
    pub cancellation: CancellationToken,
    #[serde(skip)]
    pub items: Items,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn variable(mut self, name: &str, value: impl Into<ConstValue>) -> Self {
        self.variables.insert(Name::new(name), value.into());
        self
    }

    /// Variables from a JSON object. Anything else provides no variables.
    #[must_use]
    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        if let Ok(ConstValue::Object(variables)) = ConstValue::from_json(variables) {
            self.variables.extend(variables);
        }
        self
    }

    #[must_use]
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn services(mut self, services: impl ServiceProvider + 'static) -> Self {
        self.services = Some(Arc::new(services));
        self
    }

    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    #[must_use]
    pub fn item<T: Any + Send + Sync>(self, item: T) -> Self {
        self.items.insert(item);
        self
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("query", &self.query)
            .field("operation_name", &self.operation_name)
            .field("variables", &self.variables)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}
