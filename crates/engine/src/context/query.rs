use std::sync::Arc;

use engine_operation::{FieldInvocationPlan, Variables};
use engine_schema::Schema;

use super::{ContextBase, ExecutionContext};
use crate::{Identity, ServiceProvider};

/// Top of the execution pipeline of one request: the plan being executed and
/// everything its fields share.
pub struct QueryExecutionContext {
    base: ContextBase,
    schema: Schema,
    plan: Arc<FieldInvocationPlan>,
    variables: Variables,
    identity: Identity,
    services: Arc<dyn ServiceProvider>,
}

impl QueryExecutionContext {
    pub fn new(
        base: ContextBase,
        schema: Schema,
        plan: Arc<FieldInvocationPlan>,
        variables: Variables,
        identity: Identity,
        services: Arc<dyn ServiceProvider>,
    ) -> Self {
        QueryExecutionContext {
            base,
            schema,
            plan,
            variables,
            identity,
            services,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn plan(&self) -> &FieldInvocationPlan {
        &self.plan
    }

    /// Coerced variables of the request.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn services(&self) -> &dyn ServiceProvider {
        self.services.as_ref()
    }
}

impl ExecutionContext for QueryExecutionContext {
    fn base(&self) -> &ContextBase {
        &self.base
    }
}
