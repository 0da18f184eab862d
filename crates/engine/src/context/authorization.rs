use engine_schema::SecurityPolicy;

use super::{ContextBase, ExecutionContext, FieldExecutionContext};
use crate::Identity;

/// Authentication challenge for a secured schema item, before any of its
/// resolvers run.
pub struct SchemaItemSecurityChallengeContext<'a> {
    base: ContextBase,
    item: String,
    policy: &'a SecurityPolicy,
    identity: &'a Identity,
}

impl<'a> SchemaItemSecurityChallengeContext<'a> {
    pub fn new(base: ContextBase, item: String, policy: &'a SecurityPolicy, identity: &'a Identity) -> Self {
        SchemaItemSecurityChallengeContext {
            base,
            item,
            policy,
            identity,
        }
    }

    /// Coordinate of the secured item, e.g. `Query.me`.
    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn policy(&self) -> &'a SecurityPolicy {
        self.policy
    }

    pub fn identity(&self) -> &'a Identity {
        self.identity
    }
}

impl ExecutionContext for SchemaItemSecurityChallengeContext<'_> {
    fn base(&self) -> &ContextBase {
        &self.base
    }
}

/// Authorization of an authenticated request against a field's policy.
pub struct FieldAuthorizationContext<'a> {
    base: ContextBase,
    field: &'a FieldExecutionContext<'a>,
    policy: &'a SecurityPolicy,
}

impl<'a> FieldAuthorizationContext<'a> {
    pub fn new(field: &'a FieldExecutionContext<'a>, policy: &'a SecurityPolicy) -> Self {
        FieldAuthorizationContext {
            base: field.base().derive(),
            field,
            policy,
        }
    }

    pub fn field(&self) -> &'a FieldExecutionContext<'a> {
        self.field
    }

    pub fn policy(&self) -> &'a SecurityPolicy {
        self.policy
    }

    pub fn identity(&self) -> &'a Identity {
        self.field.query().identity()
    }
}

impl ExecutionContext for FieldAuthorizationContext<'_> {
    fn base(&self) -> &ContextBase {
        &self.base
    }
}
