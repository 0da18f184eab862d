use std::collections::BTreeSet;

use crate::context::{FieldAuthorizationContext, SchemaItemSecurityChallengeContext};

/// Who a request is made on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    name: Option<String>,
    roles: BTreeSet<String>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(name: impl Into<String>) -> Self {
        Identity {
            name: Some(name.into()),
            roles: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> + '_ {
        self.roles.iter().map(String::as_str)
    }
}

/// Decides whether secured fields may be resolved.
///
/// The default implementation requires an authenticated identity for any
/// secured field, and one of the listed roles when the policy has some.
pub trait Authorizer: Send + Sync {
    /// Whether the request is authenticated well enough to access the item.
    fn challenge(&self, ctx: &SchemaItemSecurityChallengeContext<'_>) -> bool {
        !ctx.policy().authenticated || ctx.identity().is_authenticated()
    }

    /// Whether the authenticated request may resolve the field.
    fn authorize(&self, ctx: &FieldAuthorizationContext<'_>) -> bool {
        let roles = &ctx.policy().roles;
        roles.is_empty() || roles.iter().any(|role| ctx.identity().has_role(role))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAuthorizer;

impl Authorizer for DefaultAuthorizer {}
