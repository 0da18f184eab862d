use engine_invocation::MemberKey;

/// What kind of host member backs a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OriginKind {
    /// A getter on the parent value.
    Property,
    /// A method on the parent value.
    Method,
    /// A method of a root operation type, called on a service-provided instance.
    Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldOrigin {
    pub kind: OriginKind,
    pub member: MemberKey,
    pub owner_name: &'static str,
}

impl FieldOrigin {
    pub fn member_name(&self) -> &str {
        &self.member.name
    }
}

impl std::fmt::Display for FieldOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}::{}", self.kind, self.owner_name, self.member.name)
    }
}

/// Requirements a request must meet before the field is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityPolicy {
    pub authenticated: bool,
    /// Any one of these roles grants access. Empty means no role is needed.
    pub roles: Vec<String>,
}

impl SecurityPolicy {
    pub fn authenticated() -> Self {
        SecurityPolicy {
            authenticated: true,
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self.authenticated = true;
        self
    }
}
