use std::{borrow::Cow, sync::Arc};

/// Error returned by a resolver.
///
/// `Domain` errors are expected failures whose text is meant for the client.
/// Anything else is wrapped as `Unhandled` and only exposed when the engine
/// is configured to do so.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolverError {
    #[error("{message}")]
    Domain {
        message: Cow<'static, str>,
        code: Option<Cow<'static, str>>,
    },
    #[error(transparent)]
    Unhandled(Arc<dyn std::error::Error + Send + Sync + 'static>),
    #[error("resolver panicked: {0}")]
    Panicked(String),
}

impl ResolverError {
    pub fn domain(message: impl Into<Cow<'static, str>>) -> Self {
        ResolverError::Domain {
            message: message.into(),
            code: None,
        }
    }

    #[must_use]
    pub fn with_code(self, code: impl Into<Cow<'static, str>>) -> Self {
        match self {
            ResolverError::Domain { message, .. } => ResolverError::Domain {
                message,
                code: Some(code.into()),
            },
            other => other,
        }
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, ResolverError::Domain { .. })
    }
}

impl From<anyhow::Error> for ResolverError {
    fn from(err: anyhow::Error) -> Self {
        let err: Box<dyn std::error::Error + Send + Sync + 'static> = err.into();
        ResolverError::Unhandled(Arc::from(err))
    }
}

/// Failures of the invocation machinery itself, plus the resolver's own error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvocationError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    #[error("expected a source of type {expected}, got {actual}")]
    SourceMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid value for argument \"{name}\": {reason}")]
    InvalidArgument { name: String, reason: String },
    #[error("{owner} has no member named \"{member}\"")]
    MissingMember { owner: &'static str, member: String },
    #[error("{owner} has no constructor accepting ({kinds})")]
    MissingConstructor { owner: &'static str, kinds: String },
    #[error("host type {0} is not registered")]
    UnknownType(String),
}

impl InvocationError {
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        InvocationError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
