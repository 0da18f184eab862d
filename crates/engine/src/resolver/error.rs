use std::{any::Any, sync::Arc};

use engine_error::{Message, MessageCode, SourceOrigin};
use engine_invocation::{InvocationError, ResolverError};

/// Message reported for a failed invocation.
///
/// Domain errors keep their text. Everything else is kept as the message's
/// exception so the response can redact it.
pub(super) fn invocation_message(err: InvocationError, origin: SourceOrigin) -> Message {
    let message = match err {
        InvocationError::Resolver(ResolverError::Domain { message, code }) => {
            let mut error = Message::critical(MessageCode::ResolverError, message);
            if let Some(code) = code {
                error = error.with_metadata("code", code.into_owned());
            }
            error
        }
        InvocationError::Resolver(ResolverError::Unhandled(exception)) => {
            Message::critical(MessageCode::UnhandledException, exception.to_string()).with_exception(exception)
        }
        InvocationError::Resolver(err @ ResolverError::Panicked(_)) => {
            Message::critical(MessageCode::UnhandledException, err.to_string()).with_exception(Arc::new(err))
        }
        err @ InvocationError::SourceMismatch { .. } => {
            Message::critical(MessageCode::InvalidSource, err.to_string()).with_exception(Arc::new(err))
        }
        err => Message::critical(MessageCode::InternalServerError, err.to_string()).with_exception(Arc::new(err)),
    };
    message.with_origin(origin)
}

pub(super) fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use engine_error::{Location, Severity};

    use super::*;

    #[test]
    fn domain_errors_keep_their_text_and_code() {
        let err = ResolverError::domain("User not found").with_code("NOT_FOUND");
        let message = invocation_message(err.into(), SourceOrigin::at(Location::new(1, 3)));

        assert_eq!(message.severity(), Severity::Critical);
        assert_eq!(message.code, MessageCode::ResolverError);
        assert_eq!(message.text, "User not found");
        assert_eq!(message.metadata.get("code"), Some(&serde_json::json!("NOT_FOUND")));
        assert!(message.exception.is_none());
        assert_eq!(message.origin().location, Some(Location::new(1, 3)));
    }

    #[test]
    fn other_errors_carry_an_exception() {
        let unhandled = ResolverError::from(anyhow::anyhow!("disk full"));
        let message = invocation_message(unhandled.into(), SourceOrigin::none());
        assert_eq!(message.code, MessageCode::UnhandledException);
        assert_eq!(message.exception.as_ref().map(ToString::to_string).as_deref(), Some("disk full"));

        let panicked = invocation_message(ResolverError::Panicked("boom".into()).into(), SourceOrigin::none());
        assert_eq!(panicked.code, MessageCode::UnhandledException);
        assert_eq!(panicked.text, "resolver panicked: boom");

        let mismatch = InvocationError::SourceMismatch {
            expected: "User",
            actual: "Post",
        };
        let message = invocation_message(mismatch, SourceOrigin::none());
        assert_eq!(message.code, MessageCode::InvalidSource);

        let message = invocation_message(InvocationError::invalid_argument("id", "not an integer"), SourceOrigin::none());
        assert_eq!(message.code, MessageCode::InternalServerError);
    }

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_text(Box::new("static")), "static");
        assert_eq!(panic_text(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_text(Box::new(3)), "unknown panic payload");
    }
}
