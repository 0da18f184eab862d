use async_graphql_value::ConstValue;
use engine_error::{Message, MessageCode};

use crate::context::{DirectiveExecutionContext, ExecutionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DirectiveOutcome {
    Continue,
    /// The field is left out of the response, without any error.
    Skip,
}

/// Applies an executable directive to the fields it is attached to.
pub trait DirectiveHandler: Send + Sync {
    fn execute(&self, ctx: &DirectiveExecutionContext<'_>) -> DirectiveOutcome;
}

/// `@skip(if: Boolean!)`
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipDirective;

impl DirectiveHandler for SkipDirective {
    fn execute(&self, ctx: &DirectiveExecutionContext<'_>) -> DirectiveOutcome {
        match condition(ctx) {
            Some(true) | None => DirectiveOutcome::Skip,
            Some(false) => DirectiveOutcome::Continue,
        }
    }
}

/// `@include(if: Boolean!)`
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeDirective;

impl DirectiveHandler for IncludeDirective {
    fn execute(&self, ctx: &DirectiveExecutionContext<'_>) -> DirectiveOutcome {
        match condition(ctx) {
            Some(true) => DirectiveOutcome::Continue,
            Some(false) | None => DirectiveOutcome::Skip,
        }
    }
}

/// The `if` argument. A missing or non-boolean condition is reported and the
/// field left out.
fn condition(ctx: &DirectiveExecutionContext<'_>) -> Option<bool> {
    match ctx.argument("if") {
        Some(ConstValue::Boolean(condition)) => Some(*condition),
        other => {
            let text = match other {
                Some(value) => format!(r#"Directive "@{}" expects a boolean "if" argument, got {value}"#, ctx.name()),
                None => format!(r#"Directive "@{}" is missing its "if" argument"#, ctx.name()),
            };
            ctx.add_message(Message::critical(MessageCode::DirectiveError, text).with_origin(ctx.origin()));
            None
        }
    }
}
