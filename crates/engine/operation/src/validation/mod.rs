//! A generic, tree-shaped rule engine and the rules checking documents.
//!
//! Contexts know how to produce the contexts of their children, the engine
//! walks them depth-first and applies every rule to every context in order.

#[cfg(test)]
#[macro_use]
mod test_harness;

mod context;
mod rules;

use engine_error::MessageCollection;
use engine_schema::Schema;
use tokio_util::sync::CancellationToken;

pub use context::DocumentValidationContext;

use crate::Document;

/// Capability every validated tree node provides.
pub trait ChildContexts: Sized {
    fn has_children(&self) -> bool;

    /// Contexts of the children, in order. Only called when [`Self::has_children`] holds.
    fn child_contexts(&self) -> Vec<Self>;

    fn is_cancelled(&self) -> bool;
}

pub trait Rule<C> {
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: &C);
}

pub type DocumentRule = Box<dyn for<'a> Rule<DocumentValidationContext<'a>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ValidationOutcome {
    Completed,
    Cancelled,
}

/// Applies `rules` to `root` and every context below it, depth-first and in order.
pub fn run_rules<C, R>(root: C, rules: &[Box<R>]) -> ValidationOutcome
where
    C: ChildContexts,
    R: Rule<C> + ?Sized,
{
    let mut stack = vec![root];
    while let Some(ctx) = stack.pop() {
        for rule in rules {
            if ctx.is_cancelled() {
                return ValidationOutcome::Cancelled;
            }
            rule.apply(&ctx);
        }
        if ctx.has_children() {
            stack.extend(ctx.child_contexts().into_iter().rev());
        }
    }
    ValidationOutcome::Completed
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub max_query_depth: Option<usize>,
}

/// The document rules, in the order they are applied.
pub fn document_rules(options: &ValidationOptions) -> Vec<DocumentRule> {
    let mut rules: Vec<DocumentRule> = vec![
        Box::new(rules::LoneAnonymousOperation),
        Box::new(rules::UniqueOperationNames),
        Box::new(rules::KnownRootType),
        Box::new(rules::FieldsOnCorrectType),
        Box::new(rules::ScalarLeafs),
        Box::new(rules::KnownArgumentNames),
        Box::new(rules::ProvidedRequiredArguments),
        Box::new(rules::KnownFragmentNames),
        Box::new(rules::FragmentsOnCompositeTypes),
        Box::new(rules::NoUnusedFragments),
        Box::new(rules::NoFragmentCycles),
        Box::new(rules::NoUndefinedVariables),
        Box::new(rules::NoUnusedVariables),
        Box::new(rules::KnownDirectives),
        Box::new(rules::UniqueDirectivesPerLocation),
    ];
    if let Some(limit) = options.max_query_depth {
        rules.push(Box::new(rules::MaxDepth::new(limit)));
    }
    rules
}

/// Validates `document` against `schema`, reporting on `messages`.
pub fn validate(
    document: &Document,
    schema: &Schema,
    rules: &[DocumentRule],
    messages: &MessageCollection,
    cancellation: &CancellationToken,
) -> ValidationOutcome {
    let _span = tracing::debug_span!("validation", rules = rules.len()).entered();
    let before = messages.len();
    let outcome = run_rules(
        DocumentValidationContext::root(document, schema, messages, cancellation),
        rules,
    );
    tracing::debug!(%outcome, errors = messages.len() - before, "document validated");
    outcome
}
