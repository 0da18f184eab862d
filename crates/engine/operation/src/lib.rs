//! Operation preparation: a parsed query becomes a tree of document parts, is
//! validated against the schema and turned into a field invocation plan.

pub mod document;
pub mod plan;
pub mod validation;

pub use document::{ConstructionError, ConstructionOptions, Document, DocumentPart, PartId, PartKind};
pub use plan::{
    ArgumentValue, DirectiveInvocation, FieldInvocationContext, FieldInvocationPlan, PlanCacheKey, PlanError,
    TypeRestriction, VariableDefinition, Variables,
};
pub use validation::{
    document_rules, run_rules, validate, ChildContexts, DocumentRule, DocumentValidationContext, Rule,
    ValidationOptions, ValidationOutcome,
};
