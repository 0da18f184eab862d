#![deny(clippy::future_not_send)]

//! Query execution: a request goes from its text to a validated plan, whose
//! fields are resolved by the Rust members of the schema's host types.

mod auth;
pub mod context;
mod directive;
mod engine;
mod isolation;
mod listener;
mod plan_cache;
mod request;
mod resolver;
pub mod response;
mod services;
pub mod validation;
mod variables;

pub use auth::{Authorizer, DefaultAuthorizer, Identity};
pub use directive::{DirectiveHandler, DirectiveOutcome, IncludeDirective, SkipDirective};
pub use engine::{Engine, EngineBuilder};
pub use isolation::IsolationPolicy;
pub use listener::{ExecutionListener, NoopListener, Phase, TracingListener};
pub use plan_cache::{InMemoryPlanCache, NoPlanCache, PlanCache};
pub use request::Request;
pub use response::{FieldStatus, GraphqlError, Response};
pub use services::{ServiceCollection, ServiceProvider};
pub use variables::{coerce_variables, InputValueError};

pub use engine_config::EngineConfig;
pub use engine_schema::Schema;
