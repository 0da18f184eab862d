use std::{collections::HashMap, sync::Arc, time::Instant};

use async_graphql_parser::types::OperationType;
use engine_config::EngineConfig;
use engine_error::{Message, MessageCode, MessageCollection, ResponsePath};
use engine_invocation::{HostInstance, HostObject};
use engine_operation::{
    document_rules, validate, ConstructionOptions, Document, FieldInvocationPlan, PlanCacheKey, ValidationOptions,
    ValidationOutcome,
};
use engine_schema::{ObjectDefinition, Schema};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    context::{ContextBase, ExecutionContext, Items, QueryExecutionContext},
    resolver::Executor,
    response::fields_to_json,
    validation::{result_rules, validate_result, ResultRule},
    variables::coerce_variables,
    Authorizer, DefaultAuthorizer, DirectiveHandler, DirectiveOutcome, ExecutionListener, InMemoryPlanCache,
    IncludeDirective, IsolationPolicy, NoPlanCache, NoopListener, Phase, PlanCache, Request, Response,
    ServiceCollection, ServiceProvider, SkipDirective,
};

/// Executes requests against one schema.
///
/// Cloning an engine is cheap, every clone shares the same plan cache.
#[derive(Clone)]
pub struct Engine(Arc<EngineInner>);

pub(crate) struct EngineInner {
    pub(crate) schema: Schema,
    pub(crate) config: EngineConfig,
    pub(crate) plan_cache: Box<dyn PlanCache>,
    pub(crate) directives: HashMap<String, Arc<dyn DirectiveHandler>>,
    pub(crate) authorizer: Arc<dyn Authorizer>,
    pub(crate) listener: Arc<dyn ExecutionListener>,
    pub(crate) services: Arc<dyn ServiceProvider>,
    pub(crate) isolation: IsolationPolicy,
    pub(crate) result_rules: Vec<ResultRule>,
}

pub struct EngineBuilder {
    schema: Schema,
    config: EngineConfig,
    plan_cache: Option<Box<dyn PlanCache>>,
    directives: HashMap<String, Arc<dyn DirectiveHandler>>,
    authorizer: Arc<dyn Authorizer>,
    listener: Arc<dyn ExecutionListener>,
    services: Arc<dyn ServiceProvider>,
}

impl EngineBuilder {
    fn new(schema: Schema) -> Self {
        let mut directives: HashMap<String, Arc<dyn DirectiveHandler>> = HashMap::new();
        directives.insert("skip".into(), Arc::new(SkipDirective));
        directives.insert("include".into(), Arc::new(IncludeDirective));
        EngineBuilder {
            schema,
            config: EngineConfig::default(),
            plan_cache: None,
            directives,
            authorizer: Arc::new(DefaultAuthorizer),
            listener: Arc::new(NoopListener),
            services: Arc::new(ServiceCollection::new()),
        }
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the plan cache built from the configuration.
    #[must_use]
    pub fn plan_cache(mut self, cache: impl PlanCache + 'static) -> Self {
        self.plan_cache = Some(Box::new(cache));
        self
    }

    /// Registers the handler applied to fields carrying `@name`. Handlers of
    /// `@skip` and `@include` can be replaced too.
    #[must_use]
    pub fn directive(mut self, name: impl Into<String>, handler: impl DirectiveHandler + 'static) -> Self {
        self.directives.insert(name.into(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn authorizer(mut self, authorizer: impl Authorizer + 'static) -> Self {
        self.authorizer = Arc::new(authorizer);
        self
    }

    #[must_use]
    pub fn listener(mut self, listener: impl ExecutionListener + 'static) -> Self {
        self.listener = Arc::new(listener);
        self
    }

    /// Services used by requests which don't bring their own.
    #[must_use]
    pub fn services(mut self, services: impl ServiceProvider + 'static) -> Self {
        self.services = Arc::new(services);
        self
    }

    pub fn build(self) -> Engine {
        let plan_cache = self.plan_cache.unwrap_or_else(|| match InMemoryPlanCache::from_config(&self.config.plan_cache) {
            Some(cache) => Box::new(cache),
            None => Box::new(NoPlanCache),
        });
        Engine(Arc::new(EngineInner {
            isolation: IsolationPolicy::new(self.config.resolver_isolation),
            schema: self.schema,
            config: self.config,
            plan_cache,
            directives: self.directives,
            authorizer: self.authorizer,
            listener: self.listener,
            services: self.services,
            result_rules: result_rules(),
        }))
    }
}

impl Engine {
    pub fn builder(schema: Schema) -> EngineBuilder {
        EngineBuilder::new(schema)
    }

    /// An engine with the default configuration.
    pub fn new(schema: Schema) -> Self {
        Self::builder(schema).build()
    }

    pub fn schema(&self) -> &Schema {
        &self.0.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.0.config
    }

    /// Runs a request through the whole pipeline.
    ///
    /// Failures never surface as an error: they are messages of the response,
    /// next to whatever data could be resolved.
    pub async fn execute(&self, request: Request) -> Response {
        let span = tracing::info_span!("request", operation_name = request.operation_name.as_deref());
        self.0.execute(request).instrument(span).await
    }

    /// Plans `queries` ahead of their first request, so they start from the
    /// plan cache. Returns how many plans the cache now holds, none when
    /// caching is disabled.
    pub fn warm<'q>(&self, queries: impl IntoIterator<Item = &'q str>) -> usize {
        tracing::info!("warming operations");
        let mut count = 0;
        for query in queries {
            let base = ContextBase::new(
                &CancellationToken::new(),
                Arc::new(MessageCollection::new()),
                Items::new(),
                Arc::new(NoopListener),
            );
            match self.0.prepare(&base, query, None) {
                Some(plan) if self.0.plan_cache.get(plan.key()).is_some() => count += 1,
                Some(plan) if plan.is_cacheable() => tracing::debug!("plan cache is disabled"),
                Some(_) => tracing::debug!("operation with directives is not cacheable"),
                None => tracing::warn!(errors = base.messages().len(), "could not plan operation"),
            }
        }
        tracing::info!(count, "warming finished");
        count
    }
}

impl EngineInner {
    async fn execute(&self, request: Request) -> Response {
        let started = Instant::now();
        let messages = Arc::new(MessageCollection::new());
        let base = ContextBase::new(
            &request.cancellation,
            Arc::clone(&messages),
            request.items.clone(),
            Arc::clone(&self.listener),
        );
        self.listener.request_started(request.operation_name.as_deref());

        let data = self.run(&base, request).await;

        self.listener.request_completed(&messages, started.elapsed());
        drop(base);
        let messages = Arc::try_unwrap(messages)
            .map(MessageCollection::into_vec)
            .unwrap_or_else(|messages| messages.to_vec());
        Response::new(data, messages, self.config.expose_exceptions)
    }

    /// Data of the response, absent when the request fails before execution.
    async fn run(&self, base: &ContextBase, request: Request) -> Option<serde_json::Value> {
        let Request {
            query,
            operation_name,
            variables,
            identity,
            services,
            ..
        } = request;
        let plan = self.prepare(base, &query, operation_name.as_deref())?;
        if base.is_cancelled() {
            tracing::debug!("request cancelled before execution");
            return None;
        }

        let started = Instant::now();
        let coerced = coerce_variables(&self.schema, plan.variables(), variables);
        base.listener().phase_completed(Phase::VariableCoercion, started.elapsed());
        let variables = match coerced {
            Ok(variables) => variables,
            Err(errors) => {
                tracing::debug!(errors = errors.len(), "variables rejected");
                base.messages().extend(errors.into_iter().map(Message::from));
                return None;
            }
        };

        if plan.operation_type() == OperationType::Subscription {
            base.add_message(Message::critical(
                MessageCode::OperationPlanningError,
                "Subscriptions cannot be executed",
            ));
            return None;
        }

        let query = QueryExecutionContext::new(
            base.derive(),
            self.schema.clone(),
            plan,
            variables,
            identity,
            services.unwrap_or_else(|| Arc::clone(&self.services)),
        );
        Some(self.execute_plan(&query).await)
    }

    /// The plan of the request's operation, from the cache or freshly built.
    /// Construction, validation and planning errors are reported on `base`.
    fn prepare(&self, base: &ContextBase, query: &str, operation_name: Option<&str>) -> Option<Arc<FieldInvocationPlan>> {
        let _span = tracing::debug_span!("prepare").entered();
        let key = PlanCacheKey::new(self.schema.id(), operation_name, query);
        let cached = self.plan_cache.get(&key);
        base.listener().plan_cache_lookup(&key, cached.is_some());
        if let Some(plan) = cached {
            tracing::debug!(plan_id = %plan.id(), "plan cache hit");
            return Some(plan);
        }

        let started = Instant::now();
        let options = ConstructionOptions {
            max_nesting: self.config.construction.max_nesting,
        };
        let document = match Document::parse(query, Arc::clone(base.messages()), &options) {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(error = %err, "document construction failed");
                base.add_message(
                    Message::critical(MessageCode::InternalServerError, err.to_string()).with_exception(Arc::new(err)),
                );
                return None;
            }
        };
        base.listener().phase_completed(Phase::Parse, started.elapsed());
        if !document.is_valid() {
            return None;
        }

        let started = Instant::now();
        let rules = document_rules(&ValidationOptions {
            max_query_depth: self.config.max_query_depth,
        });
        let outcome = validate(&document, &self.schema, &rules, base.messages(), base.cancellation());
        base.listener().phase_completed(Phase::Validation, started.elapsed());
        if outcome == ValidationOutcome::Cancelled || !base.is_valid() {
            return None;
        }

        let started = Instant::now();
        let plan = FieldInvocationPlan::build(&document, &self.schema, operation_name, key);
        base.listener().phase_completed(Phase::Planning, started.elapsed());
        let plan = match plan {
            Ok(plan) => Arc::new(plan),
            Err(err) => {
                base.add_message(Message::critical(MessageCode::OperationPlanningError, err.to_string()));
                return None;
            }
        };
        tracing::debug!(
            plan_id = %plan.id(),
            fields = plan.field_count(),
            cacheable = plan.is_cacheable(),
            "operation planned"
        );
        if plan.is_cacheable() {
            self.plan_cache.insert(plan.key().clone(), Arc::clone(&plan));
        }
        Some(plan)
    }

    async fn execute_plan(&self, query: &QueryExecutionContext) -> serde_json::Value {
        let plan = query.plan();
        let Some(root) = self.schema.root_type(plan.operation_type()) else {
            query.add_message(Message::critical(
                MessageCode::OperationPlanningError,
                format!("Schema is not configured for {} operations", plan.operation_type()),
            ));
            return serde_json::Value::Null;
        };
        let executor = Executor::new(self, query);
        if executor.run_operation_directives() == DirectiveOutcome::Skip {
            tracing::debug!("operation skipped by its directives");
            return serde_json::Value::Object(serde_json::Map::new());
        }
        let Some(host) = self.root_host(query, root) else {
            return serde_json::Value::Null;
        };

        let started = Instant::now();
        let serial = plan.operation_type() == OperationType::Mutation;
        let items = executor
            .resolve_selection(query.base(), plan.root(), root, host, &ResponsePath::root(), serial)
            .instrument(tracing::debug_span!("execution", fields = plan.field_count(), serial))
            .await;
        query.listener().phase_completed(Phase::Execution, started.elapsed());

        if !query.is_cancelled() {
            let started = Instant::now();
            validate_result(
                &items,
                &self.schema,
                &self.result_rules,
                query.messages(),
                query.cancellation(),
            );
            query.listener().phase_completed(Phase::ResultValidation, started.elapsed());
        }
        serde_json::Value::Object(fields_to_json(&items))
    }

    /// Instance the root fields are resolved on: the request's service when
    /// there is one, otherwise a default-constructed instance.
    fn root_host(&self, query: &QueryExecutionContext, root: &ObjectDefinition) -> Option<HostObject> {
        let Some(type_id) = root.host_type else {
            query.add_message(Message::critical(
                MessageCode::InvalidSource,
                format!(r#"Root type "{}" is not backed by a host type"#, root.name),
            ));
            return None;
        };
        if let Some(host) = query.services().get(type_id) {
            return Some(host);
        }
        match self.schema.invocation().construct(type_id, Vec::new()) {
            Ok(instance) => Some(HostInstance::into_object(instance)),
            Err(err) => {
                tracing::warn!(root = %root.name, error = %err, "root type has no service and no constructor");
                query.add_message(
                    Message::critical(
                        MessageCode::InvalidSource,
                        format!(r#"No instance of the root type "{}" is available"#, root.name),
                    )
                    .with_exception(Arc::new(err)),
                );
                None
            }
        }
    }
}
