//! Resolution of planned fields against host objects.

mod error;

use std::{panic::AssertUnwindSafe, time::Instant};

use async_graphql_parser::types::{BaseType, Type};
use async_graphql_value::ConstValue;
use engine_error::{Message, MessageCode, ResponsePath, SourceOrigin};
use engine_invocation::{HostObject, HostValue, InvocationError, ResolverError};
use engine_operation::FieldInvocationContext;
use engine_schema::{named_type, FieldOrigin, ObjectDefinition, OriginKind, SecurityPolicy};
use futures::{future::BoxFuture, FutureExt};

use crate::{
    context::{
        ContextBase, DirectiveExecutionContext, ExecutionContext, FieldAuthorizationContext, FieldExecutionContext,
        QueryExecutionContext, SchemaItemSecurityChallengeContext,
    },
    engine::EngineInner,
    response::{DataValue, FieldDataItem, FieldStatus, ObjectData},
    DirectiveOutcome,
};

/// Drives the fields of one query. Cheap to copy into every field future.
#[derive(Clone, Copy)]
pub(crate) struct Executor<'a> {
    engine: &'a EngineInner,
    query: &'a QueryExecutionContext,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(engine: &'a EngineInner, query: &'a QueryExecutionContext) -> Self {
        Executor { engine, query }
    }

    /// Resolves `fields` on `host`, an instance of `object`. Fields restricted
    /// to other object types are left out. Sibling fields run concurrently
    /// unless `serial` is set, in which case they run in selection order.
    pub(crate) fn resolve_selection(
        self,
        parent: &ContextBase,
        fields: &'a [FieldInvocationContext],
        object: &'a ObjectDefinition,
        host: HostObject,
        path: &ResponsePath,
        serial: bool,
    ) -> BoxFuture<'a, Vec<FieldDataItem<'a>>> {
        let parent = parent.clone();
        let path = path.clone();
        async move {
            let fields = fields.iter().filter(|field| field.applies_to(&object.name));
            if serial {
                let mut items = Vec::new();
                for field in fields {
                    items.push(self.resolve_field(&parent, field, object, &host, &path).await);
                }
                items
            } else {
                futures::future::join_all(fields.map(|field| self.resolve_field(&parent, field, object, &host, &path)))
                    .await
            }
        }
        .boxed()
    }

    async fn resolve_field(
        self,
        parent: &ContextBase,
        field: &'a FieldInvocationContext,
        object: &'a ObjectDefinition,
        host: &HostObject,
        parent_path: &ResponsePath,
    ) -> FieldDataItem<'a> {
        let started = Instant::now();
        let path = parent_path.child(field.response_key.as_str());
        let item = self.resolve_field_value(parent, field, object, host, path).await;
        parent.listener().field_resolved(&item.path, item.status, started.elapsed());
        item
    }

    async fn resolve_field_value(
        self,
        parent: &ContextBase,
        field: &'a FieldInvocationContext,
        object: &'a ObjectDefinition,
        host: &HostObject,
        path: ResponsePath,
    ) -> FieldDataItem<'a> {
        if parent.is_cancelled() {
            return FieldDataItem::unresolved(field, path, FieldStatus::Cancelled);
        }
        if field.is_typename() {
            let name = ConstValue::String(object.name.clone());
            return FieldDataItem::resolved(field, path, HostValue::Scalar(name.clone()), DataValue::Leaf(name));
        }

        let schema = self.query.schema();
        let Some(definition) = field.definition(schema, &object.name) else {
            parent.add_message(
                Message::critical(
                    MessageCode::InternalServerError,
                    format!(r#"Field "{}" is not defined on "{}""#, field.field_name, object.name),
                )
                .with_origin(SourceOrigin::at(field.origin).with_path(path.clone())),
            );
            return FieldDataItem::unresolved(field, path, FieldStatus::Failed);
        };
        let ctx = FieldExecutionContext::new(parent.derive(), self.query, field, object, definition, path);
        let unresolved = |status| FieldDataItem::unresolved(field, ctx.path().clone(), status);

        if self.run_directives(&ctx) == DirectiveOutcome::Skip {
            return unresolved(FieldStatus::Skipped);
        }
        if let Some(policy) = &definition.security {
            if !self.authorize(&ctx, policy) {
                return unresolved(FieldStatus::Failed);
            }
        }
        let Some(origin) = self.check_source(&ctx, host) else {
            return unresolved(FieldStatus::Failed);
        };

        let gate = tokio::select! {
            biased;
            () = ctx.cancellation().cancelled() => return unresolved(FieldStatus::Cancelled),
            gate = self.engine.isolation.enter(schema, definition) => gate,
        };
        if ctx.is_cancelled() {
            return unresolved(FieldStatus::Cancelled);
        }
        let result = AssertUnwindSafe(invoke(&ctx, origin, host)).catch_unwind().await;
        drop(gate);

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                tracing::debug!(field = %ctx.coordinate(), error = %err, "resolver failed");
                ctx.add_message(error::invocation_message(err, ctx.origin()));
                return unresolved(FieldStatus::Failed);
            }
            Err(payload) => {
                let err = ResolverError::Panicked(error::panic_text(payload));
                tracing::error!(field = %ctx.coordinate(), error = %err, "resolver panicked");
                ctx.add_message(error::invocation_message(err.into(), ctx.origin()));
                return unresolved(FieldStatus::Failed);
            }
        };

        let value = self
            .complete_value(ctx.base(), field, &field.ty, output.clone(), ctx.path().clone())
            .await;
        FieldDataItem::resolved(field, ctx.path().clone(), output, value)
    }

    /// Applies the operation's own directives in order, until one skips the
    /// whole operation.
    pub(crate) fn run_operation_directives(&self) -> DirectiveOutcome {
        let query = self.query;
        for directive in query.plan().directives() {
            let ctx = DirectiveExecutionContext::for_operation(query, directive);
            if self.apply_directive(&ctx) == DirectiveOutcome::Skip {
                return DirectiveOutcome::Skip;
            }
        }
        DirectiveOutcome::Continue
    }

    /// Applies the field's directives in order, until one skips it.
    fn run_directives(&self, ctx: &FieldExecutionContext<'_>) -> DirectiveOutcome {
        for directive in &ctx.field().directives {
            if self.apply_directive(&DirectiveExecutionContext::new(ctx, directive)) == DirectiveOutcome::Skip {
                return DirectiveOutcome::Skip;
            }
        }
        DirectiveOutcome::Continue
    }

    /// Directives without a handler are ignored.
    fn apply_directive(&self, ctx: &DirectiveExecutionContext<'_>) -> DirectiveOutcome {
        match self.engine.directives.get(ctx.name()) {
            Some(handler) => handler.execute(ctx),
            None => {
                tracing::debug!(directive = %ctx.name(), "no handler registered for directive");
                DirectiveOutcome::Continue
            }
        }
    }

    fn authorize(&self, ctx: &FieldExecutionContext<'_>, policy: &SecurityPolicy) -> bool {
        let coordinate = ctx.coordinate();
        let challenge =
            SchemaItemSecurityChallengeContext::new(ctx.base().derive(), coordinate.clone(), policy, ctx.query().identity());
        if !self.engine.authorizer.challenge(&challenge) {
            ctx.add_message(
                Message::critical(
                    MessageCode::Unauthenticated,
                    format!(r#"Field "{coordinate}" requires an authenticated request"#),
                )
                .with_origin(ctx.origin()),
            );
            return false;
        }
        if !self.engine.authorizer.authorize(&FieldAuthorizationContext::new(ctx, policy)) {
            ctx.add_message(
                Message::critical(MessageCode::Unauthorized, format!(r#"Not authorized to access "{coordinate}""#))
                    .with_origin(ctx.origin()),
            );
            return false;
        }
        true
    }

    /// The member backing the field, once the source is known to be one of its
    /// owner's instances.
    fn check_source(&self, ctx: &FieldExecutionContext<'a>, host: &HostObject) -> Option<&'a FieldOrigin> {
        let Some(origin) = &ctx.definition().origin else {
            ctx.add_message(
                Message::critical(
                    MessageCode::InternalServerError,
                    format!(r#"Field "{}" has no resolver"#, ctx.coordinate()),
                )
                .with_origin(ctx.origin()),
            );
            return None;
        };
        if host.type_id() != origin.member.owner {
            ctx.add_message(
                Message::critical(
                    MessageCode::InvalidSource,
                    format!(
                        r#"Field "{}" is resolved by {} but the source is a {}"#,
                        ctx.coordinate(),
                        origin.owner_name,
                        host.type_name()
                    ),
                )
                .with_origin(ctx.origin()),
            );
            return None;
        }
        Some(origin)
    }

    /// Turns a resolver output into the field's value, resolving the selection
    /// of every object in it. Shape mismatches are kept as they are for the
    /// result rules to report.
    fn complete_value(
        self,
        parent: &ContextBase,
        field: &'a FieldInvocationContext,
        ty: &'a Type,
        output: HostValue,
        path: ResponsePath,
    ) -> BoxFuture<'a, DataValue<'a>> {
        let parent = parent.clone();
        async move {
            match output {
                HostValue::Null | HostValue::Scalar(ConstValue::Null) => DataValue::Null,
                HostValue::Scalar(value) => DataValue::Leaf(value),
                HostValue::List(items) => {
                    let item_type = match &ty.base {
                        BaseType::List(item_type) => item_type.as_ref(),
                        BaseType::Named(_) => ty,
                    };
                    let items = items.into_iter().enumerate().map(|(index, item)| {
                        self.complete_value(&parent, field, item_type, item, path.child(index))
                    });
                    DataValue::List(futures::future::join_all(items).await)
                }
                HostValue::Object(host) => self.complete_object(&parent, field, named_type(ty), host, path).await,
            }
        }
        .boxed()
    }

    async fn complete_object(
        self,
        parent: &ContextBase,
        field: &'a FieldInvocationContext,
        expected: &str,
        host: HostObject,
        path: ResponsePath,
    ) -> DataValue<'a> {
        let schema = self.query.schema();
        let object = schema.object_for_host(host.type_id());
        let composite = schema.get_type(expected).is_some_and(|def| def.is_composite());
        let fields = match object {
            Some(object) if composite && schema.is_possible_type(expected, &object.name) => {
                self.resolve_selection(parent, &field.children, object, host.clone(), &path, false)
                    .await
            }
            _ => Vec::new(),
        };
        DataValue::Object(ObjectData {
            object,
            host_type: host.type_name(),
            fields,
        })
    }
}

async fn invoke(
    ctx: &FieldExecutionContext<'_>,
    origin: &FieldOrigin,
    host: &HostObject,
) -> Result<HostValue, InvocationError> {
    let cache = ctx.query().schema().invocation();
    match origin.kind {
        OriginKind::Property => cache.property(&origin.member)?.get(host),
        OriginKind::Method | OriginKind::Action => cache.method(&origin.member)?.invoke(host, ctx.arguments()).await,
    }
}
