//! Carriers of request state through the pipeline stages.
//!
//! Every stage gets its own context, derived from the context of the stage
//! that started it. Derived contexts share the message collection, the items
//! and the listener of their parent. Cancelling a context cancels everything
//! derived from it, never its parent.

mod authorization;
mod directive;
mod field;
mod query;

use std::{
    any::{Any, TypeId},
    sync::Arc,
};

use dashmap::DashMap;
use engine_error::{Message, MessageCollection};
use tokio_util::sync::CancellationToken;

pub use authorization::{FieldAuthorizationContext, SchemaItemSecurityChallengeContext};
pub use directive::DirectiveExecutionContext;
pub use field::FieldExecutionContext;
pub use query::QueryExecutionContext;

use crate::ExecutionListener;

/// User data shared by every stage of a request, keyed by type.
#[derive(Clone, Default)]
pub struct Items(Arc<DashMap<TypeId, Arc<dyn Any + Send + Sync>>>);

impl Items {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&self, value: T) {
        self.0.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let value = Arc::clone(self.0.get(&TypeId::of::<T>())?.value());
        value.downcast().ok()
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.0.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for Items {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Items").field("len", &self.0.len()).finish()
    }
}

/// State every execution context carries.
#[derive(Clone)]
pub struct ContextBase {
    cancellation: CancellationToken,
    messages: Arc<MessageCollection>,
    items: Items,
    listener: Arc<dyn ExecutionListener>,
}

impl ContextBase {
    /// Base of a context at the top of a pipeline. `token` is the caller's
    /// cancellation token.
    pub fn new(
        token: &CancellationToken,
        messages: Arc<MessageCollection>,
        items: Items,
        listener: Arc<dyn ExecutionListener>,
    ) -> Self {
        ContextBase {
            cancellation: token.child_token(),
            messages,
            items,
            listener,
        }
    }

    /// Base of a context derived from this one.
    pub fn derive(&self) -> Self {
        ContextBase {
            cancellation: self.cancellation.child_token(),
            messages: Arc::clone(&self.messages),
            items: self.items.clone(),
            listener: Arc::clone(&self.listener),
        }
    }
}

/// The contract shared by every pipeline stage.
pub trait ExecutionContext {
    fn base(&self) -> &ContextBase;

    /// Cancels this context and the contexts derived from it.
    fn cancel(&self) {
        self.base().cancellation.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.base().cancellation.is_cancelled()
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.base().cancellation
    }

    /// No message reached critical severity so far.
    fn is_valid(&self) -> bool {
        self.base().messages.is_valid()
    }

    fn messages(&self) -> &Arc<MessageCollection> {
        &self.base().messages
    }

    fn add_message(&self, message: Message) {
        self.base().messages.add(message);
    }

    fn items(&self) -> &Items {
        &self.base().items
    }

    fn listener(&self) -> &dyn ExecutionListener {
        self.base().listener.as_ref()
    }
}

impl ExecutionContext for ContextBase {
    fn base(&self) -> &ContextBase {
        self
    }
}
