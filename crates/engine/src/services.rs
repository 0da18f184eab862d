use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::Arc,
};

use engine_invocation::HostObject;

/// Supplies the host objects backing root operation types, scoped to one
/// request.
pub trait ServiceProvider: Send + Sync {
    fn get(&self, type_id: TypeId) -> Option<HostObject>;
}

/// A fixed set of service instances, keyed by their Rust type.
#[derive(Clone, Default)]
pub struct ServiceCollection {
    services: HashMap<TypeId, HostObject>,
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        self.insert_arc(Arc::new(service));
    }

    pub fn insert_arc<T: Any + Send + Sync>(&mut self, service: Arc<T>) {
        self.services.insert(TypeId::of::<T>(), HostObject::from_arc(service));
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceProvider for ServiceCollection {
    fn get(&self, type_id: TypeId) -> Option<HostObject> {
        self.services.get(&type_id).cloned()
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.services.values().map(HostObject::type_name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Clock(u64);

    #[test]
    fn services_are_found_by_type() {
        let services = ServiceCollection::new().with(Clock(7));

        let clock = services.get(TypeId::of::<Clock>()).unwrap();
        assert_eq!(clock.downcast_ref::<Clock>().map(|c| c.0), Some(7));
        assert!(services.get(TypeId::of::<String>()).is_none());
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn shared_instances_stay_shared() {
        let clock = Arc::new(Clock(1));
        let mut services = ServiceCollection::new();
        services.insert_arc(Arc::clone(&clock));

        let found = services.get(TypeId::of::<Clock>()).and_then(|object| object.downcast_arc::<Clock>());
        assert!(found.is_some_and(|found| Arc::ptr_eq(&found, &clock)));
    }
}
