use std::sync::Arc;

use engine_config::PlanCacheConfig;
use engine_operation::{FieldInvocationPlan, PlanCacheKey};

/// Storage of cacheable plans, shared by concurrent requests.
pub trait PlanCache: Send + Sync {
    fn get(&self, key: &PlanCacheKey) -> Option<Arc<FieldInvocationPlan>>;

    fn insert(&self, key: PlanCacheKey, plan: Arc<FieldInvocationPlan>);
}

/// Bounded in-memory plan cache.
pub struct InMemoryPlanCache {
    inner: mini_moka::sync::Cache<PlanCacheKey, Arc<FieldInvocationPlan>>,
}

impl InMemoryPlanCache {
    pub fn new(limit: u64) -> Self {
        InMemoryPlanCache {
            inner: mini_moka::sync::Cache::builder().max_capacity(limit).build(),
        }
    }

    /// The cache described by `config`, if it is enabled.
    pub fn from_config(config: &PlanCacheConfig) -> Option<Self> {
        config.enabled.then(|| Self::new(config.limit))
    }
}

impl PlanCache for InMemoryPlanCache {
    fn get(&self, key: &PlanCacheKey) -> Option<Arc<FieldInvocationPlan>> {
        self.inner.get(key)
    }

    fn insert(&self, key: PlanCacheKey, plan: Arc<FieldInvocationPlan>) {
        self.inner.insert(key, plan);
    }
}

/// Never keeps anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlanCache;

impl PlanCache for NoPlanCache {
    fn get(&self, _key: &PlanCacheKey) -> Option<Arc<FieldInvocationPlan>> {
        None
    }

    fn insert(&self, _key: PlanCacheKey, _plan: Arc<FieldInvocationPlan>) {}
}

#[cfg(test)]
mod tests {
    use engine_error::MessageCollection;
    use engine_invocation::Member;
    use engine_operation::{ConstructionOptions, Document};
    use engine_schema::{Field, ObjectType, Schema};

    use super::*;

    struct Query;

    fn plan(schema: &Schema, query: &str) -> Arc<FieldInvocationPlan> {
        let document = Document::parse(query, Arc::new(MessageCollection::new()), &ConstructionOptions::default()).unwrap();
        let key = PlanCacheKey::new(schema.id(), None, query);
        Arc::new(FieldInvocationPlan::build(&document, schema, None, key).unwrap())
    }

    #[test]
    fn cached_plans_are_shared() {
        let schema = Schema::build(
            ObjectType::new("Query").field(Field::new("version", "String", Member::property(|_: &Query| "1"))),
        )
        .finish()
        .unwrap();
        let cache = InMemoryPlanCache::new(10);
        let plan = plan(&schema, "{ version }");

        assert!(cache.get(plan.key()).is_none());
        cache.insert(plan.key().clone(), Arc::clone(&plan));
        let cached = cache.get(&PlanCacheKey::new(schema.id(), None, "{ version }")).unwrap();
        assert!(Arc::ptr_eq(&cached, &plan));
        assert!(cache.get(&PlanCacheKey::new(schema.id(), Some("Other"), "{ version }")).is_none());

        NoPlanCache.insert(plan.key().clone(), Arc::clone(&plan));
        assert!(NoPlanCache.get(plan.key()).is_none());
    }

    #[test]
    fn disabled_by_config() {
        assert!(InMemoryPlanCache::from_config(&PlanCacheConfig::default()).is_some());
        let disabled = PlanCacheConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(InMemoryPlanCache::from_config(&disabled).is_none());
    }
}
