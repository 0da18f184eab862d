use engine_config::ResolverIsolationConfig;
use engine_schema::{FieldDefinition, Schema};
use tokio::sync::MutexGuard;

/// Decides which resolvers must not run concurrently with any other isolated
/// resolver of the same schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolationPolicy {
    config: ResolverIsolationConfig,
}

impl IsolationPolicy {
    pub fn new(config: ResolverIsolationConfig) -> Self {
        IsolationPolicy { config }
    }

    /// Fields flagged isolated in the schema always are. Others depend on the
    /// kind of member backing them.
    pub fn is_isolated(&self, field: &FieldDefinition) -> bool {
        field.isolated
            || field
                .origin
                .as_ref()
                .is_some_and(|origin| self.config.is_isolated(origin.kind))
    }

    /// Waits for the schema's gate when `field` is isolated. The gate is held
    /// until the returned guard is dropped.
    pub async fn enter<'s>(&self, schema: &'s Schema, field: &FieldDefinition) -> Option<MutexGuard<'s, ()>> {
        if self.is_isolated(field) {
            tracing::trace!(field = %field.name, "waiting for the isolation gate");
            Some(schema.isolation_gate().lock().await)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_invocation::Member;
    use engine_schema::{Field, ObjectType, OriginKind};
    use rstest::rstest;

    use super::*;

    struct Query;

    fn schema() -> Schema {
        Schema::build(
            ObjectType::new("Query")
                .field(Field::new("name", "String", Member::property(|_: &Query| "query")))
                .field(Field::new("slow", "String", Member::property(|_: &Query| "slow")).isolated())
                .field(Field::new(
                    "hello",
                    "String",
                    Member::method0(|_: &Query| Ok::<_, engine_invocation::ResolverError>("hello")),
                )),
        )
        .finish()
        .unwrap()
    }

    #[rstest]
    #[case(ResolverIsolationConfig::default(), [false, true, false])]
    #[case(ResolverIsolationConfig { properties: true, ..Default::default() }, [true, true, false])]
    #[case(ResolverIsolationConfig { actions: true, ..Default::default() }, [false, true, true])]
    #[case(ResolverIsolationConfig { methods: true, ..Default::default() }, [false, true, false])]
    fn fields_and_origins(#[case] config: ResolverIsolationConfig, #[case] expected: [bool; 3]) {
        let schema = schema();
        let policy = IsolationPolicy::new(config);

        let actual = ["name", "slow", "hello"].map(|name| policy.is_isolated(schema.field("Query", name).unwrap()));
        assert_eq!(actual, expected);
        assert_eq!(schema.field("Query", "hello").unwrap().origin.as_ref().unwrap().kind, OriginKind::Action);
    }

    #[tokio::test]
    async fn gate_is_held_by_the_guard() {
        let schema = schema();
        let policy = IsolationPolicy::default();
        let slow = schema.field("Query", "slow").unwrap();

        let guard = policy.enter(&schema, slow).await;
        assert!(guard.is_some());
        assert!(schema.isolation_gate().try_lock().is_err());
        assert!(policy.enter(&schema, schema.field("Query", "name").unwrap()).await.is_none());

        drop(guard);
        assert!(schema.isolation_gate().try_lock().is_ok());
    }
}
