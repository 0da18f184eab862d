#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanCacheConfig {
    /// If cacheable plans should be kept between requests.
    pub enabled: bool,
    /// The maximum number of plans that can be kept in the cache.
    /// 1000 by default.
    pub limit: u64,
}

impl Default for PlanCacheConfig {
    fn default() -> Self {
        PlanCacheConfig {
            enabled: true,
            limit: 1000,
        }
    }
}
