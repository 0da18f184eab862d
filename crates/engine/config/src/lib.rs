mod isolation;
mod plan_cache;

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

pub use isolation::ResolverIsolationConfig;
pub use plan_cache::PlanCacheConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read the configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of the query pipeline, loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Deepest field nesting an operation may select, fragments included.
    /// Unlimited when absent.
    pub max_query_depth: Option<usize>,
    /// Which resolvers run under the schema's isolation gate.
    pub resolver_isolation: ResolverIsolationConfig,
    /// Whether unhandled resolver errors keep their text in responses.
    pub expose_exceptions: bool,
    pub plan_cache: PlanCacheConfig,
    pub construction: ConstructionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstructionConfig {
    /// Deepest syntax nesting accepted while building a document.
    pub max_nesting: usize,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        ConstructionConfig { max_nesting: 512 }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }
}

impl FromStr for EngineConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use engine_schema::OriginKind;
    use indoc::indoc;

    use super::*;

    #[test]
    fn defaults() {
        let config: EngineConfig = "".parse().unwrap();

        assert_eq!(config.max_query_depth, None);
        assert!(!config.expose_exceptions);
        assert!(config.plan_cache.enabled);
        assert_eq!(config.plan_cache.limit, 1000);
        assert_eq!(config.construction.max_nesting, 512);
        assert!(!config.resolver_isolation.is_isolated(OriginKind::Property));
        assert!(!config.resolver_isolation.is_isolated(OriginKind::Method));
        assert!(!config.resolver_isolation.is_isolated(OriginKind::Action));
    }

    #[test]
    fn all_values() {
        let input = indoc! {r#"
            max_query_depth = 12
            expose_exceptions = true

            [resolver_isolation]
            actions = true

            [plan_cache]
            enabled = false
            limit = 10

            [construction]
            max_nesting = 64
        "#};

        let config: EngineConfig = input.parse().unwrap();

        assert_eq!(config.max_query_depth, Some(12));
        assert!(config.expose_exceptions);
        assert!(config.resolver_isolation.is_isolated(OriginKind::Action));
        assert!(!config.resolver_isolation.is_isolated(OriginKind::Method));
        assert_eq!(
            config.plan_cache,
            PlanCacheConfig {
                enabled: false,
                limit: 10
            }
        );
        assert_eq!(config.construction.max_nesting, 64);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error = "max_depth = 3".parse::<EngineConfig>().unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().contains("unknown field `max_depth`"), "{error}");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_query_depth = 3").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_query_depth, Some(3));

        let error = EngineConfig::load(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }
}
