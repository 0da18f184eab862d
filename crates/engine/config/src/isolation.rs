use engine_schema::OriginKind;

/// Field origins whose resolvers always run under the isolation gate. Fields
/// marked isolated in the schema are isolated regardless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverIsolationConfig {
    pub properties: bool,
    pub methods: bool,
    pub actions: bool,
}

impl ResolverIsolationConfig {
    pub fn is_isolated(&self, kind: OriginKind) -> bool {
        match kind {
            OriginKind::Property => self.properties,
            OriginKind::Method => self.methods,
            OriginKind::Action => self.actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("properties = true", OriginKind::Property)]
    #[case("methods = true", OriginKind::Method)]
    #[case("actions = true", OriginKind::Action)]
    fn one_origin_kind(#[case] input: &str, #[case] isolated: OriginKind) {
        let config: ResolverIsolationConfig = toml::from_str(input).unwrap();

        for kind in [OriginKind::Property, OriginKind::Method, OriginKind::Action] {
            assert_eq!(config.is_isolated(kind), kind == isolated, "{kind}");
        }
    }
}
