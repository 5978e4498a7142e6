//! Engine settings: base path, list limits, request body limit.

use crate::error::ConfigError;
use crate::query::ListLimits;

pub const DEFAULT_BASE_PATH: &str = "/api/v1";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix every entity route is nested under.
    pub base_path: String,
    /// Applied when a list request has no `limit`. `None` returns every record.
    pub default_limit: Option<u64>,
    /// Upper bound on any list `limit`.
    pub max_limit: Option<u64>,
    pub body_limit_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            base_path: DEFAULT_BASE_PATH.to_string(),
            default_limit: None,
            max_limit: None,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Reads `ENTITY_API_BASE_PATH`, `ENTITY_API_DEFAULT_LIMIT`,
    /// `ENTITY_API_MAX_LIMIT` and `ENTITY_API_BODY_LIMIT`; unset keeps the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();
        if let Some(base) = lookup("ENTITY_API_BASE_PATH") {
            config.base_path = base;
        }
        if let Some(v) = lookup("ENTITY_API_DEFAULT_LIMIT") {
            config.default_limit = Some(parse_env("ENTITY_API_DEFAULT_LIMIT", &v)?);
        }
        if let Some(v) = lookup("ENTITY_API_MAX_LIMIT") {
            config.max_limit = Some(parse_env("ENTITY_API_MAX_LIMIT", &v)?);
        }
        if let Some(v) = lookup("ENTITY_API_BODY_LIMIT") {
            config.body_limit_bytes = parse_env("ENTITY_API_BODY_LIMIT", &v)?;
        }
        Ok(config)
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_default_limit(mut self, limit: Option<u64>) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_max_limit(mut self, limit: Option<u64>) -> Self {
        self.max_limit = limit;
        self
    }

    pub fn limits(&self) -> ListLimits {
        ListLimits {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Load(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<EngineConfig, ConfigError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        EngineConfig::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(from(&[]).unwrap(), EngineConfig::default());
        assert_eq!(EngineConfig::default().base_path, "/api/v1");
    }

    #[test]
    fn reads_overrides() {
        let c = from(&[("ENTITY_API_BASE_PATH", "/v2"), ("ENTITY_API_DEFAULT_LIMIT", "999"), ("ENTITY_API_BODY_LIMIT", "10")])
            .unwrap();
        assert_eq!(c.base_path, "/v2");
        assert_eq!(c.limits(), ListLimits { default_limit: Some(999), max_limit: None });
        assert_eq!(c.body_limit_bytes, 10);
        assert!(matches!(from(&[("ENTITY_API_MAX_LIMIT", "-1")]), Err(ConfigError::Load(_))));
    }
}
