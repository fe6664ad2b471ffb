//! Pipeline configuration
//!
//! Stage addresses, call timeout, and the driver's retry policy are
//! gathered into one explicit structure, constructed once at startup
//! (defaults, then an optional TOML file) and passed into the transport
//! adapter constructors. Nothing in the core reads environment or global
//! state directly.

use crate::error::{Error, Result};
use crate::model::StageName;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Network location of one stage service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEndpoint {
    pub host: String,
    pub port: u16,
}

impl StageEndpoint {
    /// Loopback endpoint on the stage's default port
    pub fn local(stage: StageName) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: stage.default_port(),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Bounded retry-with-backoff policy, applied at the driver boundary only
/// and only to transient transport failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    500
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// Full pipeline configuration used by the driver and the stage services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_counting")]
    pub counting: StageEndpoint,
    #[serde(default = "default_user_behavior")]
    pub user_behavior: StageEndpoint,
    #[serde(default = "default_genre_analysis")]
    pub genre_analysis: StageEndpoint,
    #[serde(default = "default_recommendation")]
    pub recommendation: StageEndpoint,

    /// Fixed per-call timeout applied by every remote binding, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_counting() -> StageEndpoint {
    StageEndpoint::local(StageName::Counting)
}

fn default_user_behavior() -> StageEndpoint {
    StageEndpoint::local(StageName::UserBehavior)
}

fn default_genre_analysis() -> StageEndpoint {
    StageEndpoint::local(StageName::GenreAnalysis)
}

fn default_recommendation() -> StageEndpoint {
    StageEndpoint::local(StageName::Recommendation)
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            counting: default_counting(),
            user_behavior: default_user_behavior(),
            genre_analysis: default_genre_analysis(),
            recommendation: default_recommendation(),
            timeout_secs: default_timeout_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn endpoint(&self, stage: StageName) -> &StageEndpoint {
        match stage {
            StageName::Counting => &self.counting,
            StageName::UserBehavior => &self.user_behavior,
            StageName::GenreAnalysis => &self.genre_analysis,
            StageName::Recommendation => &self.recommendation,
        }
    }

    /// Parse a TOML config file; missing keys fall back to defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), "loaded pipeline config");
        Ok(config)
    }

    /// Load from a file when one is given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ports_match_stage_defaults() {
        let config = PipelineConfig::default();
        for stage in StageName::ALL {
            assert_eq!(config.endpoint(stage).port, stage.default_port());
        }
        assert_eq!(config.counting.base_url(), "http://127.0.0.1:5001");
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            timeout_secs = 5

            [counting]
            host = "counting.internal"
            port = 9001
        "#;
        let config: PipelineConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.counting.host, "counting.internal");
        assert_eq!(config.counting.port, 9001);
        assert_eq!(config.timeout_secs, 5);
        // untouched sections keep defaults
        assert_eq!(config.recommendation.port, 5007);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let result = PipelineConfig::from_toml_file(Path::new("/nonexistent/playline.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
