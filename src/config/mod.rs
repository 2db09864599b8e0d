use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub query: QueryConfig,
}

/// Storage location configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Query defaults applied when the caller omits parameters
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub default_limit: usize,
    pub default_min_similarity: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage = StorageConfig {
            data_dir: PathBuf::from(
                env::var("DEBUG_GRAPH_DATA_DIR")
                    .unwrap_or_else(|_| "./data/debug-graph".to_string()),
            ),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let default_min_similarity = env::var("DEBUG_GRAPH_MIN_SIMILARITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.3);
        if !(0.0..=1.0).contains(&default_min_similarity) {
            return Err(AppError::Config {
                message: format!(
                    "DEBUG_GRAPH_MIN_SIMILARITY must be within [0, 1], got {}",
                    default_min_similarity
                ),
            });
        }

        let query = QueryConfig {
            default_limit: env::var("DEBUG_GRAPH_QUERY_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            default_min_similarity,
        };

        Ok(Config {
            storage,
            logging,
            query,
        })
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_min_similarity: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("DEBUG_GRAPH_DATA_DIR");
        env::remove_var("DEBUG_GRAPH_QUERY_LIMIT");
        env::remove_var("DEBUG_GRAPH_MIN_SIMILARITY");
        env::remove_var("LOG_LEVEL");
        env::remove_var("LOG_FORMAT");
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("./data/debug-graph"));
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.query.default_limit, 10);
        assert!((config.query.default_min_similarity - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("DEBUG_GRAPH_DATA_DIR", "/tmp/graph");
        env::set_var("DEBUG_GRAPH_QUERY_LIMIT", "25");
        env::set_var("LOG_FORMAT", "json");
        let config = Config::from_env().unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/graph"));
        assert_eq!(config.query.default_limit, 25);
        assert_eq!(config.logging.format, LogFormat::Json);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_min_similarity_out_of_range_is_rejected() {
        clear_env();
        env::set_var("DEBUG_GRAPH_MIN_SIMILARITY", "1.5");
        let result = Config::from_env();
        assert!(matches!(result, Err(AppError::Config { .. })));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back_to_defaults() {
        clear_env();
        env::set_var("DEBUG_GRAPH_QUERY_LIMIT", "lots");
        let config = Config::from_env().unwrap();
        assert_eq!(config.query.default_limit, 10);
        clear_env();
    }
}
