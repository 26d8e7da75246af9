//! Configuration for tracing behavior.

use std::time::Duration;

/// Configuration options for database span recording.
///
/// # Example
///
/// ```rust
/// use sql_tracing::TracingConfig;
/// use std::time::Duration;
///
/// let config = TracingConfig::default()
///     .with_statement_recording(false)
///     .with_slow_query_threshold(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Whether to tag spans with the raw SQL text under `sql.query`.
    /// Default: `true`
    pub record_statements: bool,

    /// Threshold for logging slow queries at WARN level.
    /// Default: 500ms
    pub slow_query_threshold: Duration,

    /// Database name to tag spans with as `db.name` (useful for
    /// multi-database setups).
    /// Default: `None`
    pub database_name: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            record_statements: true,
            slow_query_threshold: Duration::from_millis(500),
            database_name: None,
        }
    }
}

impl TracingConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable tagging spans with the raw SQL text.
    ///
    /// **Security Warning**: statement text may contain sensitive data;
    /// disable this in environments where queries must not reach the
    /// observability backend.
    pub fn with_statement_recording(mut self, enabled: bool) -> Self {
        self.record_statements = enabled;
        self
    }

    /// Set the threshold for slow query warnings.
    ///
    /// Queries taking longer than this duration are logged at WARN level.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    /// Set a database name to tag spans with.
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TracingConfig::default();
        assert!(config.record_statements);
        assert_eq!(config.slow_query_threshold, Duration::from_millis(500));
        assert_eq!(config.database_name, None);
    }

    #[test]
    fn test_builder() {
        let config = TracingConfig::new()
            .with_statement_recording(false)
            .with_slow_query_threshold(Duration::from_millis(100))
            .with_database_name("orders");

        assert!(!config.record_statements);
        assert_eq!(config.slow_query_threshold, Duration::from_millis(100));
        assert_eq!(config.database_name, Some("orders".to_string()));
    }
}
