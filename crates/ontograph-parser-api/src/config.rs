use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for extraction behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Maximum file size to parse (in bytes)
    /// Files larger than this fail with `FileTooLarge`
    pub max_file_size: usize,

    /// Parser timeout per translation unit (None = no timeout)
    #[serde(with = "duration_option")]
    pub timeout_per_file: Option<Duration>,

    /// Parse translation units on a thread pool
    pub parallel: bool,

    /// Number of parallel workers (None = rayon default)
    pub parallel_workers: Option<usize>,

    /// Scan function bodies for call expressions
    pub extract_calls: bool,

    /// Emit UsesType edges for parameters, returns, fields and locals
    pub extract_type_usage: bool,

    /// Keep units whose syntax tree contains error nodes instead of failing them
    pub tolerate_syntax_errors: bool,
}

// Helper module for serializing Duration
mod duration_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => (d.as_millis().min(u64::MAX as u128) as u64).serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: Option<u64> = Option::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            timeout_per_file: Some(Duration::from_secs(30)),
            parallel: true,
            parallel_workers: None,
            extract_calls: true,
            extract_type_usage: true,
            tolerate_syntax_errors: false,
        }
    }
}

impl ExtractConfig {
    /// Declarations and structure only: no body scan, no type usage
    pub fn fast() -> Self {
        Self {
            extract_calls: false,
            extract_type_usage: false,
            ..Default::default()
        }
    }

    /// Every relation the engine knows how to extract
    pub fn comprehensive() -> Self {
        Self {
            extract_calls: true,
            extract_type_usage: true,
            ..Default::default()
        }
    }

    /// Comprehensive extraction that keeps partially broken units
    pub fn tolerant() -> Self {
        Self {
            tolerate_syntax_errors: true,
            ..Self::comprehensive()
        }
    }

    /// Enable parallel parsing
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the worker count of the parse pool
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = Some(workers);
        self
    }

    /// Set maximum file size
    pub fn with_max_file_size(mut self, size: usize) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set or clear the per-unit parser timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout_per_file = timeout;
        self
    }
}
