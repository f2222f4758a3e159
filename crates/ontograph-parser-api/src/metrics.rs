use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Metrics collected while parsing translation units
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractMetrics {
    /// Total units attempted
    pub units_attempted: usize,

    /// Units successfully parsed
    pub units_succeeded: usize,

    /// Units that failed parsing
    pub units_failed: usize,

    /// Total time spent parsing
    #[serde(with = "duration_serde")]
    pub total_parse_time: Duration,

    /// Total declaration records produced
    pub total_declarations: usize,

    /// Total symbolic references produced (bases, call sites, local bindings)
    pub total_references: usize,
}

// Helper module for serializing Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_micros().min(u64::MAX as u128) as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_micros(micros))
    }
}

impl ExtractMetrics {
    /// Success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.units_attempted == 0 {
            0.0
        } else {
            self.units_succeeded as f64 / self.units_attempted as f64
        }
    }

    /// Average parse time per successful unit
    pub fn avg_parse_time(&self) -> Duration {
        if self.units_succeeded == 0 {
            Duration::ZERO
        } else {
            self.total_parse_time / self.units_succeeded as u32
        }
    }

    /// Average declarations per successful unit
    pub fn avg_declarations_per_unit(&self) -> f64 {
        if self.units_succeeded == 0 {
            0.0
        } else {
            self.total_declarations as f64 / self.units_succeeded as f64
        }
    }

    /// Merge another metrics object into this one
    pub fn merge(&mut self, other: &ExtractMetrics) {
        self.units_attempted += other.units_attempted;
        self.units_succeeded += other.units_succeeded;
        self.units_failed += other.units_failed;
        self.total_parse_time += other.total_parse_time;
        self.total_declarations += other.total_declarations;
        self.total_references += other.total_references;
    }
}
