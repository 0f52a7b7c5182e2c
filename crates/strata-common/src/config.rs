//! Engine configuration

use serde::{Deserialize, Serialize};

/// Tuning knobs for statistics construction and chunk instrumentation.
///
/// There is no file or CLI surface behind this; callers construct it and
/// hand it to the statistics builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of ranges a range filter keeps
    pub max_ranges: u32,

    /// Target bin count for equal-distinct-count histograms
    pub histogram_bins: usize,

    /// Number of access-counter snapshots retained per chunk
    pub access_history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_ranges: 10,
            histogram_bins: 100,
            access_history_capacity: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_ranges, 10);
        assert_eq!(config.histogram_bins, 100);
        assert_eq!(config.access_history_capacity, 100);
    }
}
