use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// How the root picks among children with equal backed-up values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// First maximal child in search order.
    #[default]
    FirstSeen,
    /// Smallest move under the move's `Ord`.
    LowestMove,
    /// Uniform pick among the tied children from a seeded generator.
    Seeded { seed: u64 },
}

impl TieBreak {
    /// Whether the root needs exact values for children that only tie the
    /// best so far.
    pub const fn needs_exact_ties(self) -> bool {
        !matches!(self, Self::FirstSeen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    Identity,
    #[default]
    Heuristic,
    Shuffle { seed: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_depth: u32,
    pub time_limit_ms: Option<u64>,
    pub tie_break: TieBreak,
    pub ordering: OrderingPolicy,
    pub iterative_deepening: bool,
    pub cache_heuristics: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            time_limit_ms: None,
            tie_break: TieBreak::FirstSeen,
            ordering: OrderingPolicy::Heuristic,
            iterative_deepening: true,
            cache_heuristics: true,
        }
    }
}

impl SearchConfig {
    pub fn load_from_json(json_str: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::InvalidConfig {
                message: "max_depth must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_time_limit_ms(mut self, time_limit_ms: Option<u64>) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }

    #[must_use]
    pub fn with_ordering(mut self, ordering: OrderingPolicy) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    #[must_use]
    pub fn with_iterative_deepening(mut self, enabled: bool) -> Self {
        self.iterative_deepening = enabled;
        self
    }

    pub fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.time_limit_ms.map(|ms| start + Duration::from_millis(ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_default() {
        let config = SearchConfig::load_from_json("{}").unwrap();
        assert_eq!(config, SearchConfig::default());
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.ordering, OrderingPolicy::Heuristic);
    }

    #[test]
    fn test_load_config_partial() {
        let json = r#"{
            "max_depth": 7,
            "time_limit_ms": 250
        }"#;
        let config = SearchConfig::load_from_json(json).unwrap();
        assert_eq!(config.max_depth, 7);
        assert_eq!(config.time_limit_ms, Some(250));
        // Others should be default
        assert_eq!(config.tie_break, TieBreak::FirstSeen);
        assert!(config.iterative_deepening);
    }

    #[test]
    fn test_load_config_full() {
        let json = r#"{
            "max_depth": 3,
            "time_limit_ms": null,
            "tie_break": { "seeded": { "seed": 42 } },
            "ordering": { "shuffle": { "seed": 7 } },
            "iterative_deepening": false,
            "cache_heuristics": false
        }"#;
        let config = SearchConfig::load_from_json(json).unwrap();
        assert_eq!(config.tie_break, TieBreak::Seeded { seed: 42 });
        assert_eq!(config.ordering, OrderingPolicy::Shuffle { seed: 7 });
        assert!(!config.iterative_deepening);
        assert!(!config.cache_heuristics);
    }

    #[test]
    fn test_load_config_unit_variants() {
        let json = r#"{ "tie_break": "lowest_move", "ordering": "identity" }"#;
        let config = SearchConfig::load_from_json(json).unwrap();
        assert_eq!(config.tie_break, TieBreak::LowestMove);
        assert_eq!(config.ordering, OrderingPolicy::Identity);
    }

    #[test]
    fn test_load_config_invalid_json() {
        let result = SearchConfig::load_from_json("{ invalid json }");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_zero_depth_rejected() {
        let result = SearchConfig::load_from_json(r#"{ "max_depth": 0 }"#);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_deadline_from() {
        let start = Instant::now();
        let config = SearchConfig::default().with_time_limit_ms(Some(100));
        assert_eq!(
            config.deadline_from(start),
            Some(start + Duration::from_millis(100))
        );
        assert_eq!(SearchConfig::default().deadline_from(start), None);
    }

    #[test]
    fn test_exact_ties() {
        assert!(!TieBreak::FirstSeen.needs_exact_ties());
        assert!(TieBreak::LowestMove.needs_exact_ties());
        assert!(TieBreak::Seeded { seed: 1 }.needs_exact_ties());
    }
}
