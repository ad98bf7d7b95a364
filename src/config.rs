//! Per-invocation engine configuration.

use serde::{Deserialize, Serialize};

use crate::SnbGraphError;

/// Which shortest-path kernel the engine runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortestPathStrategy {
    /// Pivot-by-pivot relaxation over every vertex.
    Exact,
    /// Fixpoint iteration from a restricted source set.
    #[default]
    Batched,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on fixpoint iterations before `NonConvergence` is raised.
    pub max_iterations: usize,
    pub shortest_path: ShortestPathStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1024,
            shortest_path: ShortestPathStrategy::Batched,
        }
    }
}

impl EngineConfig {
    pub fn from_json(raw: &str) -> Result<Self, SnbGraphError> {
        let config: EngineConfig = serde_json::from_str(raw)
            .map_err(|e| SnbGraphError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SnbGraphError> {
        if self.max_iterations == 0 {
            return Err(SnbGraphError::invalid_config(
                "max_iterations must be positive",
            ));
        }
        Ok(())
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_shortest_path(mut self, strategy: ShortestPathStrategy) -> Self {
        self.shortest_path = strategy;
        self
    }
}

/// Points awarded per reply, like and authored message when ranking posters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub reply: u64,
    pub like: u64,
    pub message: u64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            reply: 2,
            like: 10,
            message: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"shortest_path": "exact"}"#).expect("config");
        assert_eq!(config.max_iterations, 1024);
        assert_eq!(config.shortest_path, ShortestPathStrategy::Exact);
    }

    #[test]
    fn zero_iteration_cap_is_rejected() {
        let err = EngineConfig::from_json(r#"{"max_iterations": 0}"#).unwrap_err();
        assert!(matches!(err, SnbGraphError::InvalidConfig(_)));
    }
}
