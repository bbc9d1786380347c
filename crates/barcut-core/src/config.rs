use std::time::Duration;

/// What the optimizer minimizes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    /// Total offcut length over every bar cut
    #[default]
    MinimizeWaste,
    /// Number of bars cut
    MinimizeBars,
}

impl std::str::FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waste" => Ok(Objective::MinimizeWaste),
            "bars" => Ok(Objective::MinimizeBars),
            _ => Err(format!("invalid objective '{}', expected: waste or bars", s)),
        }
    }
}

/// Settings for one optimization run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub objective: Objective,
    /// Wall-clock limit handed to the solver; `None` searches to optimality
    pub time_limit: Option<Duration>,
    /// Branch-and-bound node budget
    pub max_nodes: u64,
    /// Largest pattern count accepted per stock length
    pub max_patterns: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            objective: Objective::MinimizeWaste,
            time_limit: None,
            max_nodes: 100_000,
            max_patterns: 200_000,
        }
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_nodes(mut self, max: u64) -> Self {
        self.max_nodes = max.max(1);
        self
    }

    pub fn with_max_patterns(mut self, max: usize) -> Self {
        self.max_patterns = max.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_from_str() {
        assert_eq!("waste".parse::<Objective>(), Ok(Objective::MinimizeWaste));
        assert_eq!("bars".parse::<Objective>(), Ok(Objective::MinimizeBars));
        assert!("cost".parse::<Objective>().is_err());
    }

    #[test]
    fn test_builder_clamps_limits() {
        let config = OptimizerConfig::new().with_max_nodes(0).with_max_patterns(0);
        assert_eq!(config.max_nodes, 1);
        assert_eq!(config.max_patterns, 1);
        assert_eq!(config.objective, Objective::MinimizeWaste);
    }
}
