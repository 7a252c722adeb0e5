//! Collector configuration.

use crate::core::{CollectorProblem, ConfigError};
use serde::{Deserialize, Serialize};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Initial buffer capacity used by bulk operations.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Capacity multiplier applied whenever the buffer fills up.
pub const DEFAULT_GROWTH_FACTOR: usize = 2;

/// Largest accepted initial capacity.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 16;

/// Largest accepted growth factor.
pub const MAX_GROWTH_FACTOR: usize = 16;

/// Buffer settings for `yield_more` / `yield_while`.
///
/// Missing fields fall back to their defaults when deserializing, so a
/// partial JSON document is enough.
///
/// ```rust
/// use stepwise::CollectorConfig;
///
/// let config = CollectorConfig::from_json(r#"{"initial_capacity": 64}"#).unwrap();
/// assert_eq!(config.initial_capacity, 64);
/// assert_eq!(config.growth_factor, 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub initial_capacity: usize,
    pub growth_factor: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl CollectorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Unreadable(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut checks: Vec<Validation<(), NonEmptyVec<CollectorProblem>>> = Vec::new();

        checks.push(match self.initial_capacity {
            0 => Validation::fail(CollectorProblem::ZeroCapacity),
            found if found > MAX_INITIAL_CAPACITY => {
                Validation::fail(CollectorProblem::CapacityTooLarge {
                    found,
                    max: MAX_INITIAL_CAPACITY,
                })
            }
            _ => Validation::success(()),
        });

        checks.push(match self.growth_factor {
            found if found < 2 => Validation::fail(CollectorProblem::GrowthFactorTooSmall(found)),
            found if found > MAX_GROWTH_FACTOR => {
                Validation::fail(CollectorProblem::GrowthFactorTooLarge {
                    found,
                    max: MAX_GROWTH_FACTOR,
                })
            }
            _ => Validation::success(()),
        });

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(problems) => Err(ConfigError::InvalidCollector {
                problems: problems.iter().cloned().collect(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(CollectorConfig::default().validate().is_ok());
    }

    #[test]
    fn validation_accumulates_all_problems() {
        let config = CollectorConfig {
            initial_capacity: 0,
            growth_factor: 1,
        };

        match config.validate() {
            Err(ConfigError::InvalidCollector { problems }) => {
                assert_eq!(problems.len(), 2);
                assert!(problems.contains(&CollectorProblem::ZeroCapacity));
                assert!(problems.contains(&CollectorProblem::GrowthFactorTooSmall(1)));
            }
            other => panic!("Expected InvalidCollector, got {other:?}"),
        }
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = CollectorConfig::from_json("{}").unwrap();
        assert_eq!(config, CollectorConfig::default());
    }

    #[test]
    fn from_json_rejects_invalid_values() {
        let result = CollectorConfig::from_json(r#"{"growth_factor": 0}"#);
        assert!(matches!(result, Err(ConfigError::InvalidCollector { .. })));
    }

    #[test]
    fn oversized_settings_are_rejected() {
        let result = CollectorConfig::from_json(
            r#"{"initial_capacity": 1000000000000000000, "growth_factor": 1000000000000000000}"#,
        );

        match result {
            Err(ConfigError::InvalidCollector { problems }) => {
                assert_eq!(
                    problems,
                    vec![
                        CollectorProblem::CapacityTooLarge {
                            found: 1_000_000_000_000_000_000,
                            max: MAX_INITIAL_CAPACITY,
                        },
                        CollectorProblem::GrowthFactorTooLarge {
                            found: 1_000_000_000_000_000_000,
                            max: MAX_GROWTH_FACTOR,
                        },
                    ]
                );
            }
            other => panic!("Expected InvalidCollector, got {other:?}"),
        }
    }

    #[test]
    fn upper_bounds_are_inclusive() {
        let config = CollectorConfig {
            initial_capacity: MAX_INITIAL_CAPACITY,
            growth_factor: MAX_GROWTH_FACTOR,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        let result = CollectorConfig::from_json("not json");
        assert!(matches!(result, Err(ConfigError::Unreadable(_))));
    }
}
