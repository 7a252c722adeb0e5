//! Checkpoint and resume functionality for stateful iterators.
//!
//! A checkpoint captures everything about an iterator except its closures:
//! the snapshot, the iteration counter, the finished flag and the collector
//! configuration. Long-running generators can be persisted as JSON or
//! binary and picked up again with
//! [`IteratorBuilder::resume_from`](crate::builder::IteratorBuilder::resume_from).

use crate::collect::CollectorConfig;
use crate::core::{Snapshot, FINISHED_KEY, ITER_KEY};
use crate::iterator::StatefulIterator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable checkpoint of iterator state.
/// Does NOT include the step procedure or yield selector (not serializable).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: String,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    /// Snapshot including the reserved keys
    pub snapshot: Snapshot,

    pub iteration: usize,

    pub finished: bool,

    pub config: CollectorConfig,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Parse a JSON checkpoint and validate it.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode a binary checkpoint and validate it.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.validate()?;
        Ok(checkpoint)
    }

    /// Check the format version, the snapshot keys, and that the snapshot
    /// mirrors agree with the stored counter and flag.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }

        self.snapshot
            .audit()
            .map_err(|e| CheckpointError::ValidationFailed(e.to_string()))?;

        if self.snapshot.iteration() != Some(self.iteration) {
            return Err(CheckpointError::ValidationFailed(format!(
                "'{}' does not match iteration {}",
                ITER_KEY, self.iteration
            )));
        }

        if self.snapshot.is_finished() != Some(self.finished) {
            return Err(CheckpointError::ValidationFailed(format!(
                "'{}' does not match finished flag {}",
                FINISHED_KEY, self.finished
            )));
        }

        self.config
            .validate()
            .map_err(|e| CheckpointError::ValidationFailed(e.to_string()))
    }
}

impl<Y> StatefulIterator<Y> {
    /// Capture the resumable state of this iterator.
    pub fn checkpoint(&self) -> Checkpoint {
        let checkpoint = Checkpoint {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            snapshot: self.snapshot().clone(),
            iteration: self.iteration(),
            finished: self.is_finished(),
            config: self.config().clone(),
        };
        debug!(
            checkpoint = %checkpoint.id,
            iteration = checkpoint.iteration,
            "checkpoint created"
        );
        checkpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Snapshot, Value};
    use crate::iterator::StepOutcome;

    fn doubler() -> StatefulIterator {
        StatefulIterator::new(
            |mut s: Snapshot| {
                s.set("x", &s["x"] * 2)?;
                Ok(s)
            },
            [("x", 1)],
            |s: &Snapshot| s["x"].clone(),
        )
        .unwrap()
    }

    #[test]
    fn checkpoint_captures_state() {
        let mut it = doubler();
        it.move_more(3).unwrap();

        let checkpoint = it.checkpoint();
        assert_eq!(checkpoint.version, CHECKPOINT_VERSION);
        assert_eq!(checkpoint.iteration, 3);
        assert!(!checkpoint.finished);
        assert_eq!(checkpoint.snapshot["x"], Value::Int(8));
        assert!(Uuid::parse_str(&checkpoint.id).is_ok());
    }

    #[test]
    fn checkpoints_get_distinct_ids() {
        let it = doubler();
        assert_ne!(it.checkpoint().id, it.checkpoint().id);
    }

    #[test]
    fn json_round_trip() {
        let mut it = doubler();
        it.move_more(2).unwrap();
        let checkpoint = it.checkpoint();

        let json = checkpoint.to_json().unwrap();
        assert_eq!(Checkpoint::from_json(&json).unwrap(), checkpoint);
    }

    #[test]
    fn binary_round_trip() {
        let mut it = doubler();
        it.move_more(5).unwrap();
        let checkpoint = it.checkpoint();

        let bytes = checkpoint.to_binary().unwrap();
        assert_eq!(Checkpoint::from_binary(&bytes).unwrap(), checkpoint);
    }

    #[test]
    fn finished_state_survives_checkpoint() {
        let mut it = StatefulIterator::with_outcome(
            |_s: Snapshot| Ok(StepOutcome::Exhausted),
            [("x", 0)],
            |s: &Snapshot| s["x"].clone(),
        )
        .unwrap();
        assert_eq!(it.yield_next().unwrap(), None);

        let checkpoint = it.checkpoint();
        assert!(checkpoint.finished);
        assert_eq!(checkpoint.snapshot.is_finished(), Some(true));
        assert!(checkpoint.validate().is_ok());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let mut checkpoint = doubler().checkpoint();
        checkpoint.version = 99;
        assert!(matches!(
            checkpoint.validate(),
            Err(CheckpointError::UnsupportedVersion {
                found: 99,
                supported: CHECKPOINT_VERSION
            })
        ));
    }

    #[test]
    fn mismatched_counter_is_rejected() {
        let mut checkpoint = doubler().checkpoint();
        checkpoint.iteration = 7;
        assert!(matches!(
            checkpoint.validate(),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut checkpoint = doubler().checkpoint();
        checkpoint.config.growth_factor = 0;
        assert!(matches!(
            checkpoint.validate(),
            Err(CheckpointError::ValidationFailed(_))
        ));
    }

    #[test]
    fn injected_reserved_key_is_rejected() {
        let checkpoint = doubler().checkpoint();
        let mut json = serde_json::to_value(&checkpoint).unwrap();
        json["snapshot"][".shadow"] = serde_json::json!({"Int": 1});

        match Checkpoint::from_json(&json.to_string()) {
            Err(CheckpointError::ValidationFailed(message)) => {
                assert!(message.contains("'.shadow' is reserved"));
            }
            other => panic!("Expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn comprehension_checkpoint_passes_validation() {
        let mut it = crate::comprehension::that_for_all(vec![1, 2, 3])
            .we_have(|_: &Value, _: &Value| true)
            .unwrap();
        it.move_more(1).unwrap();
        assert!(it.checkpoint().validate().is_ok());
    }

    #[test]
    fn garbage_input_fails_to_deserialize() {
        assert!(matches!(
            Checkpoint::from_json("{\"version\": 1}"),
            Err(CheckpointError::DeserializationFailed(_))
        ));
        assert!(matches!(
            Checkpoint::from_binary(&[1, 2, 3]),
            Err(CheckpointError::DeserializationFailed(_))
        ));
    }
}
