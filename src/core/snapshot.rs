//! Keyed state records with a fixed key set.
//!
//! A [`Snapshot`] is the complete state of a generator between steps. Its
//! keys are decided when it is built; afterwards values can be rebound but
//! keys can never be added or removed through the public API.

use super::error::{ConfigError, IterError, SnapshotProblem};
use super::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Index;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Iteration counter, maintained by the iterator.
pub const ITER_KEY: &str = ".iter";
/// Finished flag, maintained by the iterator.
pub const FINISHED_KEY: &str = ".finished";
/// Position of the next unexamined source element in a set comprehension.
pub const INDEX_KEY: &str = ".i";
/// Full source sequence of a set comprehension.
pub const SOURCE_KEY: &str = ".x_vector";
/// Current qualifying element of a set comprehension.
pub const ELEMENT_KEY: &str = ".x";
/// User keys may not start with this character.
pub const RESERVED_PREFIX: char = '.';

static MISSING: Value = Value::Missing;

/// Reserved keys the iterator and the comprehension adapter write.
const MAINTAINED_KEYS: [&str; 5] = [ITER_KEY, FINISHED_KEY, INDEX_KEY, SOURCE_KEY, ELEMENT_KEY];

/// Named values making up a generator's state.
///
/// Reading a key that is not present yields [`Value::Missing`], which keeps
/// comparisons three-valued instead of panicking. Writing a key that is not
/// present is an error.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{Snapshot, Value};
///
/// let mut state = Snapshot::from_pairs([("n", 50)]).unwrap();
/// assert_eq!(state["n"], Value::Int(50));
/// assert_eq!(state["missing"], Value::Missing);
///
/// state.set("n", &state["n"] / 2).unwrap();
/// assert_eq!(state["n"], Value::Int(25));
///
/// assert!(state.set("m", 1).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: BTreeMap<String, Value>,
}

fn check_user_key(key: &str) -> Validation<(), NonEmptyVec<SnapshotProblem>> {
    if key.is_empty() {
        Validation::fail(SnapshotProblem::EmptyKey)
    } else if key.starts_with(RESERVED_PREFIX) {
        Validation::fail(SnapshotProblem::ReservedKey(key.to_string()))
    } else {
        Validation::success(())
    }
}

impl Snapshot {
    /// Build a snapshot from user key/value pairs.
    ///
    /// Every problem is reported at once: reserved keys, empty keys and
    /// duplicates all end up in the same [`ConfigError::InvalidSnapshot`].
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::validated(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), Ok(value.into()))),
        )
    }

    fn validated<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, Result<Value, SnapshotProblem>)>,
    {
        let mut checks: Vec<Validation<(), NonEmptyVec<SnapshotProblem>>> = Vec::new();
        let mut values = BTreeMap::new();

        for (key, value) in entries {
            checks.push(check_user_key(&key));
            match value {
                Ok(_) if values.contains_key(&key) => {
                    checks.push(Validation::fail(SnapshotProblem::DuplicateKey(key)));
                }
                Ok(value) => {
                    values.insert(key, value);
                }
                Err(problem) => checks.push(Validation::fail(problem)),
            }
        }

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(Self { values }),
            Validation::Failure(problems) => Err(ConfigError::InvalidSnapshot {
                problems: problems.iter().cloned().collect(),
            }),
        }
    }

    /// Look up a key, distinguishing absent keys from missing values.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Rebind an existing key.
    ///
    /// Fails with [`IterError::UnknownKey`] if the key is not part of the
    /// snapshot.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), IterError> {
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(IterError::UnknownKey {
                keys: vec![key.to_string()],
            }),
        }
    }

    /// Functional form of [`Snapshot::set`].
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Result<Self, IterError> {
        self.set(key, value)?;
        Ok(self)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Keys supplied by the user, without the reserved ones.
    pub fn user_keys(&self) -> impl Iterator<Item = &str> {
        self.keys().filter(|k| !k.starts_with(RESERVED_PREFIX))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iteration counter as mirrored under `.iter`.
    pub fn iteration(&self) -> Option<usize> {
        self.get(ITER_KEY).and_then(Value::as_index)
    }

    /// Finished flag as mirrored under `.finished`.
    pub fn is_finished(&self) -> Option<bool> {
        self.get(FINISHED_KEY).and_then(Value::as_bool)
    }

    /// Re-check the keys of a snapshot that was not built by
    /// [`Snapshot::from_pairs`], such as one read back from a checkpoint.
    ///
    /// User keys get the usual checks, and the only reserved keys allowed
    /// are the ones the iterator maintains itself.
    pub(crate) fn audit(&self) -> Result<(), ConfigError> {
        let checks: Vec<Validation<(), NonEmptyVec<SnapshotProblem>>> = self
            .keys()
            .filter(|key| !MAINTAINED_KEYS.contains(key))
            .map(check_user_key)
            .collect();

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(problems) => Err(ConfigError::InvalidSnapshot {
                problems: problems.iter().cloned().collect(),
            }),
        }
    }

    /// Keys present in `other` but not here, and keys present here but not
    /// in `other`.
    pub(crate) fn key_diff(&self, other: &Snapshot) -> (Vec<String>, Vec<String>) {
        let mine: BTreeSet<&String> = self.values.keys().collect();
        let theirs: BTreeSet<&String> = other.values.keys().collect();
        let added = theirs.difference(&mine).map(|k| k.to_string()).collect();
        let removed = mine.difference(&theirs).map(|k| k.to_string()).collect();
        (added, removed)
    }

    /// Insert or overwrite a reserved key. Only the iterator and the
    /// comprehension adapter maintain these.
    pub(crate) fn put_reserved(&mut self, key: &'static str, value: impl Into<Value>) {
        debug_assert!(key.starts_with(RESERVED_PREFIX));
        self.values.insert(key.to_string(), value.into());
    }
}

impl Index<&str> for Snapshot {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&MISSING)
    }
}

/// Conversion into an initial [`Snapshot`].
///
/// Anything shaped like a key/value mapping qualifies. JSON input is
/// checked at runtime: only objects are mappings, and strings or nested
/// objects are not representable as [`Value`]s.
pub trait IntoSnapshot {
    fn into_snapshot(self) -> Result<Snapshot, ConfigError>;
}

impl IntoSnapshot for Snapshot {
    fn into_snapshot(self) -> Result<Snapshot, ConfigError> {
        Ok(self)
    }
}

impl<K, V, const N: usize> IntoSnapshot for [(K, V); N]
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_snapshot(self) -> Result<Snapshot, ConfigError> {
        Snapshot::from_pairs(self)
    }
}

impl<K, V> IntoSnapshot for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_snapshot(self) -> Result<Snapshot, ConfigError> {
        Snapshot::from_pairs(self)
    }
}

impl<V: Into<Value>> IntoSnapshot for BTreeMap<String, V> {
    fn into_snapshot(self) -> Result<Snapshot, ConfigError> {
        Snapshot::from_pairs(self)
    }
}

impl<V: Into<Value>> IntoSnapshot for HashMap<String, V> {
    fn into_snapshot(self) -> Result<Snapshot, ConfigError> {
        Snapshot::from_pairs(self)
    }
}

impl IntoSnapshot for serde_json::Value {
    fn into_snapshot(self) -> Result<Snapshot, ConfigError> {
        match self {
            serde_json::Value::Object(map) => Snapshot::validated(map.into_iter().map(|(key, json)| {
                let value = value_from_json(&json).ok_or_else(|| SnapshotProblem::UnsupportedValue {
                    key: key.clone(),
                    found: json_kind(&json).to_string(),
                });
                (key, value)
            })),
            other => Err(ConfigError::NotAMapping {
                found: json_kind(&other).to_string(),
            }),
        }
    }
}

fn value_from_json(json: &serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Null => Some(Value::Missing),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_f64().map(Value::Float)),
        serde_json::Value::Array(items) => items.iter().map(value_from_json).collect::<Option<Vec<_>>>().map(Value::Seq),
        serde_json::Value::String(_) | serde_json::Value::Object(_) => None,
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
