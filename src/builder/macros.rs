//! Macros for ergonomic snapshot construction.

/// Build an initial [`Snapshot`](crate::core::Snapshot) from `key: value`
/// pairs.
///
/// Keys may be identifiers or string literals. Values are anything that
/// converts into a [`Value`](crate::core::Value). The result is a
/// `Result<Snapshot, ConfigError>`, so reserved or duplicate keys are
/// reported rather than silently accepted.
///
/// # Example
///
/// ```
/// use stepwise::{snapshot, Value};
///
/// let state = snapshot! { n: 50, "step size": 2.5, done: false }.unwrap();
/// assert_eq!(state["n"], Value::Int(50));
/// assert_eq!(state["step size"], Value::Float(2.5));
///
/// assert!(snapshot! { n: 1, n: 2 }.is_err());
/// ```
#[macro_export]
macro_rules! snapshot {
    () => {
        $crate::core::Snapshot::from_pairs(
            ::std::vec::Vec::<(::std::string::String, $crate::core::Value)>::new(),
        )
    };
    ($($key:tt : $value:expr),+ $(,)?) => {
        $crate::core::Snapshot::from_pairs(::std::vec![
            $((
                ::std::string::String::from($crate::__snapshot_key!($key)),
                $crate::core::Value::from($value),
            )),+
        ])
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __snapshot_key {
    ($key:ident) => {
        stringify!($key)
    };
    ($key:literal) => {
        $key
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{ConfigError, SnapshotProblem, Value};

    #[test]
    fn snapshot_macro_accepts_idents_and_literals() {
        let state = snapshot! { n: 50, "with space": true }.unwrap();
        assert_eq!(state["n"], Value::Int(50));
        assert_eq!(state["with space"], Value::Bool(true));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn snapshot_macro_allows_trailing_comma() {
        let state = snapshot! {
            a: 1,
            b: vec![1, 2, 3],
        }
        .unwrap();
        assert_eq!(state["b"].as_seq().map(<[Value]>::len), Some(3));
    }

    #[test]
    fn empty_snapshot() {
        let state = snapshot! {}.unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn snapshot_macro_reports_duplicates() {
        let result = snapshot! { n: 1, n: 2 };
        match result {
            Err(ConfigError::InvalidSnapshot { problems }) => {
                assert_eq!(problems, vec![SnapshotProblem::DuplicateKey("n".to_string())]);
            }
            other => panic!("Expected InvalidSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_macro_rejects_reserved_keys() {
        assert!(snapshot! { ".iter": 0 }.is_err());
    }
}
