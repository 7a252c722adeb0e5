//! End-to-end scenarios through the public API.

use std::thread;
use stepwise::{
    snapshot, that_for_all, Checkpoint, CheckpointError, Condition, EndReason, IterError,
    Snapshot, StatefulIterator, StepOutcome, Value,
};

fn collatz_step(mut s: Snapshot) -> Result<Snapshot, stepwise::StepFailure> {
    let n = &s["n"];
    let next = if (n % 2).eq_to(0).is_true() {
        n / 2
    } else {
        n * 3 + 1
    };
    s.set("n", next)?;
    Ok(s)
}

fn collatz(start: i64) -> StatefulIterator {
    StatefulIterator::new(collatz_step, [("n", start)], |s: &Snapshot| s["n"].clone()).unwrap()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Int).collect()
}

/// Fibonacci as a pair of running values.
fn fibonacci() -> StatefulIterator {
    StatefulIterator::new(
        |s: Snapshot| {
            let next = &s["a"] + &s["b"];
            let b = s["b"].clone();
            Ok(s.with("a", b)?.with("b", next)?)
        },
        snapshot! { a: 0, b: 1 }.unwrap(),
        |s: &Snapshot| s["a"].clone(),
    )
    .unwrap()
}

#[test]
fn collatz_from_fifty_until_one() {
    let mut it = collatz(50);
    let out = it.yield_while(|s: &Snapshot| s["n"].ne_to(1)).unwrap();

    assert_eq!(
        out.values(),
        ints(&[25, 76, 38, 19, 58, 29, 88, 44, 22, 11, 34, 17, 52, 26, 13, 40, 20, 10, 5, 16, 8, 4, 2, 1])
            .as_slice()
    );
    assert_eq!(out.end(), EndReason::ConditionFalse);
    assert_eq!(it.iteration(), 24);
    assert!(!it.is_finished());
}

#[test]
fn counter_resumes_across_calls() {
    let mut it = StatefulIterator::new(
        |mut s: Snapshot| {
            s.set("x", &s["x"] + 1)?;
            Ok(s)
        },
        [("x", 0)],
        |s: &Snapshot| s["x"].clone(),
    )
    .unwrap();

    assert_eq!(it.yield_more(3).unwrap().into_values(), ints(&[1, 2, 3]));
    assert_eq!(it.yield_next().unwrap(), Some(Value::Int(4)));
    assert_eq!(it.yield_more(2).unwrap().into_values(), ints(&[5, 6]));
    assert_eq!(it.iteration(), 6);
}

#[test]
fn fibonacci_through_functional_updates() {
    let mut fib = fibonacci();
    assert_eq!(
        fib.yield_more(10).unwrap().into_values(),
        ints(&[1, 1, 2, 3, 5, 8, 13, 21, 34, 55])
    );
}

#[test]
fn clone_with_override_forks_the_sequence() {
    let mut it = collatz(50);
    it.move_more(3).unwrap();

    let mut forked = it.clone_with([("n", 7)]).unwrap();
    assert_eq!(forked.iteration(), 3);
    assert_eq!(
        forked.yield_more(4).unwrap().into_values(),
        ints(&[22, 11, 34, 17])
    );

    // The source is untouched by the fork.
    assert_eq!(it.yield_next().unwrap(), Some(Value::Int(19)));
}

#[test]
fn clone_with_unknown_keys_reports_all_of_them() {
    let it = collatz(50);
    match it.clone_with([("m", 1), ("k", 2)]) {
        Err(IterError::UnknownKey { keys }) => assert_eq!(keys, vec!["m", "k"]),
        other => panic!("Expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn undefined_condition_stops_with_error() {
    let mut it = collatz(50);
    it.move_more(2).unwrap();

    let err = it
        .yield_while(|s: &Snapshot| s["nonexistent"].greater_than(0))
        .unwrap_err();
    assert!(matches!(err, IterError::UndefinedCondition { iteration: 2 }));
    assert_eq!(it.iteration(), 2);
}

#[test]
fn exhausted_iterator_refuses_more_work_until_cloned() {
    let mut it = StatefulIterator::with_outcome(
        |mut s: Snapshot| {
            if s["left"].at_most(0).is_true() {
                return Ok(StepOutcome::Exhausted);
            }
            s.set("left", &s["left"] - 1)?;
            Ok(s.into())
        },
        [("left", 2)],
        |s: &Snapshot| s["left"].clone(),
    )
    .unwrap();

    let out = it.yield_more(5).unwrap();
    assert_eq!(out.into_values(), ints(&[1, 0]));
    assert!(it.is_finished());

    let err = it.yield_next().unwrap_err();
    assert!(matches!(err, IterError::Exhausted { iterations: 2 }));
    assert!(err.to_string().contains("Clone it to continue"));

    let mut refilled = it.clone_with([("left", 1)]).unwrap();
    assert_eq!(refilled.yield_next().unwrap(), Some(Value::Int(0)));
}

#[test]
fn shared_condition_reused_across_iterators() {
    let not_one = Condition::new(|s: &Snapshot| s["n"].ne_to(1));

    let mut a = collatz(6);
    let mut b = collatz(7);
    let from_six = a.yield_while(not_one.clone()).unwrap();
    let from_seven = b.yield_while(not_one).unwrap();

    assert_eq!(from_six.len(), 8);
    assert_eq!(from_seven.len(), 16);
}

#[test]
fn primes_by_comprehension() {
    let mut primes = that_for_all(2..=30)
        .against(|x: &Value| Value::range(2, x))
        .we_have(|x: &Value, y: &Value| (x % y).ne_to(0))
        .unwrap();

    let out = primes.yield_while(|_: &Snapshot| true).unwrap();
    assert_eq!(
        out.into_values(),
        ints(&[2, 3, 5, 7, 11, 13, 17, 19, 23, 29])
    );
    assert!(primes.is_finished());
}

#[test]
fn checkpoint_json_round_trip_resumes() {
    let mut it = collatz(50);
    it.move_more(10).unwrap();

    let json = it.checkpoint().to_json().unwrap();
    let checkpoint = Checkpoint::from_json(&json).unwrap();

    let mut resumed = StatefulIterator::builder()
        .step(collatz_step)
        .yield_with(|s: &Snapshot| s["n"].clone())
        .resume_from(checkpoint)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(resumed.iteration(), 10);
    assert_eq!(resumed.yield_more(5).unwrap(), it.yield_more(5).unwrap());
}

#[test]
fn resuming_a_finished_checkpoint_stays_finished() {
    let mut it = that_for_all(vec![1, 2])
        .we_have(|_: &Value, _: &Value| true)
        .unwrap();
    it.move_more(5).unwrap();
    assert!(it.is_finished());

    let bytes = it.checkpoint().to_binary().unwrap();
    let mut resumed = StatefulIterator::builder()
        .step(|s: Snapshot| Ok(s))
        .yield_with(|s: &Snapshot| s[".x"].clone())
        .resume_from(Checkpoint::from_binary(&bytes).unwrap())
        .unwrap()
        .build()
        .unwrap();

    assert!(resumed.is_finished());
    assert!(matches!(
        resumed.yield_next(),
        Err(IterError::Exhausted { iterations: 2 })
    ));
}

#[test]
fn tampered_checkpoint_is_rejected() {
    let it = collatz(50);
    let mut checkpoint = it.checkpoint();
    checkpoint.finished = true;

    let json = serde_json::to_string(&checkpoint).unwrap();
    assert!(matches!(
        Checkpoint::from_json(&json),
        Err(CheckpointError::ValidationFailed(_))
    ));
}

#[test]
fn clones_run_on_other_threads() {
    let mut base = collatz(27);
    base.move_more(10).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|offset| {
            let mut fork = base.clone_with([("n", 27 + offset)]).unwrap();
            thread::spawn(move || fork.yield_while(|s: &Snapshot| s["n"].ne_to(1)).unwrap().len())
        })
        .collect();

    let lengths: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(lengths[0], 111);
    assert_eq!(base.iteration(), 10);
}
