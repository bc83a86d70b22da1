//! Property tests for the universal invariants in spec.md §8: the status
//! machine's active/terminal partition, attempt-exhaustion arithmetic,
//! bounded error text, recycle semantics, queue-enqueue idempotency, and the
//! seed-mode rotation's full-cycle guarantee.

use proptest::prelude::*;

use foreman::domain::models::{Task, TaskCreator, TaskStatus, LAST_ERROR_MAX_BYTES};

fn any_status() -> impl Strategy<Value = TaskStatus> {
    prop_oneof![
        Just(TaskStatus::Backlog),
        Just(TaskStatus::Spec),
        Just(TaskStatus::Qa),
        Just(TaskStatus::QaFix),
        Just(TaskStatus::Impl),
        Just(TaskStatus::Retry),
        Just(TaskStatus::Rebase),
        Just(TaskStatus::Done),
        Just(TaskStatus::Merged),
        Just(TaskStatus::Failed),
    ]
}

proptest! {
    /// Every status is active xor terminal; there is no third bucket and no
    /// overlap (the scheduler's dispatch set and the terminal set partition
    /// the whole enum).
    #[test]
    fn prop_active_xor_terminal(status in any_status()) {
        prop_assert_ne!(status.is_active(), status.is_terminal());
    }

    /// `as_str`/`from_str` round-trip for every variant, for any status the
    /// strategy can produce (not just the ones enumerated in the unit test).
    #[test]
    fn prop_status_str_round_trips(status in any_status()) {
        prop_assert_eq!(TaskStatus::from_str(status.as_str()), Some(status));
    }

    /// `from_str` never accepts text that isn't one of the ten canonical
    /// spellings, including near-misses (wrong case, stray whitespace).
    #[test]
    fn prop_from_str_rejects_garbage(s in "[a-zA-Z_ ]{0,12}") {
        if TaskStatus::from_str(&s).is_some() {
            prop_assert!(matches!(
                s.as_str(),
                "backlog" | "spec" | "qa" | "qa_fix" | "impl" | "retry" | "rebase" | "done" | "merged" | "failed"
            ));
        }
    }

    /// `is_exhausted` is exactly the arithmetic comparison it documents,
    /// for any attempt/max pair a recycled or retried task could reach.
    #[test]
    fn prop_is_exhausted_matches_arithmetic(attempt_count in 0u32..50, max_attempts in 0u32..50) {
        let mut task = Task::new("t", "d", "/repo", TaskCreator::Director, "#ch");
        task.attempt_count = attempt_count;
        task.max_attempts = max_attempts;
        prop_assert_eq!(task.is_exhausted(), attempt_count >= max_attempts);
    }

    /// `set_last_error` never persists more than `LAST_ERROR_MAX_BYTES` of
    /// text, for any input length.
    #[test]
    fn prop_set_last_error_is_bounded(err in ".{0,6000}") {
        let mut task = Task::new("t", "d", "/repo", TaskCreator::Director, "#ch");
        task.set_last_error(err);
        let stored = task.last_error.expect("set_last_error always sets Some");
        prop_assert!(stored.len() <= LAST_ERROR_MAX_BYTES);
    }

    /// `recycle` always resets to `backlog` with a zeroed attempt count, an
    /// empty branch, and no resume session, regardless of the state it was
    /// recycled from, while leaving identity (id/title) untouched.
    #[test]
    fn prop_recycle_resets_regardless_of_prior_state(
        status in any_status(),
        attempt_count in 0u32..50,
        branch in "[a-z0-9-]{0,20}",
        has_session in any::<bool>(),
    ) {
        let mut task = Task::new("keep-me", "d", "/repo", TaskCreator::Director, "#ch");
        task.id = 7;
        task.status = status;
        task.attempt_count = attempt_count;
        task.branch = branch;
        task.resume_session_id = has_session.then(|| "sess-1".to_string());

        task.recycle();

        prop_assert_eq!(task.status, TaskStatus::Backlog);
        prop_assert_eq!(task.attempt_count, 0);
        prop_assert!(task.branch.is_empty());
        prop_assert!(task.resume_session_id.is_none());
        prop_assert_eq!(task.id, 7);
        prop_assert_eq!(task.title.as_str(), "keep-me");
    }

    /// The seed-mode rotation formula `(prev + 1) % 5` (spec.md §8 scenario
    /// 5) is a full 5-cycle from any starting point: advancing it five times
    /// always returns to the start, and no intermediate step repeats.
    #[test]
    fn prop_seed_mode_rotation_is_a_five_cycle(start in 0i64..10_000) {
        let mut mode = (start as usize) % 5;
        let origin = mode;
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5 {
            prop_assert!(seen.insert(mode), "rotation repeated {} before completing a full cycle", mode);
            mode = (mode + 1) % 5;
        }
        prop_assert_eq!(mode, origin, "five steps of (prev + 1) % 5 must return to the start");
        prop_assert_eq!(seen.len(), 5, "a full cycle visits all five seed modes");
    }
}

/// Enqueueing the same task repeatedly leaves exactly one `queued` entry for
/// it (spec.md §4.4's invariant that re-dispatch never duplicates queue
/// rows), exercised against the real `SqliteQueueRepository` rather than
/// re-deriving the SQL by hand.
#[test]
fn prop_enqueue_is_idempotent() {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&(1usize..6), |times| {
            rt.block_on(async {
                let store = foreman::Store::connect_memory().await.expect("connect");
                store.migrate().await.expect("migrate");

                let task = Task::new("t", "d", "/repo", TaskCreator::Director, "#ch");
                let task_id = store.tasks.create(&task).await.expect("create task");

                for _ in 0..times {
                    store.queue.enqueue(task_id, "task-branch", "/repo").await.expect("enqueue");
                }

                let queued = store.queue.get_queued("/repo").await.expect("get_queued");
                let matching: Vec<_> = queued.iter().filter(|e| e.task_id == task_id).collect();
                if matching.len() != 1 {
                    return Err(proptest::test_runner::TestCaseError::fail(format!(
                        "expected exactly one queued entry after {times} enqueue calls, found {}",
                        matching.len()
                    )));
                }
                Ok(())
            })
        })
        .unwrap();
}
