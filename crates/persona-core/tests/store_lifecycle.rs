use persona_core::model::{ExperimentSpec, OceanProfile, Response, ResultRecord, TestStatus};
use persona_core::storage::Store;
use std::collections::BTreeMap;
use tempfile::tempdir;

fn spec(providers: &[&str]) -> ExperimentSpec {
    ExperimentSpec {
        name: "exp".into(),
        description: "store lifecycle tests".into(),
        profile_set: "test_set".into(),
        input_systems: vec!["ocean_direct".into()],
        instruments: vec!["gad7".into()],
        providers: providers.iter().map(|s| s.to_string()).collect(),
        is_longitudinal: false,
    }
}

fn profiles(n: usize) -> Vec<OceanProfile> {
    (0..n)
        .map(|i| OceanProfile::new(50, 50, 50, 50, (i * 10) as u8))
        .collect()
}

#[test]
fn create_experiment_builds_cartesian_product() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;

    let spec = ExperimentSpec {
        input_systems: vec!["ocean_direct".into(), "narrative".into()],
        ..spec(&["mock", "claude"])
    };
    let id = store.create_experiment(&spec, &profiles(3))?;

    let counts = store.status_counts(Some(id))?;
    // 2 input systems x 1 instrument x 2 providers x 3 profiles
    assert_eq!(counts.total, 12);
    assert_eq!(counts.pending, 12);
    assert_eq!(counts.complete, 0);

    let status = store.experiment_status(id)?.unwrap();
    assert_eq!(status.experiment_number, 1);
    assert!(!status.is_longitudinal);
    Ok(())
}

#[test]
fn create_experiment_requires_description() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    let bad = ExperimentSpec {
        description: String::new(),
        ..spec(&["mock"])
    };
    assert!(store.create_experiment(&bad, &profiles(1)).is_err());
    Ok(())
}

#[test]
fn claim_flips_to_locked_and_stamps_worker() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.create_experiment(&spec(&["mock"]), &profiles(1))?;

    let tc = store.claim("mock", None, "w1")?.expect("one pending row");
    assert_eq!(tc.status, TestStatus::Locked);
    assert_eq!(tc.worker_id.as_deref(), Some("w1"));
    assert!(tc.locked_at.is_some());
    assert_eq!(tc.attempts, 0);

    // Nothing left for this provider, and other providers see nothing.
    assert!(store.claim("mock", None, "w2")?.is_none());
    assert!(store.claim("claude", None, "w2")?.is_none());
    Ok(())
}

#[test]
fn claim_respects_provider_and_experiment_filters() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    let first = store.create_experiment(&spec(&["mock"]), &profiles(1))?;
    let second = store.create_experiment(&spec(&["mock"]), &profiles(1))?;

    let tc = store.claim("mock", Some(second), "w1")?.unwrap();
    assert_eq!(tc.experiment_id, second);

    let tc = store.claim("mock", Some(first), "w1")?.unwrap();
    assert_eq!(tc.experiment_id, first);
    Ok(())
}

#[test]
fn concurrent_claims_never_double_claim() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("queue.db");

    {
        let store = Store::open(&path)?;
        store.init_schema()?;
        store.create_experiment(&spec(&["mock"]), &profiles(8))?;
    }

    let mut handles = Vec::new();
    for worker in 0..4 {
        let path = path.clone();
        handles.push(std::thread::spawn(move || -> anyhow::Result<Vec<i64>> {
            let store = Store::open(&path)?;
            let worker_id = format!("w{worker}");
            let mut claimed = Vec::new();
            while let Some(tc) = store.claim("mock", None, &worker_id)? {
                claimed.push(tc.id);
            }
            Ok(claimed)
        }));
    }

    let mut all: Vec<i64> = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap()?);
    }

    all.sort_unstable();
    let before_dedup = all.len();
    all.dedup();
    assert_eq!(before_dedup, all.len(), "a row was claimed twice");
    assert_eq!(all.len(), 8, "every row claimed exactly once");
    Ok(())
}

#[test]
fn single_row_is_won_by_exactly_one_claimant() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("single.db");
    {
        let store = Store::open(&path)?;
        store.init_schema()?;
        store.create_experiment(&spec(&["mock"]), &profiles(1))?;
    }

    let spawn = |name: &str| {
        let path = path.clone();
        let name = name.to_string();
        std::thread::spawn(move || -> anyhow::Result<bool> {
            let store = Store::open(&path)?;
            Ok(store.claim("mock", None, &name)?.is_some())
        })
    };
    let a = spawn("a");
    let b = spawn("b");
    let won_a = a.join().unwrap()?;
    let won_b = b.join().unwrap()?;
    assert!(won_a ^ won_b, "exactly one caller receives the row");
    Ok(())
}

#[test]
fn retry_bound_fails_exactly_after_third_attempt() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.create_experiment(&spec(&["mock"]), &profiles(1))?;

    let id = {
        let tc = store.claim("mock", None, "w1")?.unwrap();
        tc.id
    };

    // pending -> locked -> running -> retry, twice
    for attempt in 1..=2u32 {
        store.start(id, "prompt")?;
        let tc = store.test_case(id)?.unwrap();
        assert_eq!(tc.status, TestStatus::Running);
        assert_eq!(tc.attempts, attempt);

        store.fail(id, "timeout", true)?;
        let tc = store.test_case(id)?.unwrap();
        assert_eq!(tc.status, TestStatus::Retry, "attempt {attempt} should requeue");
        assert!(tc.worker_id.is_none(), "lock fields cleared on retry");
        assert!(tc.locked_at.is_none());

        // eligible for reclaim by any worker
        assert!(store.claim("mock", None, "w2")?.is_some());
    }

    // third failure is terminal
    store.start(id, "prompt")?;
    store.fail(id, "timeout", true)?;
    let tc = store.test_case(id)?.unwrap();
    assert_eq!(tc.status, TestStatus::Failed);
    assert_eq!(tc.attempts, 3);

    // terminal rows are never re-claimed
    assert!(store.claim("mock", None, "w1")?.is_none());
    Ok(())
}

#[test]
fn non_retryable_failure_is_immediately_terminal() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.create_experiment(&spec(&["mock"]), &profiles(1))?;

    let tc = store.claim("mock", None, "w1")?.unwrap();
    store.start(tc.id, "prompt")?;
    store.fail(tc.id, "unknown instrument: rorschach", false)?;

    let tc = store.test_case(tc.id)?.unwrap();
    assert_eq!(tc.status, TestStatus::Failed);
    assert_eq!(tc.attempts, 1);
    Ok(())
}

#[test]
fn complete_with_result_is_atomic_and_terminal() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.create_experiment(&spec(&["mock"]), &profiles(1))?;

    let tc = store.claim("mock", None, "w1")?.unwrap();
    store.start(tc.id, "prompt")?;

    store.insert_response(&Response {
        test_case_id: tc.id,
        question_number: 1,
        question_text: "Trouble relaxing".into(),
        factor: "anxiety".into(),
        is_reversed: false,
        raw_response: "4".into(),
        parsed_score: 4,
        score_after_reverse: 4,
        response_time_ms: Some(120),
        sequence_position: None,
        context_tokens: None,
    })?;

    // responses never move the status
    assert_eq!(store.test_case(tc.id)?.unwrap().status, TestStatus::Running);

    store.complete_with_result(
        tc.id,
        &ResultRecord {
            test_case_id: tc.id,
            total_score: 66.7,
            factor_scores: BTreeMap::from([("anxiety".to_string(), 66.7)]),
            questions_answered: 7,
            questions_total: 7,
            duration_ms: 900,
        },
    )?;

    let tc = store.test_case(tc.id)?.unwrap();
    assert_eq!(tc.status, TestStatus::Complete);
    assert!(store.claim("mock", None, "w1")?.is_none());

    let counts = store.status_counts(None)?;
    assert_eq!(counts.complete, 1);

    // a second result for the same test case violates UNIQUE
    assert!(store
        .complete_with_result(
            tc.id,
            &ResultRecord {
                test_case_id: tc.id,
                total_score: 0.0,
                factor_scores: BTreeMap::new(),
                questions_answered: 0,
                questions_total: 7,
                duration_ms: 0,
            },
        )
        .is_err());
    Ok(())
}

#[test]
fn providers_with_pending_drives_the_worker_loop() -> anyhow::Result<()> {
    let store = Store::memory()?;
    store.init_schema()?;
    store.create_experiment(&spec(&["mock", "claude"]), &profiles(1))?;

    assert_eq!(store.providers_with_pending(None)?, vec!["claude", "mock"]);
    assert_eq!(store.pending_count("mock")?, 1);

    let tc = store.claim("claude", None, "w1")?.unwrap();
    store.start(tc.id, "p")?;
    store.fail(tc.id, "nope", false)?;

    assert_eq!(store.providers_with_pending(None)?, vec!["mock"]);
    Ok(())
}
