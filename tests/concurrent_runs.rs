//! Many independent runs sharing one engine and one log.

use statewright::engine::{RunOptions, WorkflowEngine, WorkflowError};
use statewright::lifecycle::{register_product_lifecycle, RecyclePolicy, PRODUCER};
use statewright::log::{FileTransitionLog, MemoryTransitionLog, TransitionLog};
use statewright::registry::StateRegistry;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

fn shared_engine(
    policy: RecyclePolicy,
    log: Arc<dyn TransitionLog<String>>,
) -> Arc<WorkflowEngine<String>> {
    let registry = Arc::new(StateRegistry::<String>::new());
    register_product_lifecycle(&registry, policy);
    Arc::new(WorkflowEngine::new(registry, log))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_runs_keep_separate_histories() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(FileTransitionLog::new(dir.path()).unwrap());
    let engine = shared_engine(RecyclePolicy::EndOfLife, log.clone());

    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::task::spawn_blocking(move || {
            engine.start(PRODUCER, format!("item-{}", i))
        }));
    }

    let mut run_ids = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(result.is_completed());
        assert_eq!(result.steps(), 3);

        let replayed = engine.replay(result.run_id).unwrap();
        assert_eq!(replayed, result.history);
        assert!(replayed
            .records()
            .iter()
            .all(|r| r.payload == result.payload && r.run_id == result.run_id));

        run_ids.insert(result.run_id);
    }

    assert_eq!(run_ids.len(), 16);
    let journal = fs::read_to_string(log.journal_path()).unwrap();
    assert_eq!(journal.lines().count(), 16 * 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cycling_runs_abort_independently() {
    let log = Arc::new(MemoryTransitionLog::<String>::new());
    let engine = shared_engine(RecyclePolicy::Recirculate, log.clone());

    let mut handles = Vec::new();
    for max_steps in 1..=8usize {
        let engine = Arc::clone(&engine);
        handles.push(tokio::task::spawn_blocking(move || {
            let options = RunOptions::new().max_steps(max_steps);
            (max_steps, engine.start_with(PRODUCER, "crate".to_string(), options))
        }));
    }

    for handle in handles {
        let (max_steps, result) = handle.await.unwrap();
        assert_eq!(
            result.error(),
            Some(&WorkflowError::CycleLimitExceeded { max_steps })
        );
        assert_eq!(log.read(result.run_id).unwrap().len(), max_steps);
    }

    assert_eq!(log.total_records(), (1..=8).sum::<usize>());
}

#[test]
fn spawned_threads_share_the_engine() {
    let log = Arc::new(MemoryTransitionLog::<String>::new());
    let engine = shared_engine(RecyclePolicy::EndOfLife, log.clone());

    let handles: Vec<_> = (0..4)
        .map(|i| engine.spawn(PRODUCER, format!("pallet-{}", i), RunOptions::new()))
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_completed());
    }
    assert_eq!(log.run_ids().len(), 4);
}
