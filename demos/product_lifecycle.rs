//! Product Lifecycle
//!
//! Channels products through Producer -> Retailer -> Consumer -> Recycler
//! with a file-backed transition log, then shows a recirculating product
//! hitting the step bound and being resumed from a checkpoint.
//!
//! Run with: cargo run --example product_lifecycle
//! Set RUST_LOG=statewright=debug to see every recorded transition.

use statewright::engine::{RunOptions, RunResult};
use statewright::lifecycle::{
    narrate_transition, register_product_lifecycle, RecyclePolicy, PRODUCER,
};
use statewright::log::FileTransitionLog;
use statewright::registry::StateRegistry;
use statewright::{RunCheckpoint, State, WorkflowEngine};
use std::error::Error;
use std::fs;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn narrate(result: &RunResult<String>) {
    for record in result.history.records() {
        println!(
            "  {}",
            narrate_transition(&record.from, &record.to, &record.payload)
        );
    }
    println!(
        "  => {} after {} step(s), ending at {}",
        result.status.name(),
        result.steps(),
        result.final_state
    );
    if let Some(err) = result.error() {
        println!("     reason: {}", err);
    }
    println!();
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statewright=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    println!("=== Product Lifecycle ===\n");

    let log_dir = std::env::temp_dir().join("statewright-product-lifecycle");
    let log = Arc::new(FileTransitionLog::new(&log_dir)?.with_journal_format(narrate_transition));
    println!("Transition log: {}\n", log_dir.display());

    // Scenario 1: the Recycler ends the product's life
    println!("1. End of life");
    let end_of_life = Arc::new(StateRegistry::<String>::new());
    register_product_lifecycle(&end_of_life, RecyclePolicy::EndOfLife);
    let engine = WorkflowEngine::new(end_of_life, log.clone());

    let result = engine.start(PRODUCER, "glass bottle".to_string());
    narrate(&result);

    let replayed = engine.replay(result.run_id)?;
    println!("   Replayed {} record(s) from disk\n", replayed.len());

    // Scenario 2: the Recycler feeds products back to the Producer
    println!("2. Recirculation with a step bound of 10");
    let recirculate = Arc::new(StateRegistry::<String>::new());
    register_product_lifecycle(&recirculate, RecyclePolicy::Recirculate);
    let engine = WorkflowEngine::new(recirculate, log.clone());

    let result = engine.start_with(
        PRODUCER,
        "aluminium can".to_string(),
        RunOptions::new().max_steps(10),
    );
    narrate(&result);

    // Scenario 3: checkpoint the aborted run and finish it under end-of-life rules
    println!("3. Resume from checkpoint");
    let checkpoint_path = log_dir.join(format!("checkpoint-{}.json", result.run_id));
    let temp_path = checkpoint_path.with_extension("json.tmp");
    fs::write(&temp_path, result.checkpoint().to_json()?)?;
    fs::rename(&temp_path, &checkpoint_path)?;
    println!("   Saved {}", checkpoint_path.display());

    let checkpoint = RunCheckpoint::<String>::from_json(&fs::read_to_string(&checkpoint_path)?)?;
    register_product_lifecycle(engine.registry(), RecyclePolicy::EndOfLife);
    let resumed = engine.resume(&checkpoint, RunOptions::new())?;
    narrate(&resumed);

    println!("Journal: {}", log.journal_path().display());
    Ok(())
}
