//! Counter kept in a durable data store plus a session-scoped task runner.
//!
//! ```text
//! cargo run -p datastore_counter -- inc inc dec
//! cargo run -p datastore_counter -- reset
//! ```
//!
//! `HEARTH_STORAGE_DIR` picks the storage directory; `RUST_LOG=debug` shows
//! every write-through.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use hearth_core::Context;
use hearth_storage::{FileStorage, MemoryStorage, Snapshot, from_snapshot, to_snapshot};
use hearth_store::provider::{create_persistent_data_store, create_persistent_task_runner};
use hearth_store::{PersistOptions, Setter, TaskRegistry};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize, Deserialize, Default, Debug)]
struct Counter {
    count: i64,
}

enum Action {
    Inc,
    Dec,
}

/// Leaves a state that is not a `Counter` untouched; `main` checks the shape
/// with `state_as` before dispatching and reports a mismatch.
fn reduce(state: &Snapshot, action: Action) -> Snapshot {
    let Ok(Counter { count }) = from_snapshot(state) else {
        return state.clone();
    };
    let count = match action {
        Action::Inc => count + 1,
        Action::Dec => count - 1,
    };
    json!({ "count": count })
}

fn storage_dir() -> PathBuf {
    std::env::var_os("HEARTH_STORAGE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("hearth-demo"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let dir = storage_dir();
    let durable = FileStorage::open(&dir)
        .with_context(|| format!("opening storage at {}", dir.display()))?;
    let (data_store, use_data_store) = create_persistent_data_store(
        durable,
        to_snapshot(&Counter::default())?,
        reduce,
        PersistOptions::default(),
    );

    let history = TaskRegistry::builder()
        .task("record", |s: &Snapshot, set: &Setter<Snapshot>, word: Snapshot| {
            let mut log = s["log"].as_array().cloned().unwrap_or_default();
            log.push(word);
            set.set(json!({ "log": log }))
        })
        .build();
    let (task_runner, use_tasks) = create_persistent_task_runner(
        MemoryStorage::new(),
        json!({ "log": [] }),
        history,
        PersistOptions::default(),
    );

    let root = Context::root();
    data_store.mount(&root, |cx| -> anyhow::Result<()> {
        task_runner.mount(cx, |cx| -> anyhow::Result<()> {
            let store = use_data_store.get(cx)?;
            let tasks = use_tasks.get(cx)?;
            log::info!("starting from {} ({:?})", store.state(), store.origin());

            for arg in std::env::args().skip(1) {
                let action = match arg.as_str() {
                    "inc" => Some(Action::Inc),
                    "dec" => Some(Action::Dec),
                    "reset" => None,
                    other => bail!("unknown command `{other}` (expected inc, dec, or reset)"),
                };
                match action {
                    Some(action) => {
                        store.state_as::<Counter>().with_context(|| {
                            format!("stored counter in {} (run `reset`)", dir.display())
                        })?;
                        store.dispatch(action)?;
                    }
                    None => store.reset()?,
                }
                tasks.run_task("record", Snapshot::String(arg))?;
            }

            let counter: Counter = store.state_as()?;
            println!("count = {}", counter.count);
            println!("session log = {}", tasks.state()["log"]);
            Ok(())
        })?
    })??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_store::{PersistentReducerStore, StoreError};

    #[test]
    fn misshaped_counter_is_reported_not_zeroed() {
        let port = MemoryStorage::new();
        port.insert_raw("datastore", r#"{"count":"many"}"#);
        let store = PersistentReducerStore::new(port, "datastore", json!({"count": 0}), reduce).unwrap();

        assert!(matches!(store.state_as::<Counter>(), Err(StoreError::Shape { .. })));
        store.dispatch(Action::Inc).unwrap();
        assert_eq!(store.state(), json!({"count": "many"}));
    }

    #[test]
    fn counter_steps() {
        let next = reduce(&json!({"count": 1}), Action::Dec);
        assert_eq!(next, json!({"count": 0}));
    }
}
