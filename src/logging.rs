use std::{collections::HashMap, env, io, sync::Mutex};

use serde_json::{json, Map, Value};
use tokio::{
    sync::oneshot::{self, Receiver, Sender},
    task::JoinHandle,
};
use tracing::{info, info_span, span::EnteredSpan, Span};
use tracing_forest::{processor::from_fn, traits::*, tree::Tree, worker_task};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, Layer, Registry};
use uuid::Uuid;

/// Everything under the `heapview` target is always collected so a
/// `CapturedRun` can be explained after the fact.
const CAPTURE_FILTER: &str = "heapview=trace";

lazy_static! {
    /// Runs that are waiting for their finished tree, keyed by span uuid.
    static ref WAITING_RUNS: Mutex<HashMap<Uuid, Sender<Tree>>> = Mutex::new(HashMap::new());
    static ref FOREST_WORKER: Mutex<Option<JoinHandle<()>>> = Mutex::new(None);
}

/// A root span whose complete tree of nested spans and events is handed back
/// once the run is over.  Requires `init_logging()`; without the forest worker
/// `finish` resolves to `None`.
pub struct CapturedRun {
    span: EnteredSpan,
    rx: Receiver<Tree>,
}

impl CapturedRun {
    pub fn start(name: &str) -> CapturedRun {
        let id = Uuid::new_v4();
        let span = info_span!(parent: None, "captured_run", name, uuid = %id).entered();
        info!("run started");

        let (tx, rx) = oneshot::channel();
        if let Ok(mut waiting) = WAITING_RUNS.lock() {
            waiting.insert(id, tx);
        }
        CapturedRun { span, rx }
    }

    /// Futures must be instrumented with this to land in the tree.
    pub fn span(&self) -> Span {
        Span::clone(&self.span)
    }

    pub async fn finish(self) -> Option<Tree> {
        info!("run finished");
        drop(self.span);
        self.rx.await.ok()
    }

    pub async fn finish_as_json(self) -> Value {
        self.finish()
            .await
            .map_or(Value::Null, |tree| tree_to_json(&tree))
    }
}

/// Spans become `{name, nodes}`; events become an object of their message and
/// fields.
pub fn tree_to_json(tree: &Tree) -> Value {
    match tree {
        Tree::Span(span) => json!({
            "name": span.name(),
            "nodes": span.nodes().iter().map(tree_to_json).collect::<Vec<Value>>(),
        }),
        Tree::Event(event) => {
            let mut obj = Map::new();
            if let Some(msg) = event.message() {
                obj.insert("message".to_string(), json!(msg));
            }
            for field in event.fields() {
                obj.insert(field.key().to_string(), json!(field.value()));
            }
            Value::Object(obj)
        }
    }
}

/// An unset or blank `RUST_LOG` leaves stderr quiet.
fn stderr_log_requested(rust_log: Option<&str>) -> bool {
    rust_log.map_or(false, |value| !value.trim().is_empty())
}

fn stderr_layer() -> Option<Box<dyn Layer<Registry> + Send + Sync>> {
    let rust_log = env::var("RUST_LOG").ok();
    if !stderr_log_requested(rust_log.as_deref()) {
        return None;
    }
    let env_filter = EnvFilter::try_from_default_env().ok()?;
    Some(
        tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
            .compact()
            .with_writer(io::stderr)
            .with_ansi(false)
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    )
}

/// Hand a finished root tree to the `CapturedRun` waiting on it, if any.
fn deliver(tree: Tree) {
    let span = match &tree {
        Tree::Span(span) => span,
        Tree::Event(_) => return,
    };
    let tx = match WAITING_RUNS.lock() {
        Ok(mut waiting) => waiting.remove(&span.uuid()),
        Err(_) => None,
    };
    if let Some(tx) = tx {
        // The run may have been dropped without finishing.
        let _ = tx.send(tree);
    }
}

/// Install tracing-forest as the global subscriber.  Set `RUST_LOG` to also
/// get compact, uncoloured logs on stderr; stdout is left for the output
/// document.
///
/// Must be called from within a tokio runtime.  Only the first call has any
/// effect.
pub fn init_logging() {
    let mut worker = match FOREST_WORKER.lock() {
        Ok(worker) => worker,
        Err(_) => return,
    };
    if worker.is_some() {
        return;
    }

    let mut layers = Vec::new();
    layers.extend(stderr_layer());

    let handle = tokio::spawn(
        worker_task()
            .set_global(true)
            .map_receiver(|_| {
                from_fn(|tree| {
                    deliver(tree);
                    Ok(())
                })
            })
            .build_with(|forest_layer| {
                layers.push(forest_layer.boxed());
                Registry::default()
                    .with(layers)
                    .with(EnvFilter::new(CAPTURE_FILTER))
            })
            .on(async {
                let _ = tokio::signal::ctrl_c().await;
            }),
    );
    *worker = Some(handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_log_requested() {
        assert!(!stderr_log_requested(None));
        assert!(!stderr_log_requested(Some("")));
        assert!(!stderr_log_requested(Some("  ")));
        assert!(stderr_log_requested(Some("heapview=debug")));
    }

    #[tokio::test]
    async fn test_run_without_worker_finishes_empty() {
        // No forest worker is installed here, so nothing ever delivers a tree
        // and the sender is left in the waiting map.  Dropping the map entry
        // makes the receiver resolve.
        let run = CapturedRun::start("unit");
        if let Ok(mut waiting) = WAITING_RUNS.lock() {
            waiting.clear();
        }
        assert_eq!(run.finish_as_json().await, Value::Null);
    }
}
