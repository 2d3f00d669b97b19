use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::eval::Evaluator;
use crate::foundation::error::{KakijunError, KakijunResult};
use crate::graph::{Graph, NodeId};
use crate::svg::Artifact;

use super::{Executor, ExecutorSettings, panic_message};

#[derive(Clone, Debug)]
pub struct WorkerOpts {
    /// Longest wait for one reply before the request is abandoned.
    pub reply_timeout: Duration,
}

impl Default for WorkerOpts {
    fn default() -> Self {
        Self {
            reply_timeout: Duration::from_secs(30),
        }
    }
}

type Outcome = KakijunResult<Option<Artifact>>;
type Pending = Arc<Mutex<HashMap<u64, mpsc::SyncSender<Outcome>>>>;
type EvaluatorFactory = Arc<dyn Fn() -> Evaluator + Send + Sync>;

struct Request {
    id: u64,
    graph: Graph,
    target: NodeId,
}

enum Job {
    Evaluate(Request),
    Forget(NodeId),
}

struct Reply {
    id: u64,
    outcome: Outcome,
}

/// Channels to a running worker.
#[derive(Clone)]
struct WorkerHandle {
    requests: mpsc::Sender<Job>,
    pending: Pending,
}

/// Evaluates on an isolated worker thread that owns its own [`Evaluator`].
///
/// The worker starts on first use and lives as long as the executor. Each request carries a
/// fresh id; a router thread hands every reply to the one caller waiting on that id.
pub struct WorkerExecutor {
    factory: EvaluatorFactory,
    opts: WorkerOpts,
    next_id: AtomicU64,
    handle: Mutex<Option<WorkerHandle>>,
}

impl WorkerExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        let opts = settings.worker.clone();
        Self::with_factory(
            move || {
                Evaluator::from_opts(
                    settings.glyphs.clone(),
                    settings.cache.clone(),
                    settings.eval.clone(),
                )
            },
            opts,
        )
    }

    /// Worker whose evaluator is built by `factory`, on the worker thread.
    pub fn with_factory(
        factory: impl Fn() -> Evaluator + Send + Sync + 'static,
        opts: WorkerOpts,
    ) -> Self {
        Self {
            factory: Arc::new(factory),
            opts,
            next_id: AtomicU64::new(0),
            handle: Mutex::new(None),
        }
    }

    /// Whether the worker has been started.
    pub fn is_running(&self) -> bool {
        lock(&self.handle).is_some()
    }

    fn handle(&self) -> KakijunResult<WorkerHandle> {
        let mut slot = lock(&self.handle);
        if let Some(h) = slot.as_ref() {
            return Ok(h.clone());
        }
        let h = spawn_worker(Arc::clone(&self.factory))?;
        *slot = Some(h.clone());
        Ok(h)
    }

    fn discard_handle(&self) {
        lock(&self.handle).take();
    }
}

impl Executor for WorkerExecutor {
    fn name(&self) -> &'static str {
        "worker"
    }

    fn evaluate(&self, graph: &Graph, target: &NodeId) -> KakijunResult<Option<Artifact>> {
        let handle = self.handle()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = mpsc::sync_channel(1);
        lock(&handle.pending).insert(id, tx);

        let request = Request {
            id,
            graph: graph.clone(),
            target: target.clone(),
        };
        if handle.requests.send(Job::Evaluate(request)).is_err() {
            lock(&handle.pending).remove(&id);
            self.discard_handle();
            return Err(KakijunError::evaluation("worker is no longer running"));
        }

        match rx.recv_timeout(self.opts.reply_timeout) {
            Ok(outcome) => outcome,
            Err(RecvTimeoutError::Timeout) => {
                lock(&handle.pending).remove(&id);
                Err(KakijunError::evaluation(format!(
                    "worker reply {id} for '{target}' timed out after {:?}",
                    self.opts.reply_timeout
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.discard_handle();
                Err(KakijunError::evaluation(format!(
                    "worker dropped request {id}"
                )))
            }
        }
    }

    /// Forwarded to a running worker; a worker that never started holds no state.
    fn forget_node(&self, id: &NodeId) {
        let handle = lock(&self.handle).clone();
        if let Some(h) = handle {
            let _ = h.requests.send(Job::Forget(id.clone()));
        }
    }
}

fn spawn_worker(factory: EvaluatorFactory) -> KakijunResult<WorkerHandle> {
    let (req_tx, req_rx) = mpsc::channel::<Job>();
    let (reply_tx, reply_rx) = mpsc::channel::<Reply>();
    let pending: Pending = Arc::new(Mutex::new(HashMap::new()));

    std::thread::Builder::new()
        .name("kakijun-worker".to_string())
        .spawn(move || {
            let evaluator = match catch_unwind(AssertUnwindSafe(|| factory())) {
                Ok(ev) => ev,
                Err(p) => {
                    tracing::error!(
                        panic = %panic_message(p.as_ref()),
                        "evaluation worker failed to start"
                    );
                    return;
                }
            };
            tracing::debug!("evaluation worker started");
            for job in req_rx {
                let req = match job {
                    Job::Evaluate(req) => req,
                    Job::Forget(id) => {
                        evaluator.cache().forget_node(id.as_str());
                        continue;
                    }
                };
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    evaluator.evaluate(&req.graph, &req.target)
                }))
                .map_err(|p| {
                    KakijunError::evaluation(format!(
                        "worker evaluation of '{}' panicked: {}",
                        req.target,
                        panic_message(p.as_ref())
                    ))
                });
                if reply_tx
                    .send(Reply {
                        id: req.id,
                        outcome,
                    })
                    .is_err()
                {
                    break;
                }
            }
        })
        .map_err(|e| KakijunError::Other(anyhow::Error::new(e)))?;

    let router_pending = Arc::clone(&pending);
    std::thread::Builder::new()
        .name("kakijun-router".to_string())
        .spawn(move || {
            for reply in reply_rx {
                let waiter = lock(&router_pending).remove(&reply.id);
                match waiter {
                    // The waiter may have timed out and gone; its reply is dropped.
                    Some(tx) => {
                        let _ = tx.send(reply.outcome);
                    }
                    None => tracing::debug!(id = reply.id, "dropping reply with no waiter"),
                }
            }
            // The worker is gone; wake every remaining waiter with a disconnect.
            lock(&router_pending).clear();
        })
        .map_err(|e| KakijunError::Other(anyhow::Error::new(e)))?;

    Ok(WorkerHandle {
        requests: req_tx,
        pending,
    })
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "../../tests/unit/exec/worker.rs"]
mod tests;
