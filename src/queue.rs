//! Serial delivery contexts for subscriber signals.
//!
//! Every signal a publisher forwards to its subscriber is dispatched onto a
//! [`CallbackQueue`]. A queue runs its jobs one at a time, in dispatch order, so
//! subscriber code never observes concurrent delivery no matter which thread the
//! underlying resource reports its results from.
//!
//! | Constructor | Backing |
//! |-------------|---------|
//! | [`CallbackQueue::main`] | process-wide dedicated thread, the default for all bindings |
//! | [`CallbackQueue::serial`] | new dedicated thread |
//! | [`CallbackQueue::runtime`] | one task on a tokio runtime |
//! | [`CallbackQueue::inline`] | the dispatching thread, trampolined |

use crate::{Error, ErrorContext, Result};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// A unit of work dispatched onto a queue.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

const MAIN_LABEL: &str = "fetch-publisher.main";

static MAIN: once_cell::sync::Lazy<CallbackQueue> = once_cell::sync::Lazy::new(|| {
    CallbackQueue::serial(MAIN_LABEL).unwrap_or_else(|e| {
        error!(error = %e, "failed to spawn main callback queue, delivering inline");
        CallbackQueue::inline_labeled(MAIN_LABEL)
    })
});

/// A serial execution context. Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct CallbackQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    label: String,
    kind: QueueKind,
}

enum QueueKind {
    Inline(Mutex<InlineState>),
    Worker(mpsc::UnboundedSender<Job>),
}

#[derive(Default)]
struct InlineState {
    pending: VecDeque<Job>,
    draining: bool,
}

impl CallbackQueue {
    /// The process-wide default queue, backed by one dedicated thread.
    pub fn main() -> Self {
        MAIN.clone()
    }

    /// Runs jobs on whichever thread dispatches them.
    ///
    /// A job dispatched while another job is running (from the same or another
    /// thread) is appended and run after it, never nested.
    pub fn inline() -> Self {
        Self::inline_labeled("inline")
    }

    fn inline_labeled(label: &str) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                label: label.to_string(),
                kind: QueueKind::Inline(Mutex::new(InlineState::default())),
            }),
        }
    }

    /// Spawns a dedicated thread named `label` that drains the queue.
    ///
    /// The thread exits once every handle to the queue has been dropped.
    pub fn serial(label: impl Into<String>) -> Result<Self> {
        let label = validate_label(label.into())?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker_label = label.clone();
        std::thread::Builder::new()
            .name(label.clone())
            .spawn(move || {
                while let Some(job) = rx.blocking_recv() {
                    run_job(&worker_label, job);
                }
                debug!(queue = %worker_label, "callback queue closed");
            })?;
        Ok(Self::worker(label, tx))
    }

    /// Drains the queue from a single task spawned on `handle`.
    pub fn runtime(label: impl Into<String>, handle: &tokio::runtime::Handle) -> Result<Self> {
        let label = validate_label(label.into())?;
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        let worker_label = label.clone();
        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                run_job(&worker_label, job);
            }
            debug!(queue = %worker_label, "callback queue closed");
        });
        Ok(Self::worker(label, tx))
    }

    /// Like [`CallbackQueue::runtime`] on the runtime the caller is running in.
    pub fn current_runtime(label: impl Into<String>) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            Error::runtime_with_context(
                "no tokio runtime available",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("callback_queue"),
            )
        })?;
        Self::runtime(label, &handle)
    }

    fn worker(label: String, tx: mpsc::UnboundedSender<Job>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                label,
                kind: QueueKind::Worker(tx),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.inner.kind, QueueKind::Inline(_))
    }

    /// Enqueue `job`. Jobs run one at a time in dispatch order.
    pub fn dispatch<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.inner.kind {
            QueueKind::Worker(tx) => {
                if tx.send(Box::new(job)).is_err() {
                    warn!(queue = %self.inner.label, "callback queue worker gone, dropping job");
                }
            }
            QueueKind::Inline(state) => self.dispatch_inline(state, Box::new(job)),
        }
    }

    fn dispatch_inline(&self, state: &Mutex<InlineState>, job: Job) {
        {
            let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
            st.pending.push_back(job);
            if st.draining {
                return;
            }
            st.draining = true;
        }
        loop {
            let next = {
                let mut st = state.lock().unwrap_or_else(PoisonError::into_inner);
                match st.pending.pop_front() {
                    Some(job) => job,
                    None => {
                        st.draining = false;
                        return;
                    }
                }
            };
            run_job(&self.inner.label, next);
        }
    }
}

impl Default for CallbackQueue {
    fn default() -> Self {
        Self::main()
    }
}

impl fmt::Debug for CallbackQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackQueue")
            .field("label", &self.inner.label)
            .field("inline", &self.is_inline())
            .finish()
    }
}

fn validate_label(label: String) -> Result<String> {
    if label.trim().is_empty() {
        return Err(Error::configuration_with_context(
            "queue label must not be empty",
            ErrorContext::new()
                .with_field_path("callback_queue.label")
                .with_source("callback_queue"),
        ));
    }
    Ok(label)
}

// A panicking subscriber must not take the queue down with it.
fn run_job(label: &str, job: Job) {
    if catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!(queue = %label, "callback panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_runs_immediately() {
        let queue = CallbackQueue::inline();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        queue.dispatch(move || s.lock().unwrap().push(1));
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn inline_reentrant_dispatch_is_trampolined() {
        let queue = CallbackQueue::inline();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let (q, s) = (queue.clone(), seen.clone());
        queue.dispatch(move || {
            let s2 = s.clone();
            q.dispatch(move || s2.lock().unwrap().push("inner"));
            // The nested job has not run yet.
            s.lock().unwrap().push("outer");
        });

        assert_eq!(*seen.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn inline_survives_panicking_job() {
        let queue = CallbackQueue::inline();
        queue.dispatch(|| panic!("subscriber bug"));
        let seen = Arc::new(Mutex::new(false));
        let s = seen.clone();
        queue.dispatch(move || *s.lock().unwrap() = true);
        assert!(*seen.lock().unwrap());
    }

    #[test]
    fn serial_preserves_order_on_named_thread() {
        let queue = CallbackQueue::serial("test.serial").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..100 {
            let s = seen.clone();
            queue.dispatch(move || {
                assert_eq!(std::thread::current().name(), Some("test.serial"));
                s.lock().unwrap().push(i);
            });
        }
        let (tx, rx) = tokio::sync::oneshot::channel();
        queue.dispatch(move || {
            let _ = tx.send(());
        });
        rx.blocking_recv().unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn empty_label_is_rejected() {
        let err = CallbackQueue::serial("  ").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn current_runtime_requires_tokio() {
        let err = CallbackQueue::current_runtime("test.rt").unwrap_err();
        assert!(matches!(err, Error::Runtime { .. }));
    }

    #[tokio::test]
    async fn runtime_queue_delivers_in_order() {
        let queue = CallbackQueue::current_runtime("test.rt").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..10 {
            let s = seen.clone();
            queue.dispatch(move || s.lock().unwrap().push(i));
        }
        let (tx, rx) = tokio::sync::oneshot::channel();
        queue.dispatch(move || {
            let _ = tx.send(());
        });
        rx.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn main_queue_is_shared() {
        let a = CallbackQueue::main();
        let b = CallbackQueue::default();
        assert_eq!(a.label(), b.label());
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
    }
}
