//! Per-application deploy lanes.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Boxed deploy job future.
pub type JobFuture = std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>;

/// Deferred job constructor. The future is only built when the job
/// actually starts, so queued jobs hold no live resources.
pub type JobFn = Box<dyn FnOnce() -> JobFuture + Send + Sync>;

/// Wraps an async closure into a [`JobFn`].
pub fn job<F, Fut>(f: F) -> JobFn
where
    F: FnOnce() -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

/// Admission decision for an enqueued deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "admission", rename_all = "snake_case")]
pub enum Admission {
    /// The lane was idle; the job is running now.
    Started,
    /// Another deploy holds the lane; `position` is 1-based in the wait line.
    Queued { position: usize },
}

/// Observable state of one lane.
#[derive(Debug, Clone, Serialize)]
pub struct LaneStatus {
    pub app: String,
    /// How long the active job has been running, when one is.
    pub active_for: Option<Duration>,
    pub waiting: usize,
}

struct ActiveJob {
    id: u64,
    started_at: Instant,
    handle: JoinHandle<()>,
}

struct QueuedJob {
    job: JobFn,
}

#[derive(Default)]
struct Lane {
    active: Option<ActiveJob>,
    pending: VecDeque<QueuedJob>,
}

#[derive(Default)]
struct Inner {
    lanes: RwLock<HashMap<String, Lane>>,
    next_id: AtomicU64,
}

/// Thread-safe deploy queue. Cloning is cheap; clones share the lanes.
#[derive(Clone, Default)]
pub struct DeployQueue {
    inner: Arc<Inner>,
}

impl DeployQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submits a job for `app`. Starts it immediately when the lane is
    /// idle, otherwise appends it to the lane's wait line.
    pub async fn enqueue(&self, app: &str, job: JobFn) -> Admission {
        let mut lanes = self.inner.lanes.write().await;
        let lane = lanes.entry(app.to_string()).or_default();
        if lane.active.is_some() {
            lane.pending.push_back(QueuedJob { job });
            let position = lane.pending.len();
            debug!(app = %app, position, "deploy queued behind active job");
            return Admission::Queued { position };
        }
        lane.active = Some(self.start_job(app, job));
        debug!(app = %app, "deploy started on idle lane");
        Admission::Started
    }

    /// True when a deploy is currently running for `app`.
    pub async fn is_busy(&self, app: &str) -> bool {
        let lanes = self.inner.lanes.read().await;
        lanes.get(app).is_some_and(|lane| lane.active.is_some())
    }

    /// Number of jobs waiting behind the active one for `app`.
    pub async fn waiting(&self, app: &str) -> usize {
        let lanes = self.inner.lanes.read().await;
        lanes.get(app).map_or(0, |lane| lane.pending.len())
    }

    /// Snapshot of every lane that currently exists.
    pub async fn snapshot(&self) -> Vec<LaneStatus> {
        let lanes = self.inner.lanes.read().await;
        let mut statuses: Vec<LaneStatus> = lanes
            .iter()
            .map(|(app, lane)| LaneStatus {
                app: app.clone(),
                active_for: lane.active.as_ref().map(|a| a.started_at.elapsed()),
                waiting: lane.pending.len(),
            })
            .collect();
        statuses.sort_by(|a, b| a.app.cmp(&b.app));
        statuses
    }

    /// Safety valve: aborts the active job for `app` and promotes the next
    /// queued one. Returns false when nothing was running.
    ///
    /// Only for jobs wedged on an unresponsive provider; the aborted job
    /// gets no chance to clean up.
    pub async fn force_release(&self, app: &str) -> bool {
        let mut lanes = self.inner.lanes.write().await;
        let Some(lane) = lanes.get_mut(app) else {
            return false;
        };
        let Some(active) = lane.active.take() else {
            return false;
        };
        active.handle.abort();
        warn!(app = %app, "deploy lane force released");
        if let Some(next) = lane.pending.pop_front() {
            lane.active = Some(self.start_job(app, next.job));
        } else {
            lanes.remove(app);
        }
        true
    }

    /// Called by the job wrapper when a job future returns. Promotes the
    /// next queued job or prunes the empty lane.
    async fn finish(&self, app: &str, id: u64) {
        let mut lanes = self.inner.lanes.write().await;
        let Some(lane) = lanes.get_mut(app) else {
            return;
        };
        // A force release may have replaced the active job already.
        if lane.active.as_ref().map(|a| a.id) != Some(id) {
            return;
        }
        lane.active = None;
        if let Some(next) = lane.pending.pop_front() {
            lane.active = Some(self.start_job(app, next.job));
            debug!(app = %app, waiting = lane.pending.len(), "promoted queued deploy");
        } else {
            lanes.remove(app);
        }
    }

    fn start_job(&self, app: &str, job: JobFn) -> ActiveJob {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let queue = self.clone();
        let app = app.to_string();
        let handle = tokio::spawn(async move {
            // The lane must be released even when the job panics, or the
            // application would be stuck busy forever.
            if AssertUnwindSafe(job()).catch_unwind().await.is_err() {
                warn!(app = %app, "deploy job panicked; releasing its lane");
            }
            queue.finish(&app, id).await;
        });
        ActiveJob {
            id,
            started_at: Instant::now(),
            handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::{sleep, timeout};

    async fn settled(queue: &DeployQueue, app: &str) {
        // The finish hook runs after the job future returns; poll briefly.
        for _ in 0..100 {
            if !queue.is_busy(app).await && queue.waiting(app).await == 0 {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("lane {app} never settled");
    }

    #[tokio::test]
    async fn idle_lane_starts_immediately() {
        let queue = DeployQueue::new();
        let (tx, rx) = oneshot::channel();
        let admission = queue
            .enqueue(
                "demo",
                job(move || async move {
                    let _ = tx.send(());
                }),
            )
            .await;
        assert_eq!(admission, Admission::Started);
        timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn one_key_runs_in_submission_order() {
        let queue = DeployQueue::new();
        let (order_tx, mut order_rx) = mpsc::unbounded_channel::<u32>();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let tx = order_tx.clone();
        let first = queue
            .enqueue(
                "demo",
                job(move || async move {
                    let _ = tx.send(1);
                    let _ = release_rx.await;
                }),
            )
            .await;
        assert_eq!(first, Admission::Started);

        for n in 2..=5u32 {
            let tx = order_tx.clone();
            let admission = queue
                .enqueue(
                    "demo",
                    job(move || async move {
                        let _ = tx.send(n);
                    }),
                )
                .await;
            assert_eq!(
                admission,
                Admission::Queued {
                    position: n as usize - 1
                }
            );
        }

        release_tx.send(()).unwrap();
        drop(order_tx);

        let mut seen = Vec::new();
        while let Ok(Some(n)) = timeout(Duration::from_secs(2), order_rx.recv()).await {
            seen.push(n);
            if seen.len() == 5 {
                break;
            }
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn different_keys_run_concurrently() {
        let queue = DeployQueue::new();
        let barrier = Arc::new(tokio::sync::Barrier::new(2));

        let b1 = Arc::clone(&barrier);
        let a = queue
            .enqueue(
                "alpha",
                job(move || async move {
                    b1.wait().await;
                }),
            )
            .await;
        let b2 = Arc::clone(&barrier);
        let b = queue
            .enqueue(
                "beta",
                job(move || async move {
                    b2.wait().await;
                }),
            )
            .await;

        assert_eq!(a, Admission::Started);
        assert_eq!(b, Admission::Started);
        // Both jobs block on the same barrier; they only finish if the
        // lanes really run in parallel.
        timeout(Duration::from_secs(2), settled(&queue, "alpha"))
            .await
            .unwrap();
        timeout(Duration::from_secs(2), settled(&queue, "beta"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn lane_is_pruned_after_last_job() {
        let queue = DeployQueue::new();
        queue.enqueue("demo", job(|| async {})).await;
        settled(&queue, "demo").await;
        assert!(queue.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn force_release_aborts_and_promotes() {
        let queue = DeployQueue::new();
        let (tx, rx) = oneshot::channel::<()>();

        let stuck = queue
            .enqueue("demo", job(|| async { std::future::pending::<()>().await }))
            .await;
        assert_eq!(stuck, Admission::Started);

        let queued = queue
            .enqueue(
                "demo",
                job(move || async move {
                    let _ = tx.send(());
                }),
            )
            .await;
        assert_eq!(queued, Admission::Queued { position: 1 });

        assert!(queue.force_release("demo").await);
        timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn force_release_on_idle_lane_is_false() {
        let queue = DeployQueue::new();
        assert!(!queue.force_release("ghost").await);
    }

    #[tokio::test]
    async fn panicking_job_still_releases_the_lane() {
        let queue = DeployQueue::new();
        let (tx, rx) = oneshot::channel::<()>();

        queue
            .enqueue("demo", job(|| async { panic!("job blew up") }))
            .await;
        let queued = queue
            .enqueue(
                "demo",
                job(move || async move {
                    let _ = tx.send(());
                }),
            )
            .await;
        assert!(matches!(queued, Admission::Queued { .. } | Admission::Started));

        // The queued job only runs if the panic released the lane.
        timeout(Duration::from_secs(1), rx).await.unwrap().unwrap();
        settled(&queue, "demo").await;
    }

    #[tokio::test]
    async fn snapshot_reports_active_and_waiting() {
        let queue = DeployQueue::new();
        queue
            .enqueue("demo", job(|| async { std::future::pending::<()>().await }))
            .await;
        queue.enqueue("demo", job(|| async {})).await;

        let snapshot = queue.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].app, "demo");
        assert!(snapshot[0].active_for.is_some());
        assert_eq!(snapshot[0].waiting, 1);

        queue.force_release("demo").await;
    }
}
