//! Cancellable delayed task, used to coalesce bursts of filter changes into one fetch.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::Notify, task::JoinHandle};
use tokio_util::sync::CancellationToken;

struct Pending {
    cancel: CancellationToken,
    flush: Arc<Notify>,
    handle: JoinHandle<()>,
}

/// Runs the most recently scheduled task once `window` has passed without a
/// newer one. Must be used inside a tokio runtime.
pub struct Debouncer {
    window: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replaces any pending task with `task`, due after the window.
    pub fn call<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let cancel = CancellationToken::new();
        let flush = Arc::new(Notify::new());
        let window = self.window;

        let handle = tokio::spawn({
            let cancel = cancel.clone();
            let flush = flush.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(window) => {}
                    _ = flush.notified() => {}
                }
                task.await;
            }
        });
        self.pending = Some(Pending { cancel, flush, handle });
    }

    /// Drops any pending task and runs `task` right away.
    pub fn call_immediate<F>(&mut self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        tokio::spawn(task)
    }

    /// Fires the pending task now instead of waiting out the window.
    pub fn flush(&mut self) -> Option<JoinHandle<()>> {
        let pending = self.pending.take()?;
        pending.flush.notify_one();
        Some(pending.handle)
    }

    /// A task that already fired keeps running; only the wait is cancelled.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
        }
    }

    /// True while a scheduled task is waiting or running.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|p| !p.handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn recorder() -> (Arc<parking_lot::Mutex<Vec<u32>>>, impl Fn(u32) -> std::pin::Pin<Box<dyn Future<Output = ()> + Send>>) {
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let task_log = log.clone();
        let make = move |id: u32| {
            let log = task_log.clone();
            Box::pin(async move { log.lock().push(id) }) as std::pin::Pin<Box<dyn Future<Output = ()> + Send>>
        };
        (log, make)
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_call_in_a_burst_runs() {
        let (log, task) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.call(task(1));
        sleep(Duration::from_millis(100)).await;
        debouncer.call(task(2));
        sleep(Duration::from_millis(250)).await;
        assert!(log.lock().is_empty());
        assert!(debouncer.is_pending());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(*log.lock(), vec![2]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_call_skips_the_window_and_drops_pending() {
        let (log, task) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));

        debouncer.call(task(1));
        debouncer.call_immediate(task(2)).await.unwrap();
        assert_eq!(*log.lock(), vec![2]);

        sleep(Duration::from_secs(1)).await;
        assert_eq!(*log.lock(), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn flush_runs_the_pending_task_now() {
        let (log, task) = recorder();
        let mut debouncer = Debouncer::new(Duration::from_secs(10));

        debouncer.call(task(7));
        let started = tokio::time::Instant::now();
        debouncer.flush().unwrap().await.unwrap();
        assert_eq!(*log.lock(), vec![7]);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(debouncer.flush().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_stop_the_pending_task() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(50));

        let counter = runs.clone();
        debouncer.call(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();

        let counter = runs.clone();
        debouncer.call(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(debouncer);

        sleep(Duration::from_millis(200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
