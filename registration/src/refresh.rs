//! Periodic, cancelable data refresh.
//!
//! A [`PeriodicRefresher`] runs a fetch function on a tokio task every
//! interval and publishes each result on a `watch` channel. Every fetch gets a
//! generation number when it starts; a result is published only if nothing
//! from a newer generation has been published already, so a slow response
//! can never overwrite a fresher one. Manual refreshes go through the same
//! guard.
//!
//! The task stops on [`PeriodicRefresher::stop`] or when the refresher is
//! dropped.

use crate::error::Result;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Boxed future returned by a fetch function.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// Fetch function polled by a [`PeriodicRefresher`].
pub type Fetcher<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;

/// A published result and the generation that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<T> {
    /// Generation of the fetch that produced `value`.
    pub generation: u64,
    /// Fetched value.
    pub value: T,
}

struct Shared<T> {
    fetch: Fetcher<T>,
    next_generation: AtomicU64,
    stopped: AtomicBool,
    sender: watch::Sender<Option<Snapshot<T>>>,
}

impl<T: Send + Sync + 'static> Shared<T> {
    /// Run one fetch; returns whether its result was published.
    async fn refresh(&self) -> Result<bool> {
        if self.stopped.load(Ordering::SeqCst) {
            return Ok(false);
        }
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let value = (self.fetch)().await?;
        Ok(self.publish(generation, value))
    }

    fn publish(&self, generation: u64, value: T) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        let applied = self.sender.send_if_modified(|current| {
            if current.as_ref().is_some_and(|s| s.generation >= generation) {
                return false;
            }
            *current = Some(Snapshot { generation, value });
            true
        });
        if !applied {
            tracing::debug!(generation, "Discarded stale refresh result");
        }
        applied
    }
}

/// Background poller publishing the latest fetched value.
pub struct PeriodicRefresher<T> {
    shared: Arc<Shared<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + Sync + 'static> PeriodicRefresher<T> {
    /// Start polling `fetch` every `interval`, beginning immediately.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(fetch: Fetcher<T>, interval: Duration) -> Self {
        let (sender, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            fetch,
            next_generation: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            sender,
        });

        let task_shared = Arc::clone(&shared);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if task_shared.stopped.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(error) = task_shared.refresh().await {
                    tracing::warn!(%error, "Periodic refresh failed; retrying next interval");
                }
            }
        });

        Self { shared, task }
    }

    /// Fetch now, outside the schedule. Returns whether the result was published.
    ///
    /// # Errors
    ///
    /// Returns the fetch function's error; nothing is published in that case.
    pub async fn refresh_now(&self) -> Result<bool> {
        self.shared.refresh().await
    }

    /// Receiver observing every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<T>>> {
        self.shared.sender.subscribe()
    }

    /// Stop polling. Results of fetches still in flight are discarded.
    pub fn stop(&self) {
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("Periodic refresh stopped");
        }
        self.task.abort();
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::SeqCst)
    }
}

impl<T: Clone + Send + Sync + 'static> PeriodicRefresher<T> {
    /// Most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot<T>> {
        self.shared.sender.borrow().clone()
    }
}

impl<T> Drop for PeriodicRefresher<T> {
    fn drop(&mut self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::ServiceError;
    use std::sync::atomic::AtomicUsize;

    fn counting_fetcher(calls: Arc<AtomicUsize>) -> Fetcher<usize> {
        Arc::new(move || -> FetchFuture<usize> {
            let calls = Arc::clone(&calls);
            Box::pin(async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
        })
    }

    #[test]
    fn older_generation_never_overwrites_newer() {
        let (sender, _) = watch::channel(None);
        let shared = Shared {
            fetch: counting_fetcher(Arc::new(AtomicUsize::new(0))),
            next_generation: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            sender,
        };

        assert!(shared.publish(2, 20));
        assert!(!shared.publish(1, 10));
        assert!(!shared.publish(2, 21));
        assert!(shared.publish(3, 30));
        assert_eq!(shared.sender.borrow().clone(), Some(Snapshot { generation: 3, value: 30 }));
    }

    #[tokio::test(start_paused = true)]
    async fn polls_on_interval_until_stopped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let refresher = PeriodicRefresher::spawn(counting_fetcher(Arc::clone(&calls)), Duration::from_secs(30));
        let mut rx = refresher.subscribe();

        rx.changed().await.unwrap();
        assert_eq!(refresher.latest().unwrap().value, 1);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        refresher.stop();
        assert!(refresher.is_stopped());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!refresher.refresh_now().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_is_discarded_after_newer_manual_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let fetch: Fetcher<&'static str> = {
            let calls = Arc::clone(&calls);
            Arc::new(move || -> FetchFuture<&'static str> {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    if call == 0 {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        Ok("stale")
                    } else {
                        Ok("fresh")
                    }
                })
            })
        };
        let refresher = PeriodicRefresher::spawn(fetch, Duration::from_secs(3600));
        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert!(refresher.refresh_now().await.unwrap());
        assert_eq!(refresher.latest().unwrap().value, "fresh");

        tokio::time::sleep(Duration::from_secs(11)).await;
        let latest = refresher.latest().unwrap();
        assert_eq!(latest.value, "fresh");
        assert_eq!(latest.generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_errors_publish_nothing() {
        let fetch: Fetcher<u8> = Arc::new(|| -> FetchFuture<u8> {
            Box::pin(async { Err(ServiceError::StoreUnavailable("down".into())) })
        });
        let refresher = PeriodicRefresher::spawn(fetch, Duration::from_secs(30));
        assert!(refresher.refresh_now().await.is_err());
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(refresher.latest().is_none());
    }
}
