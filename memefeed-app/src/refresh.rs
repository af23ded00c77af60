//! Periodic recomputation of "time ago" labels.
//!
//! A label registers one timer when it is mounted and releases it when it is
//! unmounted or dropped.

use crate::clock::Clock;
use memefeed_common::{model::Timestamp, time_ago::RelativeTime, util::PositiveDuration};
use std::sync::Arc;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

/// A callback running on a fixed period until cancelled. The first run
/// happens immediately.
#[derive(Debug)]
pub struct RefreshTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: PositiveDuration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut ticks = interval(period.get());
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    _ = ticks.tick() => tick(),
                }
            }
            trace!("Refresh task stopped");
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the timer and waits for the task to wind down.
    pub async fn cancel(mut self) {
        self.token.cancel();

        if let Some(handle) = self.handle.take()
            && let Err(err) = handle.await
        {
            warn!(error = %err, "Refresh task ended abnormally");
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// A mounted "x minutes ago" label for one timestamp.
#[derive(Debug)]
pub struct TimeAgo {
    timestamp: Timestamp,
    label: watch::Receiver<RelativeTime>,
    task: RefreshTask,
}

impl TimeAgo {
    /// Computes the label right away and then once per `period`.
    pub fn mount(timestamp: Timestamp, clock: Arc<dyn Clock>, period: PositiveDuration) -> Self {
        let (sender, label) = watch::channel(RelativeTime::between(timestamp, clock.now()));

        let task = RefreshTask::spawn(period, move || {
            let next = RelativeTime::between(timestamp, clock.now());
            sender.send_if_modified(|current| {
                let modified = *current != next;
                *current = next;
                modified
            });
        });

        Self {
            timestamp,
            label,
            task,
        }
    }

    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[must_use]
    pub fn current(&self) -> RelativeTime {
        *self.label.borrow()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.current().to_string()
    }

    /// Waits until the label changes. `None` once the label is unmounted.
    pub async fn changed(&mut self) -> Option<RelativeTime> {
        self.label.changed().await.ok()?;
        Some(*self.label.borrow_and_update())
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RelativeTime> {
        self.label.clone()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.task.is_running()
    }

    pub async fn unmount(self) {
        self.task.cancel().await;
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        clock::{Clock, ManualClock},
        refresh::{RefreshTask, TimeAgo},
    };
    use memefeed_common::{model::Timestamp, time_ago::RelativeTime, util::PositiveDuration};
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration as StdDuration,
    };
    use time::{Duration, macros::utc_datetime};

    fn minute() -> PositiveDuration {
        PositiveDuration::from_secs(60).unwrap()
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Timestamp::new(utc_datetime!(2026-10-18 12:00))))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_until_cancelled() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let task = RefreshTask::spawn(minute(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(StdDuration::from_secs(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(task.is_running());

        task.cancel().await;
        tokio::time::sleep(StdDuration::from_secs(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn label_follows_the_clock() {
        let clock = clock();
        let created = Timestamp::new(clock.now().get() - Duration::seconds(30));

        let mut label = TimeAgo::mount(created, clock.clone(), minute());
        assert_eq!(label.text(), "just now");
        assert!(label.is_mounted());

        clock.advance(Duration::seconds(45));
        assert_eq!(label.changed().await, Some(RelativeTime::Minutes(1)));
        assert_eq!(label.text(), "1m ago");

        clock.advance(Duration::hours(2));
        assert_eq!(label.changed().await, Some(RelativeTime::Hours(2)));

        label.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_releases_the_timer() {
        let clock = clock();
        let label = TimeAgo::mount(clock.now(), clock.clone(), minute());
        let mut observer = label.subscribe();

        label.unmount().await;
        assert!(observer.changed().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_label_stops_the_timer() {
        let clock = clock();
        let label = TimeAgo::mount(clock.now(), clock.clone(), minute());
        let mut observer = label.subscribe();

        drop(label);
        assert!(observer.changed().await.is_err());
    }
}
