//! One-shot wall-clock task scheduling with cancellation.
//!
//! Each scheduled task is retained under the (owner, date slot) it serves,
//! so removing a date can cancel every not-yet-fired task for it and a
//! manually removed date never fires a stale reminder. An instant that
//! already passed runs the task immediately.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::UserId;
use crate::stamp::DateKey;

/// The calendar date slot a scheduled task belongs to.
pub type ReminderKey = (UserId, DateKey);

/// Registry of pending one-shot tasks keyed by date slot.
#[derive(Debug, Default)]
pub struct ReminderScheduler {
    tasks: Mutex<HashMap<ReminderKey, Vec<JoinHandle<()>>>>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once at `at`, or immediately if the instant already
    /// elapsed. The handle is retained under `key` until cancelled.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, key: ReminderKey, at: DateTime<Utc>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = (at - Utc::now()).to_std().unwrap_or_default();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        debug!(owner = key.0, date = %key.1, delay_secs = delay.as_secs(), "task scheduled");

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let slot = tasks.entry(key).or_default();
        slot.retain(|handle| !handle.is_finished());
        slot.push(handle);
    }

    /// Abort every not-yet-fired task for the slot. Returns how many
    /// handles were dropped.
    pub fn cancel(&self, key: &ReminderKey) -> usize {
        let removed = {
            let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            tasks.remove(key)
        };
        match removed {
            Some(handles) => {
                for handle in &handles {
                    handle.abort();
                }
                debug!(owner = key.0, date = %key.1, count = handles.len(), "tasks cancelled");
                handles.len()
            }
            None => 0,
        }
    }

    /// Spawned-but-not-finished tasks for the slot.
    pub fn pending(&self, key: &ReminderKey) -> usize {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks
            .get(key)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stamp::Stamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn slot(owner: UserId) -> ReminderKey {
        (owner, Stamp::parse("01/01/2040-12:00").unwrap().key())
    }

    /// Let spawned tasks make progress without advancing time.
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_instant() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(slot(1), Utc::now() + chrono::Duration::seconds(60), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        tokio::time::advance(Duration::from_secs(58)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(&slot(1)), 1);

        tokio::time::advance(Duration::from_secs(4)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(&slot(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_instant_runs_immediately() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(slot(1), Utc::now() - chrono::Duration::hours(1), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;
        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule(slot(1), Utc::now() + chrono::Duration::seconds(60), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        assert_eq!(scheduler.cancel(&slot(1)), 1);
        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.pending(&slot(1)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_scoped_to_the_slot() {
        let scheduler = ReminderScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for owner in [1, 2] {
            let counter = fired.clone();
            scheduler.schedule(slot(owner), Utc::now() + chrono::Duration::seconds(60), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        settle().await;

        scheduler.cancel(&slot(1));
        tokio::time::advance(Duration::from_secs(120)).await;
        settle().await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_unknown_slot_is_noop() {
        let scheduler = ReminderScheduler::new();
        assert_eq!(scheduler.cancel(&slot(9)), 0);
        assert_eq!(scheduler.pending(&slot(9)), 0);
    }
}
