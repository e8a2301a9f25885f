//! Periodic removal of idle calendars.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::store::CalendarStore;

/// Long-lived control loop evicting calendars that have no dates and no
/// recent activity.
#[derive(Debug)]
pub struct EvictionSweep {
    handle: JoinHandle<()>,
}

impl EvictionSweep {
    /// Spawn the sweep loop. `period` separates consecutive sweeps and
    /// must be non-zero; `threshold` is the idle duration after which an
    /// empty calendar is evicted. The first sweep runs one period in.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<CalendarStore>, period: Duration, threshold: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick resolves immediately; skip it.
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let evicted = store.sweep_idle(threshold).await;
                if evicted > 0 {
                    info!(evicted, "idle calendars removed");
                }
            }
        });
        Self { handle }
    }

    /// Stop the loop. The encompassing process owns shutdown; this handle
    /// exists so embedders are not stuck with a fire-and-forget loop.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for EvictionSweep {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::stamp::Stamp;
    use crate::store::UserIdentity;

    fn identity(id: i64) -> UserIdentity {
        UserIdentity {
            id,
            display_name: format!("user-{id}"),
        }
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_idle_calendars() {
        let store = CalendarStore::new(Arc::new(()), CoreConfig::default());
        store.get_or_create(&identity(1)).await;
        store
            .add_dates(&identity(2), &[Stamp::now().skip(0, 1, 0)])
            .await;
        assert_eq!(store.len().await, 2);

        let sweep = EvictionSweep::spawn(store.clone(), Duration::from_secs(60), Duration::ZERO);
        settle().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;

        // Calendar 1 is empty and instantly idle; calendar 2 still has a date.
        assert_eq!(store.len().await, 1);
        assert!(store.calendar_of(1).await.is_none());
        assert!(store.calendar_of(2).await.is_some());
        sweep.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_repeatedly() {
        let store = CalendarStore::new(Arc::new(()), CoreConfig::default());
        let sweep = EvictionSweep::spawn(store.clone(), Duration::from_secs(60), Duration::ZERO);
        settle().await;
        tokio::time::advance(Duration::from_secs(61)).await;
        settle().await;

        // A calendar created after the first sweep goes on the next one.
        store.get_or_create(&identity(5)).await;
        assert_eq!(store.len().await, 1);
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(store.len().await, 0);
        sweep.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_sweep_no_longer_evicts() {
        let store = CalendarStore::new(Arc::new(()), CoreConfig::default());
        let sweep = EvictionSweep::spawn(store.clone(), Duration::from_secs(60), Duration::ZERO);
        settle().await;
        sweep.stop();
        settle().await;

        store.get_or_create(&identity(3)).await;
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(store.len().await, 1);
    }
}
