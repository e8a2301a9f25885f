//! Time-driven reminder and expiry behavior, on a paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rsvp_core::{CalendarStore, CoreConfig, Notifier, Stamp, UserId, UserIdentity};

#[derive(Default)]
struct Recorder(Mutex<Vec<(UserId, String)>>);

impl Recorder {
    fn messages(&self) -> Vec<(UserId, String)> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for Recorder {
    fn send(&self, user: UserId, text: &str) {
        self.0.lock().unwrap().push((user, text.to_string()));
    }
}

fn identity(id: UserId, name: &str) -> UserIdentity {
    UserIdentity {
        id,
        display_name: name.to_string(),
    }
}

/// Let spawned tasks make progress without advancing time.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

const DAY: Duration = Duration::from_secs(24 * 3600);

#[tokio::test(start_paused = true)]
async fn test_reminders_fire_and_date_expires() {
    let recorder = Arc::new(Recorder::default());
    let store = CalendarStore::new(recorder.clone(), CoreConfig::default());
    let organizer = identity(10, "Olga");
    let date = Stamp::now().skip(0, 0, 10);
    let key = date.key();

    let shared = store.add_dates(&organizer, &[date]).await;
    store.join_date(10, &key, 77).await.unwrap();
    settle().await;
    assert_eq!(store.pending_reminders(10, &key), 3);

    // Day 3: week-before reminder.
    tokio::time::advance(3 * DAY + Duration::from_secs(60)).await;
    settle().await;
    let messages = recorder.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, 77);
    assert!(messages[0].1.contains("coming soon"));

    // Day 9: day-before reminder.
    tokio::time::advance(6 * DAY).await;
    settle().await;
    let messages = recorder.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[1].1.starts_with("Tomorrow"));

    // Day 10: the date retires itself.
    tokio::time::advance(DAY).await;
    settle().await;
    assert!(!shared.lock().await.has_date(&key));
    assert_eq!(store.pending_reminders(10, &key), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reminder_reads_notification_flag_at_fire_time() {
    let recorder = Arc::new(Recorder::default());
    let store = CalendarStore::new(recorder.clone(), CoreConfig::default());
    let organizer = identity(10, "Olga");
    let date = Stamp::now().skip(0, 0, 10);
    let key = date.key();

    store.add_dates(&organizer, &[date]).await;
    store.join_date(10, &key, 77).await.unwrap();
    settle().await;

    // Toggled off after scheduling but before the first reminder: the
    // fire-time check wins and nothing is sent.
    store.set_notifications(10, false).await.unwrap();
    tokio::time::advance(3 * DAY + Duration::from_secs(60)).await;
    settle().await;
    assert!(recorder.messages().is_empty());

    // Toggled back on before the day-before reminder: delivery resumes.
    store.set_notifications(10, true).await.unwrap();
    tokio::time::advance(6 * DAY).await;
    settle().await;
    assert_eq!(recorder.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_reminder_uses_live_roster_and_name() {
    let recorder = Arc::new(Recorder::default());
    let store = CalendarStore::new(recorder.clone(), CoreConfig::default());
    let organizer = identity(10, "Olga");
    let date = Stamp::now().skip(0, 0, 10);
    let key = date.key();

    let shared = store.add_dates(&organizer, &[date]).await;
    settle().await;

    // Joined after scheduling, renamed after scheduling: both must be
    // visible when the reminder fires. The name is changed through the
    // calendar lock directly to keep the edit broadcast out of the
    // recording.
    store.join_date(10, &key, 77).await.unwrap();
    store.join_date(10, &key, 78).await.unwrap();
    shared.lock().await.set_name("solstice dinner");

    tokio::time::advance(3 * DAY + Duration::from_secs(60)).await;
    settle().await;
    let messages = recorder.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|(_, text)| text.contains("solstice dinner")));
    let recipients: Vec<UserId> = messages.iter().map(|(user, _)| *user).collect();
    assert_eq!(recipients, vec![77, 78]);
}

#[tokio::test(start_paused = true)]
async fn test_removed_date_never_fires_stale_reminders() {
    let recorder = Arc::new(Recorder::default());
    let store = CalendarStore::new(recorder.clone(), CoreConfig::default());
    let organizer = identity(10, "Olga");
    let date = Stamp::now().skip(0, 0, 10);
    let key = date.key();

    store.add_dates(&organizer, &[date]).await;
    store.join_date(10, &key, 77).await.unwrap();
    settle().await;

    store.remove_date(10, &key).await.unwrap();
    tokio::time::advance(11 * DAY).await;
    settle().await;

    assert!(recorder.messages().is_empty());
    assert_eq!(store.pending_reminders(10, &key), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reminder_for_near_date_fires_immediately() {
    let recorder = Arc::new(Recorder::default());
    let store = CalendarStore::new(recorder.clone(), CoreConfig::default());
    let organizer = identity(10, "Olga");

    // Two days out: the week-before instant already passed, so that
    // reminder runs right away against the live roster.
    let date = Stamp::now().skip(0, 0, 2);
    let key = date.key();
    store.add_dates(&organizer, &[date]).await;
    store.join_date(10, &key, 77).await.unwrap();

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    let messages = recorder.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("coming soon"));
}
