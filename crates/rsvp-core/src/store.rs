//! Registry of calendars and the operations the command router drives.
//!
//! One [`CalendarStore`] instance is owned by the application and passed
//! explicitly to every operation; there is no global. Each calendar sits
//! behind its own lock, so mutations on the same calendar never interleave
//! while independent organizers proceed without contention. All state is
//! process memory and is lost on restart.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::calendar::{decode_invite, Calendar};
use crate::config::CoreConfig;
use crate::error::CalendarError;
use crate::event::{Event, UserId};
use crate::notify::Notifier;
use crate::reminder::ReminderScheduler;
use crate::stamp::{DateKey, Stamp};

/// A calendar behind its exclusive lock.
pub type SharedCalendar = Arc<Mutex<Calendar>>;

/// Identity of the interacting user, supplied per interaction by the
/// identity provider.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub id: UserId,
    pub display_name: String,
}

/// Which of the two pre-date reminders is firing.
#[derive(Debug, Clone, Copy)]
enum ReminderKind {
    WeekBefore,
    DayBefore,
}

pub struct CalendarStore {
    calendars: RwLock<HashMap<UserId, SharedCalendar>>,
    scheduler: ReminderScheduler,
    notifier: Arc<dyn Notifier>,
    config: CoreConfig,
}

impl CalendarStore {
    pub fn new(notifier: Arc<dyn Notifier>, config: CoreConfig) -> Arc<Self> {
        Arc::new(Self {
            calendars: RwLock::new(HashMap::new()),
            scheduler: ReminderScheduler::new(),
            notifier,
            config,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    // ── Lookup ───────────────────────────────────────────────────────

    pub async fn calendar_of(&self, owner: UserId) -> Option<SharedCalendar> {
        self.calendars.read().await.get(&owner).cloned()
    }

    /// Resolve an invitation token to the calendar it points at.
    pub async fn by_invite(&self, token: &str) -> Option<SharedCalendar> {
        let owner = decode_invite(token)?;
        self.calendar_of(owner).await
    }

    pub async fn len(&self) -> usize {
        self.calendars.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.calendars.read().await.is_empty()
    }

    /// Not-yet-fired scheduled tasks for one date slot.
    pub fn pending_reminders(&self, owner: UserId, key: &DateKey) -> usize {
        self.scheduler.pending(&(owner, key.clone()))
    }

    // ── Calendar lifecycle ───────────────────────────────────────────

    /// Fetch the user's calendar, creating one seeded from the display
    /// name on first use.
    pub async fn get_or_create(&self, who: &UserIdentity) -> SharedCalendar {
        if let Some(found) = self.calendar_of(who.id).await {
            return found;
        }
        let mut calendars = self.calendars.write().await;
        calendars
            .entry(who.id)
            .or_insert_with(|| {
                info!(owner = who.id, "calendar created");
                Arc::new(Mutex::new(Calendar::new(
                    who.id,
                    format!("{} calendar", who.display_name),
                    format!("{} personal event", who.display_name),
                )))
            })
            .clone()
    }

    /// Add dates to the organizer's calendar, creating the calendar on
    /// first use. Every newly created date gets a reminder one week out,
    /// a reminder one day out and an auto-expiry at the date itself;
    /// repeated calls with the same date never stack a second chain.
    pub async fn add_dates(self: &Arc<Self>, who: &UserIdentity, dates: &[Stamp]) -> SharedCalendar {
        let shared = self.get_or_create(who).await;
        for date in dates {
            let key = date.key();
            let created = shared.lock().await.add_date(key.clone());
            if !created {
                continue;
            }
            debug!(owner = who.id, date = %key, "date added");
            self.schedule_chain(who.id, *date);
        }
        shared
    }

    /// Remove a date and cancel every not-yet-fired scheduled task for
    /// it, so a manually removed date never fires a stale reminder.
    pub async fn remove_date(&self, owner: UserId, key: &DateKey) -> Option<Event> {
        let shared = self.calendar_of(owner).await?;
        let removed = shared.lock().await.remove_date(key);
        if removed.is_some() {
            self.scheduler.cancel(&(owner, key.clone()));
        }
        removed
    }

    /// Delete every calendar that has no dates and has been inactive for
    /// at least `threshold`. Returns how many were evicted.
    pub async fn sweep_idle(&self, threshold: Duration) -> usize {
        let mut calendars = self.calendars.write().await;
        let mut idle = Vec::new();
        for (&owner, shared) in calendars.iter() {
            if shared.lock().await.is_idle(threshold) {
                idle.push(owner);
            }
        }
        for owner in idle.iter().copied() {
            calendars.remove(&owner);
            debug!(owner, "idle calendar evicted");
        }
        idle.len()
    }

    // ── Joining ──────────────────────────────────────────────────────

    pub async fn join_date(
        &self,
        owner: UserId,
        key: &DateKey,
        user: UserId,
    ) -> Result<(), CalendarError> {
        let shared = self
            .calendar_of(owner)
            .await
            .ok_or(CalendarError::InvalidCalendar)?;
        let result = shared.lock().await.join_date(key, user);
        result
    }

    /// Join a date on the calendar an invitation points at. On success
    /// the organizer is told who joined, unless notifications are off.
    pub async fn join_via_invite(
        &self,
        who: &UserIdentity,
        invite: &str,
        raw_date: &str,
    ) -> Result<SharedCalendar, CalendarError> {
        let owner = decode_invite(invite).ok_or(CalendarError::InvalidCalendar)?;
        let date = Stamp::parse(raw_date)?;
        let key = date.key();
        let shared = self
            .calendar_of(owner)
            .await
            .ok_or(CalendarError::InvalidCalendar)?;

        let notice = {
            let mut calendar = shared.lock().await;
            calendar.join_date(&key, who.id)?;
            if calendar.notifications_enabled() {
                let others = calendar.count_attendee(&key).saturating_sub(1);
                let count = if others > 0 {
                    format!("{others} + 1")
                } else {
                    "+ 1".to_string()
                };
                Some(format!(
                    "{count}: {} joined your event in date: {}",
                    who.display_name,
                    date.beautify()
                ))
            } else {
                None
            }
        };
        if let Some(text) = notice {
            self.notifier.send(owner, &text);
        }
        Ok(shared)
    }

    // ── Field edits ──────────────────────────────────────────────────

    /// Rename the calendar and tell everyone with a pending joined date.
    pub async fn rename(&self, owner: UserId, name: &str) -> Result<(), CalendarError> {
        let shared = self
            .calendar_of(owner)
            .await
            .ok_or(CalendarError::InvalidCalendar)?;
        let (previous, audience) = {
            let mut calendar = shared.lock().await;
            (calendar.set_name(name), calendar.all_current_attendee())
        };
        self.broadcast_edit(&audience, "name", &previous, name);
        Ok(())
    }

    /// Change the description and tell everyone with a pending joined
    /// date.
    pub async fn set_description(&self, owner: UserId, text: &str) -> Result<(), CalendarError> {
        let shared = self
            .calendar_of(owner)
            .await
            .ok_or(CalendarError::InvalidCalendar)?;
        let (previous, audience) = {
            let mut calendar = shared.lock().await;
            (calendar.set_description(text), calendar.all_current_attendee())
        };
        self.broadcast_edit(&audience, "description", &previous, text);
        Ok(())
    }

    /// Toggle notification delivery. Not broadcast.
    pub async fn set_notifications(&self, owner: UserId, enabled: bool) -> Result<(), CalendarError> {
        let shared = self
            .calendar_of(owner)
            .await
            .ok_or(CalendarError::InvalidCalendar)?;
        shared.lock().await.set_notifications(enabled);
        Ok(())
    }

    fn broadcast_edit(&self, audience: &BTreeSet<UserId>, field: &str, previous: &str, value: &str) {
        for &user in audience {
            self.notifier.send(
                user,
                &format!(
                    "The {field} of a calendar that you have joined changed: {previous} -> {value}"
                ),
            );
        }
    }

    // ── Scheduled tasks ──────────────────────────────────────────────

    /// Register the reminder chain for a newly created date: two
    /// pre-date reminders plus auto-expiry at the date itself.
    fn schedule_chain(self: &Arc<Self>, owner: UserId, date: Stamp) {
        let key = date.key();
        let slot = (owner, key.clone());

        let offsets = [
            (self.config.first_reminder_days, ReminderKind::WeekBefore),
            (self.config.second_reminder_days, ReminderKind::DayBefore),
        ];
        for (days, kind) in offsets {
            let store = Arc::downgrade(self);
            let key = key.clone();
            self.scheduler.schedule(
                slot.clone(),
                date.skip(0, 0, -(days as i64)).instant(),
                async move { Self::fire_reminder(store, owner, key, date, kind).await },
            );
        }

        let store = Arc::downgrade(self);
        self.scheduler.schedule(slot, date.instant(), async move {
            Self::fire_expiry(store, owner, key).await;
        });
    }

    /// Deliver one reminder to the date's current attendees.
    ///
    /// The calendar, its notification flag and its roster are re-resolved
    /// here, at fire time, so edits made since scheduling are honored. A
    /// vanished calendar or disabled notifications mean nothing to do.
    async fn fire_reminder(
        store: Weak<CalendarStore>,
        owner: UserId,
        key: DateKey,
        date: Stamp,
        kind: ReminderKind,
    ) {
        let Some(store) = store.upgrade() else { return };
        let Some(shared) = store.calendar_of(owner).await else {
            debug!(owner, date = %key, "reminder skipped, calendar gone");
            return;
        };

        let (name, attendees, enabled) = {
            let calendar = shared.lock().await;
            (
                calendar.name().to_string(),
                calendar.current_attendee(&key).to_vec(),
                calendar.notifications_enabled(),
            )
        };
        if !enabled {
            debug!(owner, date = %key, "reminder skipped, notifications off");
            return;
        }

        let text = match kind {
            ReminderKind::WeekBefore => {
                format!("Don't forget the {name}, it is coming soon: {date}")
            }
            ReminderKind::DayBefore => {
                format!("Tomorrow {date}, there will be {name} waiting for you!")
            }
        };
        debug!(owner, date = %key, attendees = attendees.len(), "reminder fired");
        for user in attendees {
            store.notifier.send(user, &text);
        }
    }

    /// Retire a date once its moment passes.
    async fn fire_expiry(store: Weak<CalendarStore>, owner: UserId, key: DateKey) {
        let Some(store) = store.upgrade() else { return };
        if store.remove_date(owner, &key).await.is_some() {
            debug!(owner, date = %key, "date expired");
        }
    }
}
