//! A named collection of date slots owned by one organizer.
//!
//! The calendar is pure data: locking, reminder scheduling and delivery
//! all live in [`crate::store`]. Every mutating operation refreshes
//! `last_activity`, the input to the idle-eviction rule.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;
use crate::event::{Event, UserId};
use crate::stamp::DateKey;

/// Derive the shareable invitation token of an organizer.
///
/// The token is a stable, reversible encoding of the owner id: whoever
/// holds it can locate that organizer's calendar, and nothing else.
pub fn encode_invite(owner: UserId) -> String {
    owner.to_string()
}

/// Resolve an invitation token back to the owner id it encodes.
pub fn decode_invite(token: &str) -> Option<UserId> {
    token.trim().parse().ok()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    owner: UserId,
    name: String,
    description: String,
    invite: String,
    notifications: bool,
    last_activity: DateTime<Utc>,
    dates: HashMap<DateKey, Event>,
}

impl Calendar {
    /// Create a calendar. Notifications default to on.
    pub fn new(owner: UserId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            owner,
            name: name.into(),
            description: description.into(),
            invite: encode_invite(owner),
            notifications: true,
            last_activity: Utc::now(),
            dates: HashMap::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn invite(&self) -> &str {
        &self.invite
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn date_count(&self) -> usize {
        self.dates.len()
    }

    pub fn has_date(&self, key: &DateKey) -> bool {
        self.dates.contains_key(key)
    }

    pub fn dates(&self) -> impl Iterator<Item = (&DateKey, &Event)> {
        self.dates.iter()
    }

    /// Attendees of one date, in join order. Empty when the date is not
    /// registered.
    pub fn current_attendee(&self, key: &DateKey) -> &[UserId] {
        self.dates.get(key).map(Event::attendees).unwrap_or(&[])
    }

    pub fn count_attendee(&self, key: &DateKey) -> usize {
        self.current_attendee(key).len()
    }

    /// Deduplicated union of attendees across all dates; the audience for
    /// calendar-wide broadcasts.
    pub fn all_current_attendee(&self) -> BTreeSet<UserId> {
        self.dates
            .values()
            .flat_map(|event| event.attendees().iter().copied())
            .collect()
    }

    /// Eviction rule: no dates left and no activity for `threshold`.
    pub fn is_idle(&self, threshold: Duration) -> bool {
        self.is_idle_at(Utc::now(), threshold)
    }

    pub fn is_idle_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.dates.is_empty()
            && (now - self.last_activity)
                .to_std()
                .map_or(false, |elapsed| elapsed >= threshold)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Register a date slot. Returns `true` only when the slot is newly
    /// created; the caller uses this to avoid stacking duplicate reminder
    /// chains. Activity is refreshed either way.
    pub fn add_date(&mut self, key: DateKey) -> bool {
        self.touch();
        match self.dates.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Event::default());
                true
            }
        }
    }

    /// Drop a date slot, returning its roster if it existed.
    pub fn remove_date(&mut self, key: &DateKey) -> Option<Event> {
        self.touch();
        self.dates.remove(key)
    }

    /// Join a registered date.
    pub fn join_date(&mut self, key: &DateKey, user: UserId) -> Result<(), CalendarError> {
        let event = self.dates.get_mut(key).ok_or(CalendarError::InvalidEvent)?;
        if !event.join(user) {
            return Err(CalendarError::AlreadyJoined);
        }
        self.touch();
        Ok(())
    }

    /// Replace the name, returning the previous one for the edit broadcast.
    pub fn set_name(&mut self, name: impl Into<String>) -> String {
        self.touch();
        std::mem::replace(&mut self.name, name.into())
    }

    /// Replace the description, returning the previous one.
    pub fn set_description(&mut self, description: impl Into<String>) -> String {
        self.touch();
        std::mem::replace(&mut self.description, description.into())
    }

    pub fn set_notifications(&mut self, enabled: bool) {
        self.touch();
        self.notifications = enabled;
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
