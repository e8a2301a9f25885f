//! Attendee roster for one specific date.

use serde::{Deserialize, Serialize};

/// Stable user identifier, supplied per interaction by the identity
/// provider.
pub type UserId = i64;

/// Everyone who joined one specific date, in join order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    attendees: Vec<UserId>,
}

impl Event {
    /// Record an attendee. Joining is idempotent: a user already on the
    /// roster is left in place and `false` is returned.
    pub fn join(&mut self, user: UserId) -> bool {
        if self.has_joined(user) {
            return false;
        }
        self.attendees.push(user);
        true
    }

    pub fn has_joined(&self, user: UserId) -> bool {
        self.attendees.contains(&user)
    }

    pub fn count_attendee(&self) -> usize {
        self.attendees.len()
    }

    pub fn attendees(&self) -> &[UserId] {
        &self.attendees
    }
}
