//! Delivery seam toward the transport layer.

use crate::event::UserId;

/// Best-effort text delivery to a user.
///
/// Implemented by the embedding transport (chat bridge, CLI, test
/// recorder). The core never retries and never inspects the outcome.
pub trait Notifier: Send + Sync {
    fn send(&self, user: UserId, text: &str);
}

/// Drops every message. Useful when an embedder has no delivery channel.
impl Notifier for () {
    fn send(&self, _user: UserId, _text: &str) {}
}
