//! # RSVP Core Library
//!
//! In-memory state and scheduling core of a multi-tenant event-coordination
//! service. Each organizer owns a calendar of candidate dates, participants
//! join specific dates through a shareable invitation token, and the core
//! reminds attendees as a date approaches, retires dates once they pass and
//! garbage-collects idle calendars.
//!
//! ## Architecture
//!
//! - **State**: [`CalendarStore`] maps organizer ids to [`Calendar`]s; each
//!   calendar sits behind its own lock so mutations on the same calendar
//!   never interleave. Everything is process memory, lost on restart.
//! - **Time**: [`ReminderScheduler`] runs one-shot wall-clock tasks and
//!   hands back cancellation; [`EvictionSweep`] is the periodic idle sweep.
//!   Background tasks swallow errors: a vanished calendar at fire time
//!   means nothing to do.
//! - **Edges**: the chat/command router and the identity provider are
//!   external collaborators; delivery goes through the [`Notifier`] seam.
//!
//! ## Key Components
//!
//! - [`Stamp`] / [`DateKey`]: a moment and its canonical minute-resolution
//!   slot key
//! - [`CalendarStore`]: registry with get-or-create, joins, edits and the
//!   idle sweep
//! - [`ReminderScheduler`]: one-shot scheduling with per-slot cancellation
//! - [`CoreConfig`]: TOML tunables for reminder offsets and eviction

pub mod calendar;
pub mod config;
pub mod error;
pub mod event;
pub mod notify;
pub mod reminder;
pub mod stamp;
pub mod store;
pub mod sweep;

pub use calendar::{decode_invite, encode_invite, Calendar};
pub use config::CoreConfig;
pub use error::{CalendarError, ConfigError, CoreError, Result};
pub use event::{Event, UserId};
pub use notify::Notifier;
pub use reminder::{ReminderKey, ReminderScheduler};
pub use stamp::{DateKey, Stamp};
pub use store::{CalendarStore, SharedCalendar, UserIdentity};
pub use sweep::EvictionSweep;
