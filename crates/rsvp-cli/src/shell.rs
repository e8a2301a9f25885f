//! Command loop translating text lines into core operations.
//!
//! Grammar, one command per line (`#` starts a comment):
//!
//! ```text
//! publish <user-id> <display-name> <date>...
//! join <user-id> <display-name> <invite> <date>
//! remove <user-id> <date>
//! edit <user-id> name|description <value...>
//! notify <user-id> on|off
//! link <user-id>
//! list <invite>
//! sweep
//! quit
//! ```
//!
//! Dates accept `today`, `tomorrow` or `DD/MM/YYYY-hh:mm`.

use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

use rsvp_core::{
    CalendarStore, CoreConfig, CoreError, EvictionSweep, Notifier, Stamp, UserId, UserIdentity,
};

/// Prints every delivery, standing in for the chat transport.
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn send(&self, user: UserId, text: &str) {
        println!("[notify -> {user}] {text}");
    }
}

pub async fn run(config: Option<&Path>, script: Option<&Path>) -> Result<(), CoreError> {
    let config = match config {
        Some(path) => CoreConfig::load(path)?,
        None => CoreConfig::default(),
    };
    let store = CalendarStore::new(Arc::new(StdoutNotifier), config.clone());
    let sweep = EvictionSweep::spawn(store.clone(), config.sweep_period(), config.idle_threshold());

    let lines: Box<dyn Iterator<Item = io::Result<String>>> = match script {
        Some(path) => Box::new(io::BufReader::new(std::fs::File::open(path)?).lines()),
        None => Box::new(io::stdin().lock().lines()),
    };

    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" {
            break;
        }
        match dispatch(&store, line).await {
            Ok(output) => println!("{output}"),
            Err(err) => println!("!! {err}"),
        }
    }

    sweep.stop();
    Ok(())
}

async fn dispatch(store: &Arc<CalendarStore>, line: &str) -> Result<String, CoreError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let (&command, args) = words.split_first().unwrap_or((&"", &[]));

    match command {
        "publish" => {
            let [id, name, raw_dates @ ..] = args else {
                return Ok(usage("publish <user-id> <display-name> <date>..."));
            };
            if raw_dates.is_empty() {
                return Ok(usage("publish <user-id> <display-name> <date>..."));
            }
            let Some(who) = parse_identity(id, name) else {
                return Ok(usage("publish <user-id> <display-name> <date>..."));
            };
            let mut dates = Vec::with_capacity(raw_dates.len());
            for raw in raw_dates {
                dates.push(Stamp::parse(raw).map_err(CoreError::Calendar)?);
            }
            let shared = store.add_dates(&who, &dates).await;
            let calendar = shared.lock().await;
            Ok(format!(
                "calendar '{}' now lists {} date(s), invite: {}",
                calendar.name(),
                calendar.date_count(),
                calendar.invite()
            ))
        }
        "join" => {
            let [id, name, invite, raw_date] = args else {
                return Ok(usage("join <user-id> <display-name> <invite> <date>"));
            };
            let Some(who) = parse_identity(id, name) else {
                return Ok(usage("join <user-id> <display-name> <invite> <date>"));
            };
            let shared = store.join_via_invite(&who, invite, raw_date).await?;
            let calendar = shared.lock().await;
            Ok(format!("joined '{}'", calendar.name()))
        }
        "remove" => {
            let [id, raw_date] = args else {
                return Ok(usage("remove <user-id> <date>"));
            };
            let (Ok(owner), Ok(date)) = (id.parse::<UserId>(), Stamp::parse(raw_date)) else {
                return Ok(usage("remove <user-id> <date>"));
            };
            match store.remove_date(owner, &date.key()).await {
                Some(event) => Ok(format!(
                    "removed {date}, {} attendee(s) dropped",
                    event.count_attendee()
                )),
                None => Ok(format!("no such date: {date}")),
            }
        }
        "edit" => {
            let [id, field, value @ ..] = args else {
                return Ok(usage("edit <user-id> name|description <value...>"));
            };
            let (Ok(owner), false) = (id.parse::<UserId>(), value.is_empty()) else {
                return Ok(usage("edit <user-id> name|description <value...>"));
            };
            let value = value.join(" ");
            match *field {
                "name" => store.rename(owner, &value).await?,
                "description" => store.set_description(owner, &value).await?,
                other => return Ok(format!("unknown field: {other}")),
            }
            Ok(format!("{field} changed to: {value}"))
        }
        "notify" => {
            let [id, state] = args else {
                return Ok(usage("notify <user-id> on|off"));
            };
            let Ok(owner) = id.parse::<UserId>() else {
                return Ok(usage("notify <user-id> on|off"));
            };
            let enabled = match *state {
                "on" => true,
                "off" => false,
                other => return Ok(format!("unknown state: {other}, use on or off")),
            };
            store.set_notifications(owner, enabled).await?;
            Ok(format!("notifications {state}"))
        }
        "link" => {
            let [id] = args else {
                return Ok(usage("link <user-id>"));
            };
            let Ok(owner) = id.parse::<UserId>() else {
                return Ok(usage("link <user-id>"));
            };
            match store.calendar_of(owner).await {
                Some(shared) => Ok(format!("invite: {}", shared.lock().await.invite())),
                None => Ok("no calendar yet, publish a date first".to_string()),
            }
        }
        "list" => {
            let [invite] = args else {
                return Ok(usage("list <invite>"));
            };
            let Some(shared) = store.by_invite(invite).await else {
                return Ok("no calendar for this invite".to_string());
            };
            let calendar = shared.lock().await;
            let mut out = format!("{}: {}", calendar.name(), calendar.description());
            let mut dates: Vec<_> = calendar.dates().collect();
            // Key strings are day-first, so chronological order needs the
            // parsed instant.
            dates.sort_by_key(|(key, _)| {
                Stamp::parse(key.as_str()).ok().map(|stamp| stamp.instant())
            });
            for (key, event) in dates {
                out.push_str(&format!("\n  {key} ({} joined)", event.count_attendee()));
            }
            Ok(out)
        }
        "sweep" => {
            let evicted = store.sweep_idle(store.config().idle_threshold()).await;
            Ok(format!("{evicted} calendar(s) evicted"))
        }
        other => Ok(format!("unknown command: {other}")),
    }
}

fn parse_identity(id: &str, name: &str) -> Option<UserIdentity> {
    Some(UserIdentity {
        id: id.parse().ok()?,
        display_name: name.to_string(),
    })
}

fn usage(grammar: &str) -> String {
    format!("usage: {grammar}")
}
