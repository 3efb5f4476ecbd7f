//! Calendar event types.
//!
//! An [`Event`] is a plain value record. Its identity is structural: two events are
//! equal when summary, location, start and end match. The owning calendar and the
//! per-instance handle ride along but never take part in comparisons.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::CalendarId;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A typed ICS date value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTime {
    /// `YYYYMMDD`
    Date(NaiveDate),
    /// `YYYYMMDDTHHMMSSZ`
    DateTimeUtc(DateTime<Utc>),
    /// `YYYYMMDDTHHMMSS` (no zone information)
    DateTimeFloating(NaiveDateTime),
}

impl EventTime {
    /// Parse an ICS basic-format date or date-time.
    ///
    /// Accepts exactly `YYYYMMDD`, `YYYYMMDDTHHMMSS` and `YYYYMMDDTHHMMSSZ`
    /// (surrounding whitespace is ignored). Returns `None` for anything else.
    pub fn parse_basic(value: &str) -> Option<Self> {
        let value = value.trim();

        match value.len() {
            8 => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .map(EventTime::Date),
            15 => NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
                .ok()
                .map(EventTime::DateTimeFloating),
            16 => {
                let naive = value.strip_suffix('Z')?;
                NaiveDateTime::parse_from_str(naive, DATE_TIME_FORMAT)
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            }
            _ => None,
        }
    }

    /// Format back to ICS basic format.
    pub fn to_basic(&self) -> String {
        match self {
            EventTime::Date(d) => d.format(DATE_FORMAT).to_string(),
            EventTime::DateTimeUtc(dt) => format!("{}Z", dt.format(DATE_TIME_FORMAT)),
            EventTime::DateTimeFloating(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
        }
    }
}

/// A `DTSTART`/`DTEND` value: the text found in the feed plus its typed form, if
/// the text could be interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDate {
    pub raw: String,
    pub value: Option<EventTime>,
}

impl EventDate {
    /// Interpret `raw` as an ICS basic-format date. The raw text is kept either way.
    pub fn parse(raw: &str) -> Self {
        EventDate {
            raw: raw.to_string(),
            value: EventTime::parse_basic(raw),
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.value.is_some()
    }
}

impl From<EventTime> for EventDate {
    fn from(time: EventTime) -> Self {
        EventDate {
            raw: time.to_basic(),
            value: Some(time),
        }
    }
}

// Typed values compare by instant; untyped ones fall back to their raw text.
impl PartialEq for EventDate {
    fn eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.raw == other.raw,
            _ => false,
        }
    }
}

impl Eq for EventDate {}

impl Hash for EventDate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.value {
            Some(value) => {
                0u8.hash(state);
                value.hash(state);
            }
            None => {
                1u8.hash(state);
                self.raw.hash(state);
            }
        }
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{value}"),
            None if self.raw.is_empty() => write!(f, "?"),
            None => write!(f, "{} (unparsed)", self.raw),
        }
    }
}

fn new_instance() -> Uuid {
    Uuid::new_v4()
}

/// A single calendar entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub summary: String,
    /// Empty when the feed has no `LOCATION`.
    #[serde(default)]
    pub location: String,
    pub start: EventDate,
    pub end: EventDate,

    /// Handle of this particular instance. Clones share it.
    #[serde(skip, default = "new_instance")]
    instance: Uuid,

    /// Calendar currently holding this event.
    #[serde(skip)]
    owner: Option<CalendarId>,
}

impl Event {
    pub fn new(
        summary: impl Into<String>,
        location: impl Into<String>,
        start: EventTime,
        end: EventTime,
    ) -> Self {
        Self::from_dates(summary, location, start.into(), end.into())
    }

    /// Build an event from dates that may not have parsed.
    pub fn from_dates(
        summary: impl Into<String>,
        location: impl Into<String>,
        start: EventDate,
        end: EventDate,
    ) -> Self {
        Event {
            summary: summary.into(),
            location: location.into(),
            start,
            end,
            instance: new_instance(),
            owner: None,
        }
    }

    pub fn instance(&self) -> Uuid {
        self.instance
    }

    pub fn owner(&self) -> Option<CalendarId> {
        self.owner
    }

    pub fn set_owner(&mut self, owner: Option<CalendarId>) {
        self.owner = owner;
    }

    pub(crate) fn key(&self) -> EventKey {
        EventKey {
            summary: self.summary.clone(),
            location: self.location.clone(),
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.summary == other.summary
            && self.location == other.location
            && self.start == other.start
            && self.end == other.end
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.summary.hash(state);
        self.location.hash(state);
        self.start.hash(state);
        self.end.hash(state);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} - {})", self.summary, self.start, self.end)?;
        if !self.location.is_empty() {
            write!(f, " @ {}", self.location)?;
        }
        Ok(())
    }
}

/// Structural identity of an event, as stored in a calendar's duplicate index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct EventKey {
    summary: String,
    location: String,
    start: EventDate,
    end: EventDate,
}
