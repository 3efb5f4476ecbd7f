//! In-memory calendar aggregate.
//!
//! A [`Calendar`] owns its events and keeps two invariants:
//! - every stored event's owner is this calendar's [`CalendarId`]
//! - no two stored events are structurally equal
//!
//! Events point back to their calendar through the id only, so there is no
//! ownership cycle between the two.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CalFeedResult;
use crate::event::{Event, EventKey};
use crate::ics::{self, CalendarMetadata};

/// Non-owning handle to a [`Calendar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarId(Uuid);

impl CalendarId {
    pub fn new() -> Self {
        CalendarId(Uuid::new_v4())
    }
}

impl Default for CalendarId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct Calendar {
    id: CalendarId,
    name: String,
    service: String,
    events: Vec<Event>,
    index: HashSet<EventKey>,
}

impl Calendar {
    pub fn new(name: impl Into<String>, service: impl Into<String>) -> Self {
        Calendar {
            id: CalendarId::new(),
            name: name.into(),
            service: service.into(),
            events: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Create a calendar seeded with `events`, dropping duplicates.
    pub fn with_events(
        name: impl Into<String>,
        service: impl Into<String>,
        events: impl IntoIterator<Item = Event>,
    ) -> Self {
        let mut calendar = Self::new(name, service);
        for event in events {
            calendar.add_event(event);
        }
        calendar
    }

    /// Assemble a calendar from the results of a feed parse.
    /// Missing metadata becomes an empty name/service.
    pub fn from_feed(metadata: CalendarMetadata, events: Vec<Event>) -> Self {
        Self::with_events(
            metadata.name.unwrap_or_default(),
            metadata.service.unwrap_or_default(),
            events,
        )
    }

    /// Parse an ICS file into a calendar in a single pass.
    pub fn from_ics_file(path: &Path) -> CalFeedResult<Self> {
        let (metadata, events) = ics::parse_feed(path)?;
        Ok(Self::from_feed(metadata, events))
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn set_service(&mut self, service: impl Into<String>) {
        self.service = service.into();
    }

    /// Events in insertion order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether a structurally equal event is stored.
    pub fn contains(&self, event: &Event) -> bool {
        self.index.contains(&event.key())
    }

    /// Add an event unless a structurally equal one is already stored.
    ///
    /// Returns `true` if the event was inserted. An inserted event is owned by
    /// this calendar from then on.
    pub fn add_event(&mut self, mut event: Event) -> bool {
        if !self.index.insert(event.key()) {
            return false;
        }
        event.set_owner(Some(self.id));
        self.events.push(event);
        true
    }

    /// Remove at most one event.
    ///
    /// The stored instance `event` was cloned from is preferred; otherwise the
    /// first structurally equal event is taken. The removed event is returned
    /// with its owner cleared.
    pub fn remove_event(&mut self, event: &Event) -> Option<Event> {
        let position = self
            .events
            .iter()
            .position(|e| e.instance() == event.instance() && e == event)
            .or_else(|| self.events.iter().position(|e| e == event))?;

        let mut removed = self.events.remove(position);
        self.index.remove(&removed.key());
        removed.set_owner(None);
        Some(removed)
    }

    /// Merge `other` into this calendar.
    ///
    /// Equivalent to calling [`Calendar::add_event`] for each of `other`'s events
    /// in order: new events are appended after the existing ones and become
    /// owned by this calendar, duplicates are dropped.
    pub fn merge(&mut self, other: Calendar) -> usize {
        other
            .events
            .into_iter()
            .map(|event| self.add_event(event))
            .filter(|added| *added)
            .count()
    }
}

/// A clone is a separate calendar: it gets its own id and owns its copies of
/// the events.
impl Clone for Calendar {
    fn clone(&self) -> Self {
        let id = CalendarId::new();
        let events = self
            .events
            .iter()
            .map(|event| {
                let mut event = event.clone();
                event.set_owner(Some(id));
                event
            })
            .collect();

        Calendar {
            id,
            name: self.name.clone(),
            service: self.service.clone(),
            events,
            index: self.index.clone(),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "(unnamed calendar)")
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventDate, EventTime};

    fn event(summary: &str, start: &str, end: &str) -> Event {
        Event::new(
            summary,
            "Room 1",
            EventTime::parse_basic(start).unwrap(),
            EventTime::parse_basic(end).unwrap(),
        )
    }

    fn e1() -> Event {
        event("Standup", "20240102T090000Z", "20240102T093000Z")
    }

    fn e2() -> Event {
        event("Retro", "20240105T150000Z", "20240105T160000Z")
    }

    fn assert_invariants(calendar: &Calendar) {
        for event in calendar.events() {
            assert_eq!(event.owner(), Some(calendar.id()), "owner of {event}");
        }
        for (i, a) in calendar.events().iter().enumerate() {
            for b in &calendar.events()[i + 1..] {
                assert_ne!(a, b, "duplicate events stored");
            }
        }
        assert_eq!(calendar.index.len(), calendar.events.len());
    }

    #[test]
    fn test_add_event_sets_owner() {
        let mut calendar = Calendar::new("Team", "-//Acme//EN");
        assert!(calendar.add_event(e1()));

        assert_eq!(calendar.len(), 1);
        assert_invariants(&calendar);
    }

    #[test]
    fn test_add_event_suppresses_duplicates() {
        let mut calendar = Calendar::new("Team", "-//Acme//EN");

        assert!(calendar.add_event(e1()));
        assert!(!calendar.add_event(e1()));
        assert!(calendar.add_event(e2()));

        assert_eq!(calendar.events(), &[e1(), e2()]);
        assert_invariants(&calendar);
    }

    #[test]
    fn test_add_event_is_idempotent() {
        let mut calendar = Calendar::new("Team", "");
        calendar.add_event(e1());
        let before: Vec<_> = calendar.events().iter().map(Event::instance).collect();

        calendar.add_event(e1());
        calendar.add_event(e1());

        let after: Vec<_> = calendar.events().iter().map(Event::instance).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_duplicate_with_unparsed_dates() {
        let make = || {
            Event::from_dates(
                "Broken",
                "",
                EventDate::parse("notadate"),
                EventDate::parse("20240102"),
            )
        };
        let mut calendar = Calendar::new("", "");
        assert!(calendar.add_event(make()));
        assert!(!calendar.add_event(make()));
        assert_eq!(calendar.len(), 1);
    }

    #[test]
    fn test_remove_event_prefers_exact_instance() {
        let mut calendar = Calendar::new("Team", "");
        calendar.add_event(e1());
        calendar.add_event(e2());

        let stored = calendar.events()[0].clone();
        let removed = calendar.remove_event(&stored).expect("event removed");

        assert_eq!(removed.instance(), stored.instance());
        assert_eq!(removed.owner(), None);
        assert_eq!(calendar.events(), &[e2()]);
        assert_invariants(&calendar);
    }

    #[test]
    fn test_remove_event_falls_back_to_structural_match() {
        let mut calendar = Calendar::new("Team", "");
        calendar.add_event(e1());

        let removed = calendar.remove_event(&e1()).expect("structural match removed");
        assert_eq!(removed, e1());
        assert!(calendar.is_empty());

        // Removing again is a no-op
        assert!(calendar.remove_event(&e1()).is_none());
    }

    #[test]
    fn test_removed_event_can_be_added_again() {
        let mut calendar = Calendar::new("Team", "");
        calendar.add_event(e1());
        let removed = calendar.remove_event(&e1()).unwrap();

        assert!(calendar.add_event(removed));
        assert_invariants(&calendar);
    }

    #[test]
    fn test_merge_transfers_ownership() {
        let mut a = Calendar::with_events("A", "", [e1()]);
        let b = Calendar::with_events("B", "", [e1(), e2()]);
        let b_id = b.id();

        let added = a.merge(b);

        assert_eq!(added, 1);
        assert_eq!(a.events(), &[e1(), e2()]);
        assert!(a.events().iter().all(|e| e.owner() == Some(a.id())));
        assert!(a.events().iter().all(|e| e.owner() != Some(b_id)));
        assert_invariants(&a);
    }

    #[test]
    fn test_merge_equals_replayed_add() {
        let e3 = event("Planning", "20240108", "20240109");
        let mut merged = Calendar::with_events("A", "", [e2()]);
        let mut replayed = Calendar::with_events("A", "", [e2()]);
        let other = Calendar::with_events("B", "", [e3.clone(), e1(), e2()]);

        for event in other.events() {
            replayed.add_event(event.clone());
        }
        merged.merge(other);

        assert_eq!(merged.events(), replayed.events());
    }

    #[test]
    fn test_with_events_drops_seed_duplicates() {
        let calendar = Calendar::with_events("A", "", [e1(), e2(), e1()]);
        assert_eq!(calendar.events(), &[e1(), e2()]);
        assert_invariants(&calendar);
    }

    #[test]
    fn test_clone_is_a_separate_calendar() {
        let mut original = Calendar::with_events("Team", "-//Acme//EN", [e1(), e2()]);
        let mut copy = original.clone();

        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.events(), original.events());
        assert_invariants(&original);
        assert_invariants(&copy);

        copy.remove_event(&e1());
        assert_eq!(original.events(), &[e1(), e2()]);
        assert!(original.add_event(event("Planning", "20240108", "20240109")));
        assert_eq!(copy.events(), &[e2()]);
    }

    #[test]
    fn test_from_feed_defaults_missing_metadata() {
        let calendar = Calendar::from_feed(CalendarMetadata::default(), vec![e1()]);
        assert_eq!(calendar.name(), "");
        assert_eq!(calendar.service(), "");
        assert_eq!(calendar.to_string(), "(unnamed calendar)");
        assert_eq!(calendar.len(), 1);
    }
}
