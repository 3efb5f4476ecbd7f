//! ICS generation for a whole calendar.

use icalendar::{Component, EventLike, Property, ValueType};

use crate::calendar::Calendar;
use crate::error::CalFeedResult;
use crate::event::{Event, EventDate};

const DEFAULT_PRODID: &str = "-//calfeed//EN";

/// Render `calendar` as an ICS document.
///
/// `PRODID` carries the calendar's service and `X-WR-CALNAME` its name, so
/// reading the output back yields the same metadata and structurally equal
/// events.
pub fn generate_ics(calendar: &Calendar) -> CalFeedResult<String> {
    let mut cal = icalendar::Calendar::new();

    if !calendar.name().is_empty() {
        cal.name(calendar.name());
    }

    for event in calendar.events() {
        cal.push(ics_event(event));
    }

    let prodid = if calendar.service().is_empty() {
        DEFAULT_PRODID
    } else {
        calendar.service()
    };

    Ok(replace_prodid(&cal.done().to_string(), prodid))
}

fn ics_event(event: &Event) -> icalendar::Event {
    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.instance().to_string());
    ics_event.summary(&event.summary);

    if !event.location.is_empty() {
        ics_event.location(&event.location);
    }

    add_date_property(&mut ics_event, "DTSTART", &event.start);
    add_date_property(&mut ics_event, "DTEND", &event.end);

    ics_event.done()
}

/// Typed dates are written in basic format, date-only ones with `VALUE=DATE`.
/// Dates that never parsed are written back as found.
fn add_date_property(ics_event: &mut icalendar::Event, name: &str, date: &EventDate) {
    match &date.value {
        Some(time) if time.is_date() => {
            let mut prop = Property::new(name, time.to_basic());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        Some(time) => {
            ics_event.add_property(name, time.to_basic());
        }
        None if date.raw.is_empty() => {}
        None => {
            ics_event.add_property(name, &date.raw);
        }
    }
}

/// The icalendar crate always writes its own PRODID.
fn replace_prodid(ics: &str, prodid: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(prodid);
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use crate::ics::{parse_events, parse_metadata};

    fn sample_calendar() -> Calendar {
        let start = EventTime::parse_basic("20240102T090000Z").unwrap();
        let end = EventTime::parse_basic("20240102T093000Z").unwrap();
        let day = EventTime::parse_basic("20240105").unwrap();

        Calendar::with_events(
            "Team",
            "-//Acme//EN",
            [
                Event::new("Standup", "Room 1", start, end),
                Event::new("Offsite", "", day, day),
                Event::from_dates(
                    "Broken",
                    "Somewhere",
                    EventDate::parse("notadate"),
                    EventDate::default(),
                ),
            ],
        )
    }

    #[test]
    fn test_metadata_is_written() {
        let ics = generate_ics(&sample_calendar()).unwrap();
        let metadata = parse_metadata(&ics);

        assert_eq!(metadata.service.as_deref(), Some("-//Acme//EN"));
        assert_eq!(metadata.name.as_deref(), Some("Team"));
        assert_eq!(ics.matches("PRODID:").count(), 1);
    }

    #[test]
    fn test_events_read_back_equal() {
        let calendar = sample_calendar();
        let ics = generate_ics(&calendar).unwrap();

        assert_eq!(parse_events(&ics), calendar.events());
    }

    #[test]
    fn test_date_only_values_are_marked() {
        let ics = generate_ics(&sample_calendar()).unwrap();
        assert!(ics.contains("DTSTART;VALUE=DATE:20240105"));
        assert!(ics.contains("DTSTART:20240102T090000Z"));
        assert!(ics.contains("DTSTART:notadate"));
    }

    #[test]
    fn test_empty_calendar_uses_default_prodid() {
        let ics = generate_ics(&Calendar::new("", "")).unwrap();
        let metadata = parse_metadata(&ics);

        assert_eq!(metadata.service.as_deref(), Some(DEFAULT_PRODID));
        assert_eq!(metadata.name, None);
        assert!(parse_events(&ics).is_empty());
    }
}
