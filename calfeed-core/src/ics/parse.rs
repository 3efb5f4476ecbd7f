//! Line-oriented ICS parsing.
//!
//! Only a small subset of iCalendar is recognized: `PRODID` and `X-WR-CALNAME`
//! at feed level, and `SUMMARY`, `LOCATION`, `DTSTART`, `DTEND` inside `VEVENT`
//! blocks. Every other line is skipped.

use std::borrow::Cow;
use std::convert::Infallible;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::iter::Peekable;
use std::mem;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::CalFeedResult;
use crate::event::{Event, EventDate};

const VEVENT: &str = "VEVENT";

/// Feed-level metadata. Either field is `None` when the feed omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMetadata {
    /// `PRODID`
    pub service: Option<String>,
    /// `X-WR-CALNAME`
    pub name: Option<String>,
}

/// A `NAME[;params]:VALUE` line. Parameters are dropped.
#[derive(Debug, PartialEq, Eq)]
struct ContentLine<'a> {
    name: &'a str,
    value: &'a str,
}

impl<'a> ContentLine<'a> {
    /// Split on the first `:`. Returns `None` for lines without one.
    fn parse(line: &'a str) -> Option<Self> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some((head, value)) = line.split_once(':') else {
            if !line.trim().is_empty() {
                trace!(line, "Skipping line without ':'");
            }
            return None;
        };
        let name = head.split_once(';').map_or(head, |(name, _params)| name);
        Some(ContentLine { name, value })
    }

    fn is_begin(&self, component: &str) -> bool {
        self.name == "BEGIN" && self.value == component
    }
}

// =============================================================================
// Metadata pass
// =============================================================================

/// Tracks the first `PRODID` and first `X-WR-CALNAME`.
#[derive(Default)]
struct MetadataScanner {
    metadata: CalendarMetadata,
    done: bool,
}

impl MetadataScanner {
    /// Feed one line. Returns `true` once scanning is complete, which happens as
    /// soon as the calendar name is captured.
    fn feed(&mut self, line: &ContentLine) -> bool {
        if self.done {
            return true;
        }
        match line.name {
            "PRODID" if self.metadata.service.is_none() => {
                self.metadata.service = Some(line.value.to_string());
            }
            "X-WR-CALNAME" => {
                self.metadata.name = Some(line.value.to_string());
                self.done = true;
            }
            _ => {}
        }
        self.done
    }
}

// =============================================================================
// Event pass
// =============================================================================

#[derive(Default)]
struct EventBuilder {
    summary: Option<String>,
    location: Option<String>,
    start: Option<EventDate>,
    end: Option<EventDate>,
}

impl EventBuilder {
    fn is_empty(&self) -> bool {
        self.summary.is_none()
            && self.location.is_none()
            && self.start.is_none()
            && self.end.is_none()
    }

    fn build(self) -> Event {
        Event::from_dates(
            self.summary.unwrap_or_default(),
            self.location.unwrap_or_default(),
            self.start.unwrap_or_default(),
            self.end.unwrap_or_default(),
        )
    }
}

/// Undo TEXT escaping (`\\`, `\;`, `\,`, `\n`). Unknown escapes are kept as-is.
fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => result.push('\n'),
            Some(escaped @ ('\\' | ';' | ',')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

fn parse_date(property: &str, value: &str) -> EventDate {
    let date = EventDate::parse(value);
    if !date.is_parsed() {
        warn!(property, value, "Could not parse date, keeping raw value");
    }
    date
}

enum EventState {
    Outside,
    /// Inside a `VEVENT`. `depth` counts nested components such as `VALARM`
    /// whose properties must not reach the event.
    Inside { depth: usize, event: EventBuilder },
}

struct EventScanner {
    state: EventState,
    events: Vec<Event>,
}

impl EventScanner {
    fn new() -> Self {
        EventScanner {
            state: EventState::Outside,
            events: Vec::new(),
        }
    }

    fn feed(&mut self, line: &ContentLine) {
        if let EventState::Outside = self.state {
            if line.is_begin(VEVENT) {
                self.state = EventState::Inside {
                    depth: 0,
                    event: EventBuilder::default(),
                };
            }
            return;
        }
        let EventState::Inside { depth, event } = &mut self.state else {
            return;
        };

        if *depth > 0 {
            match line.name {
                "BEGIN" => *depth += 1,
                "END" => *depth -= 1,
                _ => {}
            }
            return;
        }

        match line.name {
            "SUMMARY" => event.summary = Some(unescape_text(line.value)),
            "LOCATION" => event.location = Some(unescape_text(line.value)),
            "DTSTART" => event.start = Some(parse_date("DTSTART", line.value)),
            "DTEND" => event.end = Some(parse_date("DTEND", line.value)),
            "BEGIN" if line.value == VEVENT => {
                warn!("Found BEGIN:VEVENT inside an unterminated VEVENT, discarding it");
                *event = EventBuilder::default();
            }
            "BEGIN" => *depth += 1,
            "END" if line.value == VEVENT => {
                let event = mem::take(event);
                self.state = EventState::Outside;
                self.events.push(event.build());
            }
            _ => {}
        }
    }

    fn finish(self) -> Vec<Event> {
        if let EventState::Inside { event, .. } = self.state {
            if !event.is_empty() {
                warn!("Feed ended inside a VEVENT, discarding the partial event");
            }
        }
        self.events
    }
}

// =============================================================================
// Line reading
// =============================================================================

/// Joins folded lines: a physical line starting with a space or tab continues
/// the previous one. Trailing CRs are dropped.
struct Unfold<I: Iterator> {
    lines: Peekable<I>,
}

impl<I: Iterator> Unfold<I> {
    fn new(lines: I) -> Self {
        Unfold {
            lines: lines.peekable(),
        }
    }
}

fn is_fold(c: char) -> bool {
    c == ' ' || c == '\t'
}

impl<I, E> Iterator for Unfold<I>
where
    I: Iterator<Item = Result<String, E>>,
{
    type Item = Result<String, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        if line.ends_with('\r') {
            line.pop();
        }

        while let Some(Ok(next)) = self.lines.peek() {
            let Some(rest) = next.strip_prefix(is_fold) else {
                break;
            };
            line.push_str(rest.strip_suffix('\r').unwrap_or(rest));
            self.lines.next();
        }

        Some(Ok(line))
    }
}

/// Feed content lines to `f` until it returns `true` or the input ends.
fn scan<I, E>(lines: I, mut f: impl FnMut(&ContentLine) -> bool) -> Result<(), E>
where
    I: Iterator<Item = Result<String, E>>,
{
    for line in Unfold::new(lines) {
        let line = line?;
        if let Some(line) = ContentLine::parse(&line) {
            if f(&line) {
                break;
            }
        }
    }
    Ok(())
}

fn scan_text(text: &str, f: impl FnMut(&ContentLine) -> bool) {
    let lines = text.split('\n').map(|line| Ok::<_, Infallible>(line.to_string()));
    if let Err(never) = scan(lines, f) {
        match never {}
    }
}

/// Physical lines of a reader. Bytes that are not valid UTF-8 are replaced
/// rather than failing the whole read.
struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                let line = String::from_utf8_lossy(&self.buf);
                if let Cow::Owned(_) = line {
                    warn!(line = %line, "Replaced invalid UTF-8 in line");
                }
                Some(Ok(line.into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

fn scan_file(path: &Path, f: impl FnMut(&ContentLine) -> bool) -> CalFeedResult<()> {
    let lines = LossyLines {
        reader: BufReader::new(File::open(path)?),
        buf: Vec::new(),
    };
    scan(lines, f)?;
    Ok(())
}

// =============================================================================
// Public API
// =============================================================================

/// Extract `(PRODID, X-WR-CALNAME)` from ICS text.
pub fn parse_metadata(text: &str) -> CalendarMetadata {
    let mut scanner = MetadataScanner::default();
    scan_text(text, |line| scanner.feed(line));
    scanner.metadata
}

/// Extract every terminated `VEVENT` from ICS text, in document order.
pub fn parse_events(text: &str) -> Vec<Event> {
    let mut scanner = EventScanner::new();
    scan_text(text, |line| {
        scanner.feed(line);
        false
    });
    scanner.finish()
}

/// Metadata and events from ICS text in one pass.
pub fn parse_feed_str(text: &str) -> (CalendarMetadata, Vec<Event>) {
    let mut metadata = MetadataScanner::default();
    let mut events = EventScanner::new();
    scan_text(text, |line| {
        metadata.feed(line);
        events.feed(line);
        false
    });
    (metadata.metadata, events.finish())
}

/// Read the metadata of an ICS file. Reading stops at the first `X-WR-CALNAME`.
pub fn read_metadata(path: &Path) -> CalFeedResult<CalendarMetadata> {
    let mut scanner = MetadataScanner::default();
    scan_file(path, |line| scanner.feed(line))?;
    debug!(path = %path.display(), metadata = ?scanner.metadata, "Read calendar metadata");
    Ok(scanner.metadata)
}

/// Read the events of an ICS file.
pub fn read_events(path: &Path) -> CalFeedResult<Vec<Event>> {
    let mut scanner = EventScanner::new();
    scan_file(path, |line| {
        scanner.feed(line);
        false
    })?;
    let events = scanner.finish();
    debug!(path = %path.display(), count = events.len(), "Read events");
    Ok(events)
}

/// Read metadata and events of an ICS file in a single pass.
pub fn parse_feed(path: &Path) -> CalFeedResult<(CalendarMetadata, Vec<Event>)> {
    let mut metadata = MetadataScanner::default();
    let mut events = EventScanner::new();
    scan_file(path, |line| {
        metadata.feed(line);
        events.feed(line);
        false
    })?;
    Ok((metadata.metadata, events.finish()))
}
