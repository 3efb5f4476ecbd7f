//! Core library for calfeed.
//!
//! Downloads ICS feeds, reads them into [`Calendar`]s of [`Event`]s and moves
//! events between calendars through [`provider`]s.

pub mod calendar;
pub mod config;
pub mod error;
pub mod event;
pub mod ics;
mod persist;
pub mod provider;

pub use calendar::{Calendar, CalendarId};
pub use config::Config;
pub use error::{CalFeedError, CalFeedResult};
pub use event::{Event, EventDate, EventTime};
pub use provider::{Provider, ProviderManager, SessionContext};
