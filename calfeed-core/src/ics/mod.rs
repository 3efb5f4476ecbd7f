//! ICS feed download, parsing and generation.

mod download;
mod generate;
mod parse;

pub use download::{IcsDownloader, download_ics_file, feed_url, file_name_for};
pub use generate::generate_ics;
pub use parse::{
    CalendarMetadata, parse_events, parse_feed, parse_feed_str, parse_metadata, read_events,
    read_metadata,
};
