use std::path::Path;

use anyhow::Result;

use super::{print_events, read_calendar};

pub fn run(file: &Path) -> Result<()> {
    let calendar = read_calendar(file)?;

    println!("📅 {} ({} events)", calendar, calendar.len());
    print_events(&calendar);
    Ok(())
}
