//! The `show` command.

use std::path::Path;

use chrono::{DateTime, Utc};

use coursecal_core::{Calendar, CalendarContent, CalendarItem};

use crate::cli::ImportArgs;
use crate::commands::ReadPolicy;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn item_line(item: &CalendarItem) -> String {
    match item {
        CalendarItem::Course(course) => {
            let recurring = course.events().iter().filter(|e| e.is_recurring()).count();
            let mut line = format!(
                "  course  {}: {}",
                course.summary(),
                plural(course.len(), "event")
            );
            if recurring > 0 {
                line.push_str(&format!(", {recurring} recurring"));
            }
            line
        }
        CalendarItem::Standalone(standalone) => {
            let event = standalone.event();
            format!(
                "  event   {}: {}",
                event.summary,
                format_instant(event.start())
            )
        }
    }
}

/// Builds the human-readable overview of a calendar.
pub fn overview(calendar: &Calendar) -> Vec<String> {
    let mut lines = vec![format!("Calendar: {}", calendar.name())];
    if let Some(path) = calendar.path() {
        lines.push(format!("Path: {}", path.display()));
    }
    lines.push(format!(
        "Items: {}, {}",
        plural(calendar.course_count(), "course"),
        plural(calendar.standalone_count(), "standalone event")
    ));
    if let Some((first, last)) = calendar.time_bounds() {
        lines.push(format!(
            "Span: {} .. {}",
            format_instant(first),
            format_instant(last)
        ));
    }
    for item in calendar.items() {
        if item.time_bounds().is_some() {
            lines.push(item_line(item));
        }
    }
    lines
}

/// Prints an overview, or the whole calendar as JSON.
pub fn run(input: &Path, json: bool, import: &ImportArgs, config: &ClientConfig) -> ClientResult<()> {
    let policy = ReadPolicy::resolve(config, import)?;
    let calendar = policy.load(input)?;

    if json {
        let text = serde_json::to_string_pretty(&calendar)
            .map_err(|e| ClientError::Io(std::io::Error::other(e)))?;
        println!("{text}");
    } else {
        for line in overview(&calendar) {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{TWO_WEEKS, write_file};
    use chrono::TimeZone;
    use coursecal_core::{Event, Standalone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn overview_lists_items() {
        let mut calendar = Calendar::new("Spring");
        for week in 0..2 {
            let start = utc(2021, 2, 15, 13, 30) + chrono::Duration::weeks(week);
            calendar.add_event(
                Event::new("CPS 2231", start, start + chrono::Duration::minutes(105)).unwrap(),
            );
        }
        calendar.add(Standalone::new(
            Event::new("Dentist", utc(2021, 7, 1, 13, 0), utc(2021, 7, 1, 14, 0)).unwrap(),
        ));
        calendar.optimize_courses();

        insta::assert_snapshot!(overview(&calendar).join("\n"), @r"
        Calendar: Spring
        Items: 1 course, 1 standalone event
        Span: 2021-02-15 13:30 UTC .. 2021-07-01 14:00 UTC
          course  CPS 2231: 1 event, 1 recurring
          event   Dentist: 2021-07-01 13:00 UTC
        ");
    }

    #[test]
    fn overview_of_empty_calendar() {
        insta::assert_snapshot!(overview(&Calendar::default()).join("\n"), @r"
        Calendar: My Calendar
        Items: 0 courses, 0 standalone events
        ");
    }

    #[test]
    fn overview_of_loaded_file_has_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "spring.ics", TWO_WEEKS);
        let policy = ReadPolicy::resolve(&ClientConfig::default(), &ImportArgs::default()).unwrap();
        let lines = overview(&policy.load(&path).unwrap());

        assert_eq!(lines[0], "Calendar: spring");
        assert_eq!(lines[1], format!("Path: {}", path.display()));
        assert_eq!(lines[4], "  course  CPS 2231: 2 events");
    }

    #[test]
    fn run_fails_on_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "broken.ics", "VERSION:2.0\n");
        let err = run(&path, false, &ImportArgs::default(), &ClientConfig::default()).unwrap_err();
        assert!(matches!(err, ClientError::Calendar(_)));
    }
}
