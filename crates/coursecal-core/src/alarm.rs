//! Display reminders attached to events.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

/// Lead time used when an alarm is created without one.
pub const DEFAULT_LEAD_MINUTES: u32 = 30;

/// `-PT<n>M`, the only trigger shape this crate writes.
static TRIGGER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-PT(\d+)M$").expect("Invalid trigger regex"));

/// A reminder shown some minutes before an event starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    /// Minutes before the event start.
    pub lead_minutes: u32,
    /// Text shown with the reminder.
    pub description: String,
}

impl Alarm {
    /// Creates an alarm.
    pub fn new(lead_minutes: u32, description: impl Into<String>) -> Self {
        Self {
            lead_minutes,
            description: description.into(),
        }
    }

    /// Creates an alarm with the default 30-minute lead time.
    pub fn with_description(description: impl Into<String>) -> Self {
        Self::new(DEFAULT_LEAD_MINUTES, description)
    }

    /// Renders the `VALARM` block, each line newline-terminated.
    pub fn render_fragment(&self) -> String {
        format!(
            "BEGIN:VALARM\nACTION:DISPLAY\nTRIGGER;RELATED=START:-PT{}M\nDESCRIPTION:{}\nEND:VALARM\n",
            self.lead_minutes, self.description
        )
    }

    /// Parses a trigger value of the form `-PT<n>M` into a lead time.
    pub fn parse_trigger(value: &str) -> CalendarResult<u32> {
        let caps = TRIGGER_REGEX.captures(value).ok_or_else(|| {
            CalendarError::invalid("trigger", format!("'{value}' is not of the form -PT<n>M"))
        })?;
        caps[1]
            .parse()
            .map_err(|_| CalendarError::invalid("trigger", format!("'{value}' is out of range")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lead_time() {
        let alarm = Alarm::with_description("CPS 2231");
        assert_eq!(alarm.lead_minutes, 30);
        assert_eq!(alarm.description, "CPS 2231");
    }

    #[test]
    fn render_fragment_is_exact() {
        let alarm = Alarm::new(15, "CPS*2231*W01 COMPUTER ORGAN &");
        assert_eq!(
            alarm.render_fragment(),
            "BEGIN:VALARM\n\
             ACTION:DISPLAY\n\
             TRIGGER;RELATED=START:-PT15M\n\
             DESCRIPTION:CPS*2231*W01 COMPUTER ORGAN &\n\
             END:VALARM\n"
        );
    }

    #[test]
    fn zero_lead_renders() {
        let alarm = Alarm::new(0, "now");
        assert!(alarm.render_fragment().contains("TRIGGER;RELATED=START:-PT0M\n"));
    }

    #[test]
    fn parse_trigger_values() {
        assert_eq!(Alarm::parse_trigger("-PT15M").unwrap(), 15);
        assert_eq!(Alarm::parse_trigger("-PT0M").unwrap(), 0);
        assert!(Alarm::parse_trigger("PT15M").is_err());
        assert!(Alarm::parse_trigger("-PT1H").is_err());
        assert!(Alarm::parse_trigger("-PT99999999999M").is_err());
    }
}
