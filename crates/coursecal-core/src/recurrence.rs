//! Recurrence rules for repeating events.
//!
//! A [`Recurrence`] is the restricted subset of an iCalendar `RRULE` this crate
//! supports: a frequency, an interval, an inclusive end instant, and a list of
//! exception instants rendered as `EXDATE`.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CalendarError, CalendarResult};
use crate::time::{format_timestamp, parse_timestamp_in};

/// How often a recurrence repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// An out-of-range frequency code, kept as-is.
    Unknown(i32),
}

impl Frequency {
    /// Maps a numeric frequency code (0 = daily .. 3 = yearly).
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Daily,
            1 => Self::Weekly,
            2 => Self::Monthly,
            3 => Self::Yearly,
            other => Self::Unknown(other),
        }
    }

    /// Returns the numeric code of this frequency.
    pub fn code(&self) -> i32 {
        match self {
            Self::Daily => 0,
            Self::Weekly => 1,
            Self::Monthly => 2,
            Self::Yearly => 3,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns the `FREQ=` keyword, or `UNKNOWN` for out-of-range codes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
            Self::Unknown(_) => "UNKNOWN",
        }
    }

    /// Parses a `FREQ=` keyword.
    pub fn parse(keyword: &str) -> CalendarResult<Self> {
        match keyword {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            other => Err(CalendarError::invalid(
                "frequency",
                format!("unsupported FREQ value '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repeating schedule owned by one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceFields")]
pub struct Recurrence {
    frequency: Frequency,
    /// Inclusive upper bound of the series.
    until: DateTime<Utc>,
    interval: u32,
    /// Skipped occurrences, in insertion order.
    exceptions: Vec<DateTime<Utc>>,
}

impl Recurrence {
    /// Creates a recurrence.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidField`] if `interval` is zero.
    pub fn new(frequency: Frequency, until: DateTime<Utc>, interval: u32) -> CalendarResult<Self> {
        check_interval(interval)?;
        Ok(Self {
            frequency,
            until,
            interval,
            exceptions: Vec::new(),
        })
    }

    /// Creates a weekly, interval-1 recurrence ending at `until`.
    pub fn weekly_until(until: DateTime<Utc>) -> Self {
        Self {
            frequency: Frequency::Weekly,
            until,
            interval: 1,
            exceptions: Vec::new(),
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.frequency = frequency;
    }

    pub fn until(&self) -> DateTime<Utc> {
        self.until
    }

    pub fn set_until(&mut self, until: DateTime<Utc>) {
        self.until = until;
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Sets the interval.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidField`] if `interval` is zero.
    pub fn set_interval(&mut self, interval: u32) -> CalendarResult<()> {
        check_interval(interval)?;
        self.interval = interval;
        Ok(())
    }

    pub fn exceptions(&self) -> &[DateTime<Utc>] {
        &self.exceptions
    }

    /// Appends an exception instant.
    pub fn add_exception(&mut self, instant: DateTime<Utc>) {
        self.exceptions.push(instant);
    }

    /// Builder method to append an exception instant.
    pub fn with_exception(mut self, instant: DateTime<Utc>) -> Self {
        self.exceptions.push(instant);
        self
    }

    /// Applies `f` to the end instant and every exception.
    pub(crate) fn map_instants(&mut self, f: impl Fn(DateTime<Utc>) -> DateTime<Utc>) {
        self.until = f(self.until);
        for exception in &mut self.exceptions {
            *exception = f(*exception);
        }
    }

    /// Renders the `RRULE` line and, when exceptions exist, the `EXDATE` line.
    ///
    /// Each line is newline-terminated. An unknown frequency renders as
    /// `UNKNOWN` and is logged.
    pub fn render_fragment(&self) -> String {
        if let Frequency::Unknown(code) = self.frequency {
            warn!(code, "Rendering recurrence with unknown frequency");
        }

        let mut out = format!(
            "RRULE:FREQ={};UNTIL={};INTERVAL={}\n",
            self.frequency,
            format_timestamp(&self.until),
            self.interval
        );

        if !self.exceptions.is_empty() {
            let dates: Vec<String> = self.exceptions.iter().map(format_timestamp).collect();
            out.push_str("EXDATE:");
            out.push_str(&dates.join(","));
            out.push('\n');
        }

        out
    }

    /// Parses the value of an `RRULE:` line (`FREQ=..;UNTIL=..;INTERVAL=..`).
    ///
    /// `FREQ` and `UNTIL` are required, `INTERVAL` defaults to 1. Any other
    /// rule part is rejected.
    pub fn parse_rule(value: &str) -> CalendarResult<Self> {
        Self::parse_rule_in(value, &Utc)
    }

    /// Like [`Recurrence::parse_rule`], reading a naive `UNTIL` in `zone`.
    pub fn parse_rule_in<Tz: TimeZone>(value: &str, zone: &Tz) -> CalendarResult<Self> {
        let mut frequency = None;
        let mut until = None;
        let mut interval = 1;

        for part in value.split(';').filter(|p| !p.is_empty()) {
            let (key, val) = part.split_once('=').ok_or_else(|| {
                CalendarError::invalid("recurrence", format!("rule part '{part}' has no value"))
            })?;
            match key {
                "FREQ" => frequency = Some(Frequency::parse(val)?),
                "UNTIL" => until = Some(parse_timestamp_in(val, zone)?),
                "INTERVAL" => {
                    interval = val.parse::<u32>().map_err(|_| {
                        CalendarError::invalid("interval", format!("'{val}' is not a number"))
                    })?;
                }
                other => {
                    return Err(CalendarError::invalid(
                        "recurrence",
                        format!("unsupported rule part '{other}'"),
                    ));
                }
            }
        }

        let frequency =
            frequency.ok_or_else(|| CalendarError::invalid("recurrence", "missing FREQ"))?;
        let until = until.ok_or_else(|| CalendarError::invalid("recurrence", "missing UNTIL"))?;
        Self::new(frequency, until, interval)
    }

    /// Parses the value of an `EXDATE:` line (comma-separated timestamps).
    pub fn parse_exception_list(value: &str) -> CalendarResult<Vec<DateTime<Utc>>> {
        Self::parse_exception_list_in(value, &Utc)
    }

    /// Like [`Recurrence::parse_exception_list`], reading naive values in `zone`.
    pub fn parse_exception_list_in<Tz: TimeZone>(
        value: &str,
        zone: &Tz,
    ) -> CalendarResult<Vec<DateTime<Utc>>> {
        value
            .split(',')
            .map(|token| parse_timestamp_in(token.trim(), zone))
            .collect()
    }
}

/// Serialized form of [`Recurrence`], checked on the way in.
#[derive(Deserialize)]
struct RecurrenceFields {
    frequency: Frequency,
    until: DateTime<Utc>,
    interval: u32,
    #[serde(default)]
    exceptions: Vec<DateTime<Utc>>,
}

impl TryFrom<RecurrenceFields> for Recurrence {
    type Error = CalendarError;

    fn try_from(fields: RecurrenceFields) -> CalendarResult<Self> {
        let mut rule = Self::new(fields.frequency, fields.until, fields.interval)?;
        rule.exceptions = fields.exceptions;
        Ok(rule)
    }
}

fn check_interval(interval: u32) -> CalendarResult<()> {
    if interval == 0 {
        return Err(CalendarError::invalid("interval", "must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    mod frequency {
        use super::*;

        #[test]
        fn codes() {
            assert_eq!(Frequency::from_code(0), Frequency::Daily);
            assert_eq!(Frequency::from_code(1), Frequency::Weekly);
            assert_eq!(Frequency::from_code(3), Frequency::Yearly);
            assert_eq!(Frequency::from_code(7), Frequency::Unknown(7));
            assert_eq!(Frequency::Unknown(-2).code(), -2);
            assert_eq!(Frequency::Monthly.code(), 2);
        }

        #[test]
        fn keywords() {
            assert_eq!(Frequency::Weekly.as_str(), "WEEKLY");
            assert_eq!(Frequency::Unknown(9).as_str(), "UNKNOWN");
            assert_eq!(Frequency::parse("DAILY").unwrap(), Frequency::Daily);
            assert!(Frequency::parse("HOURLY").is_err());
        }
    }

    mod recurrence {
        use super::*;

        #[test]
        fn zero_interval_is_rejected() {
            let err = Recurrence::new(Frequency::Weekly, utc(2021, 6, 28, 16, 0, 0), 0).unwrap_err();
            assert!(matches!(err, CalendarError::InvalidField { field: "interval", .. }));

            let mut rule = Recurrence::weekly_until(utc(2021, 6, 28, 16, 0, 0));
            assert!(rule.set_interval(0).is_err());
            assert_eq!(rule.interval(), 1);
            rule.set_interval(2).unwrap();
            assert_eq!(rule.interval(), 2);
        }

        #[test]
        fn deserialize_checks_interval() {
            let mut rule = Recurrence::weekly_until(utc(2021, 6, 28, 16, 0, 0));
            rule.add_exception(utc(2021, 6, 21, 16, 0, 0));
            let mut value = serde_json::to_value(&rule).unwrap();
            assert_eq!(serde_json::from_value::<Recurrence>(value.clone()).unwrap(), rule);

            value["interval"] = serde_json::json!(0);
            let err = serde_json::from_value::<Recurrence>(value).unwrap_err();
            assert!(err.to_string().contains("must be at least 1"));
        }

        #[test]
        fn render_without_exceptions() {
            let rule = Recurrence::weekly_until(utc(2021, 6, 28, 16, 0, 0));
            assert_eq!(
                rule.render_fragment(),
                "RRULE:FREQ=WEEKLY;UNTIL=20210628T160000Z;INTERVAL=1\n"
            );
        }

        #[test]
        fn render_with_exceptions() {
            let rule = Recurrence::new(Frequency::Daily, utc(2021, 6, 28, 16, 0, 0), 2)
                .unwrap()
                .with_exception(utc(2021, 4, 5, 16, 0, 0))
                .with_exception(utc(2021, 4, 12, 16, 0, 0));
            assert_eq!(
                rule.render_fragment(),
                "RRULE:FREQ=DAILY;UNTIL=20210628T160000Z;INTERVAL=2\n\
                 EXDATE:20210405T160000Z,20210412T160000Z\n"
            );
        }

        #[test]
        fn unknown_frequency_renders_unknown() {
            let mut rule = Recurrence::weekly_until(utc(2021, 6, 28, 16, 0, 0));
            rule.set_frequency(Frequency::from_code(42));
            assert_eq!(
                rule.render_fragment(),
                "RRULE:FREQ=UNKNOWN;UNTIL=20210628T160000Z;INTERVAL=1\n"
            );
            // The code itself survives rendering
            assert_eq!(rule.frequency().code(), 42);
        }

        #[test]
        fn exceptions_keep_insertion_order() {
            let mut rule = Recurrence::weekly_until(utc(2021, 6, 28, 16, 0, 0));
            rule.add_exception(utc(2021, 5, 3, 16, 0, 0));
            rule.add_exception(utc(2021, 4, 5, 16, 0, 0));
            assert_eq!(
                rule.exceptions(),
                &[utc(2021, 5, 3, 16, 0, 0), utc(2021, 4, 5, 16, 0, 0)]
            );
        }

        #[test]
        fn clone_is_independent() {
            let original = Recurrence::weekly_until(utc(2021, 6, 28, 16, 0, 0))
                .with_exception(utc(2021, 4, 5, 16, 0, 0));
            let mut copy = original.clone();
            copy.add_exception(utc(2021, 4, 12, 16, 0, 0));
            copy.set_until(utc(2021, 7, 5, 16, 0, 0));
            assert_eq!(original.exceptions().len(), 1);
            assert_eq!(original.until(), utc(2021, 6, 28, 16, 0, 0));
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn parse_rule_full() {
            let rule = Recurrence::parse_rule("FREQ=WEEKLY;UNTIL=20210628T160000Z;INTERVAL=2")
                .unwrap();
            assert_eq!(rule.frequency(), Frequency::Weekly);
            assert_eq!(rule.until(), utc(2021, 6, 28, 16, 0, 0));
            assert_eq!(rule.interval(), 2);
            assert!(rule.exceptions().is_empty());
        }

        #[test]
        fn naive_values_follow_zone() {
            let zone = chrono::FixedOffset::east_opt(8 * 3600).unwrap();
            let rule =
                Recurrence::parse_rule_in("FREQ=WEEKLY;UNTIL=20210222T090000", &zone).unwrap();
            assert_eq!(rule.until(), utc(2021, 2, 22, 1, 0, 0));

            let dates =
                Recurrence::parse_exception_list_in("20210215T090000,20210222T090000Z", &zone)
                    .unwrap();
            assert_eq!(
                dates,
                [utc(2021, 2, 15, 1, 0, 0), utc(2021, 2, 22, 9, 0, 0)]
            );
        }

        #[test]
        fn parse_rule_defaults_interval() {
            let rule = Recurrence::parse_rule("FREQ=MONTHLY;UNTIL=20211231").unwrap();
            assert_eq!(rule.interval(), 1);
            assert_eq!(rule.frequency(), Frequency::Monthly);
        }

        #[test]
        fn parse_rule_rejects_unsupported() {
            assert!(Recurrence::parse_rule("FREQ=WEEKLY").is_err());
            assert!(Recurrence::parse_rule("UNTIL=20211231").is_err());
            assert!(Recurrence::parse_rule("FREQ=WEEKLY;UNTIL=20211231;BYDAY=MO").is_err());
            assert!(Recurrence::parse_rule("FREQ=WEEKLY;UNTIL=20211231;INTERVAL=0").is_err());
            assert!(Recurrence::parse_rule("FREQ=WEEKLY;UNTIL").is_err());
        }

        #[test]
        fn render_then_parse_rule_line() {
            let rule = Recurrence::new(Frequency::Yearly, utc(2030, 1, 1, 0, 0, 0), 3).unwrap();
            let fragment = rule.render_fragment();
            let value = fragment.trim_end().strip_prefix("RRULE:").unwrap();
            assert_eq!(Recurrence::parse_rule(value).unwrap(), rule);
        }

        #[test]
        fn parse_exception_list() {
            let dates =
                Recurrence::parse_exception_list("20210405T160000Z,20210412T160000Z").unwrap();
            assert_eq!(
                dates,
                vec![utc(2021, 4, 5, 16, 0, 0), utc(2021, 4, 12, 16, 0, 0)]
            );
            assert!(Recurrence::parse_exception_list("20210405T160000Z,").is_err());
        }
    }
}
