//! Line-oriented document parser.
//!
//! [`DocumentParser`] is a single-pass state machine. It is fed one line at a
//! time and stops at the first structural error, reporting the 1-based line
//! number. It never hands back a partially read calendar.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::debug;

use crate::alarm::Alarm;
use crate::calendar::Calendar;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{Event, Location};
use crate::recurrence::Recurrence;
use crate::time::parse_timestamp_in;

/// Options controlling how a document is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Zone used for timestamps without a `Z` suffix.
    pub zone: FixedOffset,
    /// Parse `RRULE:` into a recurrence and accept `EXDATE:` lines.
    pub import_recurrence: bool,
    /// Accept `BEGIN:VALARM` blocks inside events.
    pub import_alarms: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            zone: Utc.fix(),
            import_recurrence: false,
            import_alarms: false,
        }
    }
}

impl ParseOptions {
    #[must_use]
    pub fn with_zone(mut self, zone: FixedOffset) -> Self {
        self.zone = zone;
        self
    }

    #[must_use]
    pub fn with_recurrence_import(mut self, enabled: bool) -> Self {
        self.import_recurrence = enabled;
        self
    }

    #[must_use]
    pub fn with_alarm_import(mut self, enabled: bool) -> Self {
        self.import_alarms = enabled;
        self
    }
}

/// The three fixed header lines, in order.
const HEADER: [HeaderLine; 3] = [
    HeaderLine::Exact("BEGIN:VCALENDAR"),
    HeaderLine::Prefix("PRODID:"),
    HeaderLine::Exact("VERSION:2.0"),
];

#[derive(Debug, Clone, Copy)]
enum HeaderLine {
    Exact(&'static str),
    Prefix(&'static str),
}

impl HeaderLine {
    fn matches(self, line: &str) -> bool {
        match self {
            Self::Exact(expected) => line == expected,
            Self::Prefix(prefix) => line.starts_with(prefix),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Exact(text) | Self::Prefix(text) => text,
        }
    }
}

/// Event properties recognised inside `BEGIN:VEVENT` .. `END:VEVENT`.
const EVENT_FIELDS: &[&str] = &[
    "CATEGORIES",
    "DTEND",
    "DTSTAMP",
    "DTSTART",
    "LOCATION",
    "SEQUENCE",
    "SUMMARY",
    "UID",
    "RRULE",
];

/// Fields collected for the event being read.
#[derive(Debug, Default)]
struct EventDraft {
    summary: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    location: Option<Location>,
    recurrence: Option<Recurrence>,
    exceptions: Vec<DateTime<Utc>>,
    alarm: Option<Alarm>,
}

#[derive(Debug, Default)]
struct AlarmDraft {
    lead_minutes: Option<u32>,
    description: Option<String>,
}

#[derive(Debug)]
enum State {
    /// Index of the next expected header line.
    Header(usize),
    Body,
    InEvent(EventDraft),
    InAlarm(EventDraft, AlarmDraft),
    Done,
    Failed,
}

/// Incremental calendar document reader.
///
/// Feed lines with [`DocumentParser::feed`] and collect the calendar with
/// [`DocumentParser::finish`]. Once `feed` has failed, every further call
/// fails too.
#[derive(Debug)]
pub struct DocumentParser {
    options: ParseOptions,
    state: State,
    calendar: Calendar,
    line: usize,
}

impl DocumentParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            state: State::Header(0),
            calendar: Calendar::default(),
            line: 0,
        }
    }

    /// Number of lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Consumes one line. A trailing `\r` is ignored.
    pub fn feed(&mut self, raw: &str) -> CalendarResult<()> {
        self.line += 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        let state = std::mem::replace(&mut self.state, State::Failed);
        self.state = match state {
            State::Header(index) => self.header_line(index, line)?,
            State::Body => self.body_line(line)?,
            State::InEvent(draft) => self.event_line(draft, line)?,
            State::InAlarm(draft, alarm) => self.alarm_line(draft, alarm, line)?,
            State::Done if line.trim().is_empty() => State::Done,
            State::Done => return Err(self.error("content after END:VCALENDAR")),
            State::Failed => return Err(self.error("parser already failed")),
        };
        Ok(())
    }

    /// Ends the input and returns the calendar read.
    ///
    /// # Errors
    ///
    /// Fails when the document stopped before `END:VCALENDAR`, citing the line
    /// after the last one read.
    pub fn finish(self) -> CalendarResult<Calendar> {
        let missing = match self.state {
            State::Done => {
                debug!(
                    lines = self.line,
                    items = self.calendar.len(),
                    "Parsed calendar document"
                );
                return Ok(self.calendar);
            }
            State::Header(index) => format!("missing header line {}", HEADER[index].expected()),
            State::Body => "missing END:VCALENDAR".to_string(),
            State::InEvent(_) => "missing END:VEVENT".to_string(),
            State::InAlarm(..) => "missing END:VALARM".to_string(),
            State::Failed => "parser already failed".to_string(),
        };
        Err(CalendarError::document(self.line + 1, missing))
    }

    fn error(&self, detail: impl Into<String>) -> CalendarError {
        CalendarError::document(self.line, detail)
    }

    fn header_line(&self, index: usize, line: &str) -> CalendarResult<State> {
        let expected = HEADER[index];
        if !expected.matches(line) {
            return Err(self.error(format!("expected {}", expected.expected())));
        }
        if index + 1 == HEADER.len() {
            Ok(State::Body)
        } else {
            Ok(State::Header(index + 1))
        }
    }

    fn body_line(&self, line: &str) -> CalendarResult<State> {
        match line {
            "BEGIN:VEVENT" => Ok(State::InEvent(EventDraft::default())),
            "END:VCALENDAR" => Ok(State::Done),
            "END:VEVENT" => Err(self.error("END:VEVENT outside of an event")),
            _ => match self.event_field_name(line) {
                Some(name) => Err(self.error(format!("{name} outside of an event"))),
                None => Err(self.error(format!("unsupported line '{line}'"))),
            },
        }
    }

    fn event_line(&mut self, mut draft: EventDraft, line: &str) -> CalendarResult<State> {
        match line {
            "BEGIN:VEVENT" => return Err(self.error("BEGIN:VEVENT inside an event")),
            "END:VCALENDAR" => return Err(self.error("END:VCALENDAR inside an event")),
            "END:VEVENT" => {
                let event = self.build_event(draft)?;
                debug!(line = self.line, summary = %event.summary, "Read event");
                self.calendar.add_event(event);
                return Ok(State::Body);
            }
            "BEGIN:VALARM" if self.options.import_alarms => {
                return Ok(State::InAlarm(draft, AlarmDraft::default()));
            }
            _ => {}
        }

        let Some(name) = self.event_field_name(line) else {
            return Err(self.error(format!("unsupported line '{line}'")));
        };
        let value = &line[name.len() + 1..];

        match name {
            "DTSTART" => draft.start = Some(self.timestamp(value)?),
            "DTEND" => draft.end = Some(self.timestamp(value)?),
            "SUMMARY" => draft.summary = Some(value.to_string()),
            "LOCATION" => draft.location = Some(Location::from_wire(value)),
            "RRULE" if self.options.import_recurrence => {
                let rule = Recurrence::parse_rule_in(value, &self.options.zone);
                draft.recurrence = Some(self.located(rule)?);
            }
            "EXDATE" => {
                let dates = self.located(Recurrence::parse_exception_list_in(
                    value,
                    &self.options.zone,
                ))?;
                draft.exceptions.extend(dates);
            }
            // CATEGORIES, DTSTAMP, SEQUENCE, UID, and RRULE when not imported
            _ => {}
        }
        Ok(State::InEvent(draft))
    }

    fn alarm_line(
        &self,
        mut draft: EventDraft,
        mut alarm: AlarmDraft,
        line: &str,
    ) -> CalendarResult<State> {
        if line == "END:VALARM" {
            let lead_minutes = alarm
                .lead_minutes
                .ok_or_else(|| self.error("VALARM without TRIGGER"))?;
            draft.alarm = Some(Alarm::new(
                lead_minutes,
                alarm.description.unwrap_or_default(),
            ));
            return Ok(State::InEvent(draft));
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(self.error(format!("unsupported line '{line}' in VALARM")));
        };
        match name.split(';').next().unwrap_or(name) {
            "ACTION" => {}
            "TRIGGER" => alarm.lead_minutes = Some(self.located(Alarm::parse_trigger(value))?),
            "DESCRIPTION" => alarm.description = Some(value.to_string()),
            _ => return Err(self.error(format!("unsupported line '{line}' in VALARM"))),
        }
        Ok(State::InAlarm(draft, alarm))
    }

    /// Returns the property name if `line` is a recognised event field.
    fn event_field_name<'l>(&self, line: &'l str) -> Option<&'l str> {
        let (name, _) = line.split_once(':')?;
        let known = EVENT_FIELDS.contains(&name)
            || (self.options.import_recurrence && name == "EXDATE");
        known.then_some(name)
    }

    fn build_event(&self, draft: EventDraft) -> CalendarResult<Event> {
        let summary = draft
            .summary
            .ok_or_else(|| self.error("event without SUMMARY"))?;
        let start = draft
            .start
            .ok_or_else(|| self.error("event without DTSTART"))?;
        let end = draft.end.unwrap_or(start);

        let mut event = self.located(Event::new(summary, start, end))?;
        event.location = draft.location.unwrap_or_default();
        event.alarm = draft.alarm;

        match (draft.recurrence, draft.exceptions.is_empty()) {
            (Some(mut rule), _) => {
                for exception in draft.exceptions {
                    rule.add_exception(exception);
                }
                event.recurrence = Some(rule);
            }
            (None, true) => {}
            (None, false) => return Err(self.error("EXDATE without RRULE")),
        }
        Ok(event)
    }

    fn timestamp(&self, value: &str) -> CalendarResult<DateTime<Utc>> {
        self.located(parse_timestamp_in(value, &self.options.zone))
    }

    /// Re-reports a value-level error as a document error on the current line.
    fn located<T>(&self, result: CalendarResult<T>) -> CalendarResult<T> {
        result.map_err(|err| self.error(err.to_string()))
    }
}

/// Parses a document with default options.
pub fn parse_calendar<I, S>(lines: I) -> CalendarResult<Calendar>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parse_calendar_with(lines, &ParseOptions::default())
}

/// Parses a document.
///
/// # Errors
///
/// Returns [`CalendarError::MalformedDocument`] for the first structural
/// violation, with its 1-based line number.
pub fn parse_calendar_with<I, S>(lines: I, options: &ParseOptions) -> CalendarResult<Calendar>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = DocumentParser::new(*options);
    for line in lines {
        parser.feed(line.as_ref())?;
    }
    parser.finish()
}
