//! Event types for calendar entries.
//!
//! This module provides:
//! - [`Event`]: one timed occurrence, optionally repeating, with an alarm
//! - [`Location`]: where an event takes place, either free text or a
//!   structured location/building/room triple

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::codec::RenderContext;
use crate::error::{CalendarError, CalendarResult};
use crate::recurrence::Recurrence;
use crate::time::{self, format_timestamp, week_residue};

/// A structured campus location.
///
/// Parts are optional because imported documents may carry partial triples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomLocation {
    pub location: Option<String>,
    pub building: Option<String>,
    pub room: Option<String>,
}

impl RoomLocation {
    fn parts(&self) -> [Option<&str>; 3] {
        [
            self.location.as_deref(),
            self.building.as_deref(),
            self.room.as_deref(),
        ]
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Location {
    /// Free-form text.
    Plain(String),
    /// A location/building/room triple.
    Room(RoomLocation),
}

impl Default for Location {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

impl Location {
    /// Creates a free-form location.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain(text.into())
    }

    /// Creates a structured location.
    ///
    /// Parts must survive the `LOCATION:` wire form, so they may not contain
    /// `\`, `:` or line breaks, nor start or end with whitespace. A triple
    /// assembled by hand through [`RoomLocation`] skips these checks and is
    /// read back lossily.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidField`] unless all three parts are
    /// non-empty and wire-safe.
    pub fn room(
        location: impl Into<String>,
        building: impl Into<String>,
        room: impl Into<String>,
    ) -> CalendarResult<Self> {
        let triple = RoomLocation {
            location: Some(location.into()),
            building: Some(building.into()),
            room: Some(room.into()),
        };
        if triple.parts().iter().any(|p| p.is_none_or(str::is_empty)) {
            return Err(CalendarError::invalid(
                "location",
                "location, building and room must all be set",
            ));
        }
        if let Some(part) = triple.parts().into_iter().flatten().find(|p| !is_wire_safe(p)) {
            return Err(CalendarError::invalid(
                "location",
                format!("part '{part}' cannot be written to a LOCATION line"),
            ));
        }
        Ok(Self::Room(triple))
    }

    /// Returns `true` when every required part is present and non-empty.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Plain(text) => !text.is_empty(),
            Self::Room(triple) => triple.parts().iter().all(|p| p.is_some_and(|s| !s.is_empty())),
        }
    }

    /// Renders the value of a `LOCATION:` line.
    ///
    /// Structured parts are separated by escaped commas so the parser can
    /// split them again.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Plain(text) => {
                let escaped = escape_text(text);
                // Plain text must not read back as a structured value
                match escaped.strip_prefix(ROOM_PREFIX) {
                    Some(rest) => format!("Location\\:{rest}"),
                    None => escaped,
                }
            }
            Self::Room(triple) => {
                let [location, building, room] = triple.parts().map(Option::unwrap_or_default);
                format!("{ROOM_PREFIX}{location}\\, Building:{building}\\, Room:{room}")
            }
        }
    }

    /// Reads the value of a `LOCATION:` line.
    ///
    /// A value starting with `Location:` is structured: each of the three
    /// segments starts after the next colon and ends at the next backslash.
    /// Anything else is free-form text.
    pub fn from_wire(value: &str) -> Self {
        if !value.starts_with(ROOM_PREFIX) {
            return Self::Plain(unescape_text(value));
        }

        let mut parts: [Option<String>; 3] = Default::default();
        let mut rest = value;

        for slot in &mut parts {
            let Some((_, after)) = rest.split_once(':') else {
                break;
            };
            let end = after.find('\\').unwrap_or(after.len());
            *slot = Some(after[..end].trim().to_string());
            rest = after;
        }

        match parts {
            [None, ..] => Self::Plain(unescape_text(value)),
            [location, building, room] => Self::Room(RoomLocation {
                location,
                building,
                room,
            }),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(text) => f.write_str(text),
            Self::Room(triple) => {
                let [location, building, room] = triple.parts().map(Option::unwrap_or_default);
                write!(f, "Location:{location}, Building:{building}, Room:{room}")
            }
        }
    }
}

/// Leading label of a structured `LOCATION:` value.
const ROOM_PREFIX: &str = "Location:";

fn is_wire_safe(part: &str) -> bool {
    part.trim() == part && !part.contains(['\\', ':', '\n', '\r'])
}

/// Escapes TEXT values: backslash, comma, semicolon and newline.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            ';' => out.push_str("\\;"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// A single timed occurrence.
///
/// Events order chronologically by start instant only; see [`Event::cmp_start`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EventFields")]
pub struct Event {
    /// The event title.
    pub summary: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    /// Repeat schedule, if this event is a series head.
    pub recurrence: Option<Recurrence>,
    pub alarm: Option<Alarm>,
    pub description: Option<String>,
    pub location: Location,
}

impl Event {
    /// Creates an event with a plain, empty location.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidField`] if `start` is after `end`.
    pub fn new(
        summary: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalendarResult<Self> {
        check_times(start, end)?;
        Ok(Self {
            summary: summary.into(),
            start,
            end,
            recurrence: None,
            alarm: None,
            description: None,
            location: Location::default(),
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Replaces both instants.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::InvalidField`] if `start` is after `end`.
    pub fn set_times(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarResult<()> {
        check_times(start, end)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the recurrence.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Builder method to set the alarm.
    pub fn with_alarm(mut self, alarm: Alarm) -> Self {
        self.alarm = Some(alarm);
        self
    }

    /// Returns `true` if this event carries a recurrence.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Returns the last instant covered: the recurrence end, or the event end.
    pub fn last_instant(&self) -> DateTime<Utc> {
        self.recurrence
            .as_ref()
            .map_or(self.end, Recurrence::until)
    }

    /// Compares two events by start instant only.
    pub fn cmp_start(&self, other: &Self) -> Ordering {
        self.start.cmp(&other.start)
    }

    /// Checks whether `other` could extend this event as a weekly series.
    ///
    /// Both must share summary and location, and their start and end
    /// instants must be congruent modulo one week.
    pub fn basically_equal_to(&self, other: &Self) -> bool {
        self.summary == other.summary
            && week_residue(&self.start) == week_residue(&other.start)
            && week_residue(&self.end) == week_residue(&other.end)
            && self.location == other.location
    }

    /// Appends another description, separated by a blank line.
    pub fn combine_description(&mut self, other: Option<String>) {
        self.description = match (self.description.take(), other) {
            (Some(mine), Some(theirs)) if !mine.is_empty() && !theirs.is_empty() => {
                Some(format!("{mine}\n\n{theirs}"))
            }
            (Some(mine), Some(theirs)) if mine.is_empty() => Some(theirs),
            (Some(mine), _) => Some(mine),
            (None, theirs) => theirs,
        };
    }

    /// Re-bases the event from one fixed offset onto another.
    ///
    /// Moves start, end, and the recurrence end and exceptions.
    pub fn shift_zone_base(&mut self, source_offset_millis: i64, dest_offset_millis: i64) {
        let shift = |t: DateTime<Utc>| time::shift_zone_base(t, source_offset_millis, dest_offset_millis);
        self.start = shift(self.start);
        self.end = shift(self.end);
        if let Some(rule) = self.recurrence.as_mut() {
            rule.map_instants(shift);
        }
    }

    /// Moves start and end forward one hour where they fall within DST.
    pub fn fix_dst(&mut self) {
        self.start = time::fix_dst(self.start);
        self.end = time::fix_dst(self.end);
    }

    /// Moves start and end back one hour where they fall within DST.
    pub fn set_dst(&mut self) {
        self.start = time::set_dst(self.start);
        self.end = time::set_dst(self.end);
    }

    /// Renders this event as one `VEVENT` record.
    pub fn render_record(&self, ctx: &mut RenderContext) -> String {
        let uid = ctx.next_uid(&self.start, &self.end);

        let mut out = String::from("BEGIN:VEVENT\n");
        out.push_str(&format!("DTSTAMP:{}\n", format_timestamp(&ctx.stamp())));
        out.push_str(&format!("UID:{uid}\n"));
        out.push_str(&format!("SUMMARY:{}\n", self.summary));
        out.push_str(&format!("DTSTART:{}\n", format_timestamp(&self.start)));
        out.push_str(&format!("DTEND:{}\n", format_timestamp(&self.end)));
        if let Some(rule) = &self.recurrence {
            out.push_str(&rule.render_fragment());
        }
        if self.location.is_available() {
            out.push_str(&format!("LOCATION:{}\n", self.location.to_wire()));
        }
        if let Some(alarm) = &self.alarm {
            out.push_str(&alarm.render_fragment());
        }
        out.push_str("END:VEVENT\n");
        out
    }
}

/// Serialized form of [`Event`], checked on the way in.
#[derive(Deserialize)]
struct EventFields {
    summary: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default)]
    recurrence: Option<Recurrence>,
    #[serde(default)]
    alarm: Option<Alarm>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    location: Location,
}

impl TryFrom<EventFields> for Event {
    type Error = CalendarError;

    fn try_from(fields: EventFields) -> CalendarResult<Self> {
        let mut event = Self::new(fields.summary, fields.start, fields.end)?;
        event.recurrence = fields.recurrence;
        event.alarm = fields.alarm;
        event.description = fields.description;
        event.location = fields.location;
        Ok(event)
    }
}

fn check_times(start: DateTime<Utc>, end: DateTime<Utc>) -> CalendarResult<()> {
    if start > end {
        return Err(CalendarError::invalid(
            "times",
            format!(
                "start {} is after end {}",
                format_timestamp(&start),
                format_timestamp(&end)
            ),
        ));
    }
    Ok(())
}
