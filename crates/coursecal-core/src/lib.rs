//! Core types: time, recurrence, events, calendars, codec, optimizer

pub mod alarm;
pub mod calendar;
pub mod codec;
pub mod content;
pub mod error;
pub mod event;
pub mod optimize;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use alarm::{Alarm, DEFAULT_LEAD_MINUTES};
pub use calendar::{Calendar, DEFAULT_NAME};
pub use codec::{
    DocumentParser, ParseOptions, RenderContext, RenderOptions, parse_calendar,
    parse_calendar_with,
};
pub use content::{CalendarContent, CalendarItem, Course, Standalone};
pub use error::{CalendarError, CalendarResult};
pub use event::{Event, Location, RoomLocation};
pub use optimize::{OptimizeOptions, optimize_events};
pub use recurrence::{Frequency, Recurrence};
pub use time::{format_timestamp, parse_timestamp, parse_timestamp_in};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
