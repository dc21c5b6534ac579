//! Document writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{CalendarContent, CalendarItem};
use crate::time::format_timestamp;

/// Product identifier written to the `PRODID:` header line.
pub const DEFAULT_PROD_ID: &str = "-//coursecal//coursecal//EN";

/// Per-document render state.
///
/// Carries the `DTSTAMP` value and numbers the records so every `UID` in a
/// document is unique.
#[derive(Debug, Clone)]
pub struct RenderContext {
    stamp: DateTime<Utc>,
    records: usize,
}

impl RenderContext {
    pub fn new(stamp: DateTime<Utc>) -> Self {
        Self { stamp, records: 0 }
    }

    /// The instant written as every record's `DTSTAMP`.
    pub fn stamp(&self) -> DateTime<Utc> {
        self.stamp
    }

    /// Number of records rendered so far.
    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Allocates the `UID` of the next record.
    pub(crate) fn next_uid(&mut self, start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
        self.records += 1;
        format!(
            "coursecal-{}-{}-{}",
            format_timestamp(start),
            format_timestamp(end),
            self.records
        )
    }
}

/// Options for rendering a whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub prod_id: String,
    /// Fixed `DTSTAMP`; the current time when unset.
    pub stamp: Option<DateTime<Utc>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            prod_id: DEFAULT_PROD_ID.to_string(),
            stamp: None,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub fn with_prod_id(mut self, prod_id: impl Into<String>) -> Self {
        self.prod_id = prod_id.into();
        self
    }

    #[must_use]
    pub fn with_stamp(mut self, stamp: DateTime<Utc>) -> Self {
        self.stamp = Some(stamp);
        self
    }
}

/// Renders a complete document: header, every item's records, footer.
pub fn render_document<'a>(
    items: impl IntoIterator<Item = &'a CalendarItem>,
    options: &RenderOptions,
) -> String {
    let mut ctx = RenderContext::new(options.stamp.unwrap_or_else(Utc::now));

    let mut out = String::from("BEGIN:VCALENDAR\n");
    out.push_str("PRODID:");
    out.push_str(&options.prod_id);
    out.push_str("\nVERSION:2.0\n");
    for item in items {
        item.render_into(&mut out, &mut ctx);
    }
    out.push_str("END:VCALENDAR\n");
    out
}
