//! The calendar aggregate.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{self, ParseOptions, RenderOptions};
use crate::content::{CalendarContent, CalendarItem, Course};
use crate::error::CalendarResult;
use crate::event::Event;
use crate::optimize::OptimizeOptions;

/// Name given to calendars created without one.
pub const DEFAULT_NAME: &str = "My Calendar";

/// A named, ordered list of courses and standalone events.
///
/// Items keep the order they were read or added in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    name: String,
    /// File the calendar was read from or is saved to.
    path: Option<PathBuf>,
    items: Vec<CalendarItem>,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Calendar {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            items: Vec::new(),
        }
    }

    /// Creates an empty calendar backed by `path`, named after its file stem.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        let mut calendar = Self::default();
        calendar.attach_path(path);
        calendar
    }

    /// Sets the backing path and renames the calendar after its file stem.
    pub fn attach_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if let Some(stem) = path.file_stem() {
            self.name = stem.to_string_lossy().into_owned();
        }
        self.path = Some(path);
    }

    /// Builder method to set the backing path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    pub fn items(&self) -> &[CalendarItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [CalendarItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the courses, skipping standalone events.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.items.iter().filter_map(CalendarItem::as_course)
    }

    pub fn course_count(&self) -> usize {
        self.courses().count()
    }

    pub fn standalone_count(&self) -> usize {
        self.items.len() - self.course_count()
    }

    /// Adds one occurrence, grouping it by summary.
    ///
    /// The event joins the first course with the same summary, or starts a
    /// new course appended at the end.
    pub fn add_event(&mut self, event: Event) {
        let existing = self
            .items
            .iter_mut()
            .filter_map(CalendarItem::as_course_mut)
            .find(|course| course.summary() == event.summary);

        match existing {
            Some(course) => course.add(event),
            None => self.items.push(CalendarItem::Course(Course::from_event(event))),
        }
    }

    /// Appends a whole item as-is.
    pub fn add(&mut self, item: impl Into<CalendarItem>) {
        self.items.push(item.into());
    }

    /// Removes and returns the item at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<CalendarItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Earliest start and latest covered instant over all items.
    pub fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.items
            .iter()
            .filter_map(CalendarItem::time_bounds)
            .reduce(|(first, last), (start, end)| (first.min(start), last.max(end)))
    }

    /// Optimizes every course with the default options.
    pub fn optimize_courses(&mut self) {
        self.optimize_courses_with(&OptimizeOptions::default());
    }

    pub fn optimize_courses_with(&mut self, options: &OptimizeOptions) {
        for course in self.items.iter_mut().filter_map(CalendarItem::as_course_mut) {
            course.optimize_with(options);
        }
    }

    /// Re-bases every event from one fixed offset onto another.
    pub fn shift_zone_base(&mut self, source_offset_millis: i64, dest_offset_millis: i64) {
        for item in &mut self.items {
            item.shift_zone_base(source_offset_millis, dest_offset_millis);
        }
    }

    /// Converts DST wall-clock times of every event to a zone without DST.
    pub fn fix_dst(&mut self) {
        self.items.iter_mut().for_each(CalendarItem::fix_dst);
    }

    /// Converts wall-clock times of every event without DST to DST.
    pub fn set_dst(&mut self) {
        self.items.iter_mut().for_each(CalendarItem::set_dst);
    }

    /// Combines two calendars into a new one.
    ///
    /// The result holds copies of `a`'s items followed by copies of `b`'s,
    /// is named `Merged: <a>+<b>` and has no backing path.
    pub fn merged(a: &Self, b: &Self) -> Self {
        let mut merged = a.clone();
        merged.name = format!("Merged: {}+{}", a.name, b.name);
        merged.path = None;
        merged.items.extend(b.items.iter().cloned());
        merged
    }

    /// Renders the whole document with default options.
    pub fn render(&self) -> String {
        self.render_with(&RenderOptions::default())
    }

    pub fn render_with(&self, options: &RenderOptions) -> String {
        codec::render_document(&self.items, options)
    }

    /// Parses a document with default options.
    pub fn from_ics(text: &str) -> CalendarResult<Self> {
        codec::parse_calendar(text.lines())
    }

    pub fn from_ics_with(text: &str, options: &ParseOptions) -> CalendarResult<Self> {
        codec::parse_calendar_with(text.lines(), options)
    }
}
