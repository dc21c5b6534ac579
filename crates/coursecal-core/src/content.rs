//! Calendar content: courses (series groups) and standalone events.
//!
//! A calendar holds a closed set of item kinds, modelled as [`CalendarItem`].
//! Every kind implements [`CalendarContent`], the capability set the
//! calendar and codec dispatch through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::RenderContext;
use crate::event::Event;
use crate::optimize::{OptimizeOptions, optimize_events};

/// Operations shared by every kind of calendar item.
pub trait CalendarContent {
    /// The name used to group occurrences.
    fn grouping_key(&self) -> &str;

    /// Earliest start and latest covered instant, or `None` when empty.
    fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)>;

    /// Appends the `VEVENT` records of this item to `out`.
    fn render_into(&self, out: &mut String, ctx: &mut RenderContext);

    /// Re-bases every event from one fixed offset onto another.
    fn shift_zone_base(&mut self, source_offset_millis: i64, dest_offset_millis: i64);

    /// Converts DST wall-clock times to a zone without DST.
    fn fix_dst(&mut self);

    /// Converts wall-clock times without DST to DST.
    fn set_dst(&mut self);
}

/// A named group of occurrences, such as all meetings of one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    summary: String,
    events: Vec<Event>,
}

impl Course {
    /// Creates an empty course.
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            events: Vec::new(),
        }
    }

    /// Creates a course named after its first event.
    pub fn from_event(event: Event) -> Self {
        Self {
            summary: event.summary.clone(),
            events: vec![event],
        }
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Renames the course and every event in it.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
        for event in &mut self.events {
            event.summary.clone_from(&self.summary);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut Vec<Event> {
        &mut self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Appends an occurrence.
    pub fn add(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Removes and returns the occurrence at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<Event> {
        (index < self.events.len()).then(|| self.events.remove(index))
    }

    /// Folds week-congruent occurrences into recurring series.
    ///
    /// Uses the default 30-minute alarm lead time.
    pub fn optimize(&mut self) {
        self.optimize_with(&OptimizeOptions::default());
    }

    /// Folds week-congruent occurrences into recurring series.
    pub fn optimize_with(&mut self, options: &OptimizeOptions) {
        optimize_events(&mut self.events, options);
    }
}

impl CalendarContent for Course {
    fn grouping_key(&self) -> &str {
        &self.summary
    }

    fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.events.iter().map(Event::start).min()?;
        let last = self.events.iter().map(Event::last_instant).max()?;
        Some((first, last))
    }

    fn render_into(&self, out: &mut String, ctx: &mut RenderContext) {
        for event in &self.events {
            out.push_str(&event.render_record(ctx));
        }
    }

    fn shift_zone_base(&mut self, source_offset_millis: i64, dest_offset_millis: i64) {
        for event in &mut self.events {
            event.shift_zone_base(source_offset_millis, dest_offset_millis);
        }
    }

    fn fix_dst(&mut self) {
        self.events.iter_mut().for_each(Event::fix_dst);
    }

    fn set_dst(&mut self) {
        self.events.iter_mut().for_each(Event::set_dst);
    }
}

/// A one-off event that does not belong to any course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standalone {
    event: Event,
}

impl Standalone {
    pub fn new(event: Event) -> Self {
        Self { event }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn event_mut(&mut self) -> &mut Event {
        &mut self.event
    }

    pub fn into_event(self) -> Event {
        self.event
    }
}

impl CalendarContent for Standalone {
    fn grouping_key(&self) -> &str {
        &self.event.summary
    }

    fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.event.start(), self.event.last_instant()))
    }

    fn render_into(&self, out: &mut String, ctx: &mut RenderContext) {
        out.push_str(&self.event.render_record(ctx));
    }

    fn shift_zone_base(&mut self, source_offset_millis: i64, dest_offset_millis: i64) {
        self.event
            .shift_zone_base(source_offset_millis, dest_offset_millis);
    }

    fn fix_dst(&mut self) {
        self.event.fix_dst();
    }

    fn set_dst(&mut self) {
        self.event.set_dst();
    }
}

/// One entry of a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarItem {
    Course(Course),
    Standalone(Standalone),
}

impl CalendarItem {
    /// Returns the course if this item is one.
    pub fn as_course(&self) -> Option<&Course> {
        match self {
            Self::Course(course) => Some(course),
            Self::Standalone(_) => None,
        }
    }

    /// Returns the course mutably if this item is one.
    pub fn as_course_mut(&mut self) -> Option<&mut Course> {
        match self {
            Self::Course(course) => Some(course),
            Self::Standalone(_) => None,
        }
    }

    /// Returns the standalone event if this item is one.
    pub fn as_standalone(&self) -> Option<&Standalone> {
        match self {
            Self::Standalone(standalone) => Some(standalone),
            Self::Course(_) => None,
        }
    }

    pub fn is_course(&self) -> bool {
        matches!(self, Self::Course(_))
    }

    fn content(&self) -> &dyn CalendarContent {
        match self {
            Self::Course(course) => course,
            Self::Standalone(standalone) => standalone,
        }
    }

    fn content_mut(&mut self) -> &mut dyn CalendarContent {
        match self {
            Self::Course(course) => course,
            Self::Standalone(standalone) => standalone,
        }
    }
}

impl CalendarContent for CalendarItem {
    fn grouping_key(&self) -> &str {
        self.content().grouping_key()
    }

    fn time_bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.content().time_bounds()
    }

    fn render_into(&self, out: &mut String, ctx: &mut RenderContext) {
        self.content().render_into(out, ctx);
    }

    fn shift_zone_base(&mut self, source_offset_millis: i64, dest_offset_millis: i64) {
        self.content_mut()
            .shift_zone_base(source_offset_millis, dest_offset_millis);
    }

    fn fix_dst(&mut self) {
        self.content_mut().fix_dst();
    }

    fn set_dst(&mut self) {
        self.content_mut().set_dst();
    }
}

impl From<Course> for CalendarItem {
    fn from(course: Course) -> Self {
        Self::Course(course)
    }
}

impl From<Standalone> for CalendarItem {
    fn from(standalone: Standalone) -> Self {
        Self::Standalone(standalone)
    }
}
