//! Recurrence-merge optimizer.
//!
//! Folds a flat list of occurrences into weekly series. Occurrences that are
//! congruent modulo one week with an earlier series head extend that head;
//! skipped weeks become exception instants.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::alarm::{Alarm, DEFAULT_LEAD_MINUTES};
use crate::event::Event;
use crate::recurrence::Recurrence;

/// Tunables for [`optimize_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizeOptions {
    /// Lead time of the alarm attached to newly promoted series heads.
    pub alarm_lead_minutes: u32,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            alarm_lead_minutes: DEFAULT_LEAD_MINUTES,
        }
    }
}

/// Collapses week-congruent occurrences into recurring series, in place.
///
/// Events are first sorted by start (stably). Each event without a
/// recurrence is merged into the first earlier head it is basically equal
/// to, or else promoted to a new weekly head with a default alarm. Running
/// this twice yields the same list.
pub fn optimize_events(events: &mut Vec<Event>, options: &OptimizeOptions) {
    events.sort_by(Event::cmp_start);
    let before = events.len();

    let mut i = 0;
    while i < events.len() {
        if events[i].is_recurring() {
            i += 1;
            continue;
        }

        let head = (0..i).find(|&j| {
            events[j].is_recurring() && events[j].basically_equal_to(&events[i])
        });

        match head {
            Some(j) => {
                let occurrence = events.remove(i);
                extend_series(&mut events[j], occurrence);
            }
            None => {
                promote(&mut events[i], options);
                i += 1;
            }
        }
    }

    debug!(
        before,
        after = events.len(),
        "Optimized occurrences into series"
    );
}

/// Turns a single occurrence into a one-week series head.
fn promote(event: &mut Event, options: &OptimizeOptions) {
    debug!(summary = %event.summary, start = %event.start(), "Promoting series head");
    event.recurrence = Some(Recurrence::weekly_until(event.end()));
    event.alarm = Some(Alarm::new(
        options.alarm_lead_minutes,
        event.summary.clone(),
    ));
}

/// Extends `head` so that its series also covers `occurrence`.
fn extend_series(head: &mut Event, occurrence: Event) {
    let Some(rule) = head.recurrence.as_mut() else {
        return;
    };

    let week = Duration::weeks(1);
    let old_until = rule.until();
    let new_until = old_until.max(occurrence.end());

    let mut cursor = old_until + week;
    while cursor < new_until {
        rule.add_exception(cursor);
        cursor += week;
    }
    rule.set_until(new_until);

    head.combine_description(occurrence.description);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Location;
    use chrono::{DateTime, TimeZone, Utc};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn lecture(week: i64) -> Event {
        let start = utc(2021, 2, 15, 13, 30, 0) + Duration::weeks(week);
        Event::new("CPS 2231", start, start + Duration::minutes(105))
            .unwrap()
            .with_location(Location::room("W", "GEH", "C504").unwrap())
    }

    fn optimize(events: &mut Vec<Event>) {
        optimize_events(events, &OptimizeOptions::default());
    }

    #[test]
    fn consecutive_weeks_become_one_series() {
        let mut events = vec![lecture(1), lecture(0)];
        optimize(&mut events);

        assert_eq!(events.len(), 1);
        let head = &events[0];
        assert_eq!(head.start(), lecture(0).start());
        let rule = head.recurrence.as_ref().unwrap();
        assert_eq!(rule.until(), lecture(1).end());
        assert_eq!(rule.interval(), 1);
        assert!(rule.exceptions().is_empty());
    }

    #[test]
    fn skipped_week_becomes_exception() {
        let mut events = vec![lecture(0), lecture(1), lecture(3)];
        optimize(&mut events);

        assert_eq!(events.len(), 1);
        let rule = events[0].recurrence.as_ref().unwrap();
        assert_eq!(rule.until(), lecture(3).end());
        assert_eq!(rule.exceptions(), &[lecture(2).end()]);
    }

    #[test]
    fn promotion_adds_default_alarm() {
        let mut events = vec![lecture(0)];
        optimize(&mut events);

        let alarm = events[0].alarm.as_ref().unwrap();
        assert_eq!(alarm.lead_minutes, 30);
        assert_eq!(alarm.description, "CPS 2231");
    }

    #[test]
    fn alarm_lead_is_configurable() {
        let mut events = vec![lecture(0)];
        optimize_events(
            &mut events,
            &OptimizeOptions {
                alarm_lead_minutes: 10,
            },
        );
        assert_eq!(events[0].alarm.as_ref().unwrap().lead_minutes, 10);
    }

    #[test]
    fn different_slots_stay_separate() {
        let mut wednesday = lecture(0);
        wednesday
            .set_times(
                wednesday.start() + Duration::days(2),
                wednesday.end() + Duration::days(2),
            )
            .unwrap();
        let mut events = vec![lecture(0), wednesday, lecture(1)];
        optimize(&mut events);

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(Event::is_recurring));
        assert_eq!(
            events[0].recurrence.as_ref().unwrap().until(),
            lecture(1).end()
        );
    }

    #[test]
    fn descriptions_are_combined() {
        let mut events = vec![
            lecture(0).with_description("intro"),
            lecture(1).with_description("quiz"),
        ];
        optimize(&mut events);
        assert_eq!(events[0].description.as_deref(), Some("intro\n\nquiz"));
    }

    #[test]
    fn running_twice_changes_nothing() {
        let mut events = vec![lecture(4), lecture(0), lecture(1), lecture(3)];
        optimize(&mut events);
        let once = events.clone();
        optimize(&mut events);
        assert_eq!(events, once);
    }

    #[test]
    fn first_earlier_head_wins() {
        let first = lecture(0).with_recurrence(Recurrence::weekly_until(lecture(0).end()));
        let second = lecture(1).with_recurrence(Recurrence::weekly_until(lecture(1).end()));
        let mut events = vec![second.clone(), first, lecture(3)];
        optimize(&mut events);

        assert_eq!(events.len(), 2);
        let rule = events[0].recurrence.as_ref().unwrap();
        assert_eq!(rule.until(), lecture(3).end());
        assert_eq!(rule.exceptions(), &[lecture(1).end(), lecture(2).end()]);
        assert_eq!(events[1], second);
    }

    #[test]
    fn until_never_moves_backwards() {
        let head = lecture(0).with_recurrence(Recurrence::weekly_until(lecture(5).end()));
        let mut events = vec![head, lecture(2)];
        optimize(&mut events);

        assert_eq!(events.len(), 1);
        let rule = events[0].recurrence.as_ref().unwrap();
        assert_eq!(rule.until(), lecture(5).end());
        assert!(rule.exceptions().is_empty());
    }

    #[test]
    fn empty_list_is_fine() {
        let mut events = Vec::new();
        optimize(&mut events);
        assert!(events.is_empty());
    }
}
