//! Event catalog queries and dashboard statistics.
//!
//! Everything here is pure: callers load events and registrations, then
//! filter, sort and count them against an explicit `now`. Calendar days are
//! UTC days.

use crate::types::{Event, EventTiming, Registration};
use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Date window for catalog searches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    /// On the current day.
    Today,
    /// On the next day.
    Tomorrow,
    /// From the start of today through seven days later.
    #[serde(alias = "thisweek")]
    ThisWeek,
    /// From the start of today through one month later.
    #[serde(alias = "thismonth")]
    ThisMonth,
    /// Strictly after now.
    Upcoming,
    /// Strictly before now.
    Past,
}

impl DateWindow {
    /// Whether `date` falls inside the window at `now`.
    #[must_use]
    pub fn contains(self, date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let today = now.date_naive();
        let start_of_today = today.and_time(chrono::NaiveTime::MIN).and_utc();
        match self {
            Self::Today => date.date_naive() == today,
            Self::Tomorrow => Some(date.date_naive()) == today.checked_add_days(Days::new(1)),
            Self::ThisWeek => within(date, start_of_today, today.checked_add_days(Days::new(7))),
            Self::ThisMonth => within(date, start_of_today, today.checked_add_months(Months::new(1))),
            Self::Upcoming => date > now,
            Self::Past => date < now,
        }
    }
}

fn within(date: DateTime<Utc>, start: DateTime<Utc>, end_day: Option<NaiveDate>) -> bool {
    let Some(end_day) = end_day else {
        return date >= start;
    };
    date >= start && date <= end_day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Catalog ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Soonest first.
    #[default]
    Date,
    /// Alphabetical by title, ignoring case.
    Title,
    /// Most registrations first.
    Registrations,
}

/// Catalog search parameters. Every criterion is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQuery {
    /// Case-insensitive text matched against title, description, location
    /// and category.
    #[serde(default)]
    pub search: Option<String>,
    /// Exact location.
    #[serde(default)]
    pub location: Option<String>,
    /// Date window.
    #[serde(default)]
    pub window: Option<DateWindow>,
    /// Ordering.
    #[serde(default)]
    pub sort: SortOrder,
}

impl EventQuery {
    /// Whether `event` satisfies every criterion at `now`.
    #[must_use]
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        let text_ok = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .is_none_or(|text| matches_text(event, text));
        let location_ok = self
            .location
            .as_deref()
            .filter(|l| !l.is_empty())
            .is_none_or(|location| event.location == location);
        let window_ok = self.window.is_none_or(|window| window.contains(event.date, now));
        text_ok && location_ok && window_ok
    }

    /// Filter and sort `events`.
    #[must_use]
    pub fn apply(&self, events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
        let mut selected: Vec<Event> = events.into_iter().filter(|e| self.matches(e, now)).collect();
        sort_events(&mut selected, self.sort);
        selected
    }
}

fn matches_text(event: &Event, text: &str) -> bool {
    let needle = text.to_lowercase();
    [&event.title, &event.description, &event.location, &event.category]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn by_date(a: &Event, b: &Event) -> Ordering {
    a.date.cmp(&b.date).then_with(|| a.event_id.cmp(&b.event_id))
}

/// Sort `events` in place.
pub fn sort_events(events: &mut [Event], order: SortOrder) {
    match order {
        SortOrder::Date => events.sort_by(by_date),
        SortOrder::Title => events.sort_by(|a, b| {
            a.title
                .to_lowercase()
                .cmp(&b.title.to_lowercase())
                .then_with(|| by_date(a, b))
        }),
        SortOrder::Registrations => events.sort_by(|a, b| {
            b.current_attendees
                .cmp(&a.current_attendees)
                .then_with(|| by_date(a, b))
        }),
    }
}

/// Distinct locations, sorted, for building a location filter.
#[must_use]
pub fn locations(events: &[Event]) -> Vec<String> {
    let mut locations: Vec<String> = events.iter().map(|e| e.location.clone()).collect();
    locations.sort();
    locations.dedup();
    locations
}

// ============================================================================
// Dashboards
// ============================================================================

/// An organizer's event with its registration count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    /// The event.
    pub event: Event,
    /// Registrations found in the registrations table.
    pub registration_count: usize,
    /// Timing at the time the summary was built.
    pub timing: EventTiming,
}

/// Organizer dashboard counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerStats {
    /// Events owned.
    pub total_events: usize,
    /// Registrations across those events.
    pub total_registrations: usize,
    /// Events strictly after now.
    pub upcoming_events: usize,
    /// All other events.
    pub past_events: usize,
}

impl OrganizerStats {
    /// Count `summaries` at `now`.
    #[must_use]
    pub fn from_summaries(summaries: &[EventSummary], now: DateTime<Utc>) -> Self {
        let upcoming_events = summaries.iter().filter(|s| s.event.date > now).count();
        Self {
            total_events: summaries.len(),
            total_registrations: summaries.iter().map(|s| s.registration_count).sum(),
            upcoming_events,
            past_events: summaries.len() - upcoming_events,
        }
    }
}

/// Organizer overview: owned events, soonest first, plus counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerOverview {
    /// Owned events.
    pub events: Vec<EventSummary>,
    /// Counters over `events`.
    pub stats: OrganizerStats,
}

/// Attendee dashboard counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeStats {
    /// Events in the catalog.
    pub available_events: usize,
    /// The attendee's registrations.
    pub my_registrations: usize,
    /// Registrations for events strictly after now.
    pub upcoming_registrations: usize,
}

impl AttendeeStats {
    /// Count `events` and `registrations` at `now`.
    ///
    /// Registrations whose event is missing from `events` are not upcoming.
    #[must_use]
    pub fn compute(events: &[Event], registrations: &[Registration], now: DateTime<Utc>) -> Self {
        let dates: HashMap<&str, DateTime<Utc>> =
            events.iter().map(|e| (e.event_id.as_str(), e.date)).collect();
        let upcoming_registrations = registrations
            .iter()
            .filter(|r| dates.get(r.event_id.as_str()).is_some_and(|date| *date > now))
            .count();
        Self {
            available_events: events.len(),
            my_registrations: registrations.len(),
            upcoming_registrations,
        }
    }
}

/// Attendee dashboard: the catalog, the attendee's registrations and counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeDashboard {
    /// Catalog, soonest first.
    pub events: Vec<Event>,
    /// Distinct event locations for the location filter.
    pub locations: Vec<String>,
    /// The attendee's registrations.
    pub registrations: Vec<Registration>,
    /// Counters.
    pub stats: AttendeeStats,
}
