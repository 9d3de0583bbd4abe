//! Listing filters.

use crate::event::Event;
use chrono::NaiveDate;
use serde::Deserialize;

/// Optional narrowing of the public event list.
///
/// Text filters are case-insensitive substring matches; `date` matches events
/// whose UTC calendar day equals the given date. An empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EventFilter {
    /// Substring of the title
    #[serde(default)]
    pub title: Option<String>,
    /// Substring of the location
    #[serde(default)]
    pub location: Option<String>,
    /// Calendar day (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl EventFilter {
    /// Drop blank text filters so `?title=` behaves like no filter.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            title: non_blank(self.title),
            location: non_blank(self.location),
            date: self.date,
        }
    }

    /// Whether no criteria are set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.location.is_none() && self.date.is_none()
    }

    /// Whether `event` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        contains_ignore_case(&event.title, self.title.as_deref())
            && contains_ignore_case(&event.location, self.location.as_deref())
            && self
                .date
                .is_none_or(|day| event.date.date_naive() == day)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
}

/// Sort events by date, then by creation time.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
}
