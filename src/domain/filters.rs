//! Per-weekday screening filters and the reduction to the entries that
//! differ from the defaults.

use crate::domain::model::{Day, DayFilter};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default window bounds, captured once at startup.
///
/// `to` is the end of the day the snapshot was taken on; it is not re-evaluated
/// when the date rolls over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterDefaults {
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

impl FilterDefaults {
    pub fn snapshot() -> Self {
        Self::at(&Local::now())
    }

    /// Defaults as seen from `now`, in `now`'s timezone.
    pub fn at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let end_of_day = now
            .date_naive()
            .and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or_default());

        Self {
            from: in_zone(&tz, default_from()),
            to: in_zone(&tz, end_of_day),
        }
    }

    pub fn filter_for(&self, day: Day) -> DayFilter {
        DayFilter {
            day,
            included: true,
            from: self.from,
            to: self.to,
        }
    }
}

/// 2018-07-19 10:30:00 local time.
fn default_from() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 7, 19)
        .unwrap_or_default()
        .and_time(NaiveTime::from_hms_opt(10, 30, 0).unwrap_or_default())
}

fn in_zone<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<FixedOffset> {
    tz.from_local_datetime(&local)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&local))
        .fixed_offset()
}

/// Exactly one [`DayFilter`] per weekday, iterated Monday to Sunday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Day, DayFilter>",
    into = "BTreeMap<Day, DayFilter>"
)]
pub struct FilterSet {
    days: [DayFilter; 7],
}

impl FilterSet {
    pub fn defaults(defaults: &FilterDefaults) -> Self {
        Self {
            days: Day::ALL.map(|day| defaults.filter_for(day)),
        }
    }

    pub fn get(&self, day: Day) -> &DayFilter {
        &self.days[day.index()]
    }

    pub fn get_mut(&mut self, day: Day) -> &mut DayFilter {
        &mut self.days[day.index()]
    }

    /// Replaces the entry for `filter.day`.
    pub fn set(&mut self, filter: DayFilter) {
        let index = filter.day.index();
        self.days[index] = filter;
    }

    pub fn exclude_day(&mut self, day: Day) {
        self.get_mut(day).included = false;
    }

    pub fn set_window(&mut self, day: Day, from: NaiveTime, to: NaiveTime) {
        let updated = self.get(day).clone().with_window(from, to);
        self.set(updated);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayFilter> {
        self.days.iter()
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a DayFilter;
    type IntoIter = std::slice::Iter<'a, DayFilter>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

impl TryFrom<BTreeMap<Day, DayFilter>> for FilterSet {
    type Error = String;

    fn try_from(mut map: BTreeMap<Day, DayFilter>) -> Result<Self, Self::Error> {
        let mut days = Vec::with_capacity(Day::ALL.len());
        for day in Day::ALL {
            let filter = map
                .remove(&day)
                .ok_or_else(|| format!("missing filter for {}", day))?;
            if filter.day != day {
                return Err(format!("filter keyed {} is for {}", day, filter.day));
            }
            days.push(filter);
        }

        let days: [DayFilter; 7] = days
            .try_into()
            .map_err(|_| "expected exactly seven day filters".to_string())?;
        Ok(Self { days })
    }
}

impl From<FilterSet> for BTreeMap<Day, DayFilter> {
    fn from(set: FilterSet) -> Self {
        set.days.into_iter().map(|f| (f.day, f)).collect()
    }
}

pub fn build_default_filters(defaults: &FilterDefaults) -> FilterSet {
    FilterSet::defaults(defaults)
}

/// Entries of `filters` that differ from the defaults, Monday first.
/// An empty result means the server defaults apply unchanged.
pub fn exclude_default_filters(filters: &FilterSet, defaults: &FilterDefaults) -> Vec<DayFilter> {
    filters
        .iter()
        .filter(|filter| !filter.same_as(&defaults.filter_for(filter.day)))
        .cloned()
        .collect()
}
