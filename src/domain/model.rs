use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    /// Canonical order, Monday first.
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Day::ALL
            .into_iter()
            .find(|day| {
                day.name().eq_ignore_ascii_case(wanted)
                    || (wanted.len() == 3 && day.name()[..3].eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| format!("unknown day '{}'", s))
    }
}

impl From<Weekday> for Day {
    fn from(weekday: Weekday) -> Self {
        Day::ALL[weekday.num_days_from_monday() as usize]
    }
}

impl From<Day> for Weekday {
    fn from(day: Day) -> Self {
        match day {
            Day::Monday => Weekday::Mon,
            Day::Tuesday => Weekday::Tue,
            Day::Wednesday => Weekday::Wed,
            Day::Thursday => Weekday::Thu,
            Day::Friday => Weekday::Fri,
            Day::Saturday => Weekday::Sat,
            Day::Sunday => Weekday::Sun,
        }
    }
}

/// Inclusion flag and acceptable screening window for one weekday.
///
/// `from <= to` is expected but not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayFilter {
    pub day: Day,
    pub included: bool,
    pub from: DateTime<FixedOffset>,
    pub to: DateTime<FixedOffset>,
}

impl DayFilter {
    /// Field-by-field comparison. Timestamps compare as instants, so the same
    /// moment written with two different offsets is considered equal.
    pub fn same_as(&self, other: &DayFilter) -> bool {
        self.day == other.day
            && self.included == other.included
            && self.from.timestamp_nanos_opt() == other.from.timestamp_nanos_opt()
            && self.to.timestamp_nanos_opt() == other.to.timestamp_nanos_opt()
    }

    /// Replaces the time of day of both bounds, keeping their dates and offsets.
    pub fn with_window(mut self, from: NaiveTime, to: NaiveTime) -> Self {
        self.from = at_time_of_day(&self.from, from);
        self.to = at_time_of_day(&self.to, to);
        self
    }

    pub fn excluded(mut self) -> Self {
        self.included = false;
        self
    }
}

impl PartialEq for DayFilter {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

fn at_time_of_day(ts: &DateTime<FixedOffset>, time: NaiveTime) -> DateTime<FixedOffset> {
    let offset = *ts.offset();
    let local = ts.naive_local().date().and_time(time);
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}

/// A screening record as returned by the movie service. Only its presence
/// matters to the fetch cycle; the accessors exist for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Movie(pub serde_json::Value);

impl Movie {
    /// Keys tried, in order, when looking for a title.
    pub const TITLE_KEYS: [&'static str; 3] = ["title", "name", "movieTitle"];

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn title(&self) -> Option<&str> {
        Self::TITLE_KEYS
            .iter()
            .find_map(|key| self.field(key).and_then(|v| v.as_str()))
    }

    /// Renders a field as plain text, empty when missing.
    pub fn text(&self, name: &str) -> String {
        match self.field(name) {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// `message` as sent by the movie service: usually a string, sometimes an
/// error object wrapping another message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    Text(String),
    Other(serde_json::Value),
}

impl ResponseMessage {
    /// True when the message is an object carrying its own non-empty `message`.
    pub fn is_nested(&self) -> bool {
        match self {
            ResponseMessage::Text(_) => false,
            ResponseMessage::Other(value) => match value.get("message") {
                None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
                Some(serde_json::Value::String(s)) => !s.is_empty(),
                Some(_) => true,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseMessage::Text(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub movie_list: Option<Vec<Movie>>,
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

impl SearchResponse {
    pub fn movies(movies: Vec<Movie>) -> Self {
        Self {
            movie_list: Some(movies),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            movie_list: None,
            message: Some(ResponseMessage::Text(message.into())),
        }
    }
}

/// What the view renders: the last classified result and whether a request
/// is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FetchState {
    pub movies: Vec<Movie>,
    pub loading: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn nz() -> FixedOffset {
        FixedOffset::east_opt(12 * 3600).unwrap()
    }

    fn filter(day: Day) -> DayFilter {
        DayFilter {
            day,
            included: true,
            from: nz().with_ymd_and_hms(2018, 7, 19, 10, 30, 0).unwrap(),
            to: nz().with_ymd_and_hms(2018, 7, 26, 23, 59, 59).unwrap(),
        }
    }

    #[test]
    fn test_day_parsing() {
        assert_eq!("monday".parse::<Day>().unwrap(), Day::Monday);
        assert_eq!("SUN".parse::<Day>().unwrap(), Day::Sunday);
        assert_eq!(" Friday ".parse::<Day>().unwrap(), Day::Friday);
        assert!("Funday".parse::<Day>().is_err());
    }

    #[test]
    fn test_day_order_is_monday_first() {
        let mut days = vec![Day::Sunday, Day::Wednesday, Day::Monday];
        days.sort();
        assert_eq!(days, vec![Day::Monday, Day::Wednesday, Day::Sunday]);
        assert_eq!(Day::from(Weekday::Sun), Day::Sunday);
        assert_eq!(Weekday::from(Day::Tuesday), Weekday::Tue);
    }

    #[test]
    fn test_same_as_compares_instants() {
        let a = filter(Day::Monday);
        let mut b = a.clone();
        b.from = a.from.with_timezone(&FixedOffset::east_opt(0).unwrap());

        assert_ne!(a.from.to_rfc3339(), b.from.to_rfc3339());
        assert!(a.same_as(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_as_checks_every_field() {
        let a = filter(Day::Monday);

        assert!(!a.same_as(&filter(Day::Tuesday)));
        assert!(!a.same_as(&a.clone().excluded()));

        let mut later = a.clone();
        later.to = later.to + Duration::milliseconds(1);
        assert!(!a.same_as(&later));
    }

    #[test]
    fn test_with_window_keeps_date_and_offset() {
        let f = filter(Day::Friday).with_window(
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(23, 30, 0).unwrap(),
        );

        assert_eq!(f.from, nz().with_ymd_and_hms(2018, 7, 19, 18, 0, 0).unwrap());
        assert_eq!(f.to, nz().with_ymd_and_hms(2018, 7, 26, 23, 30, 0).unwrap());
        assert_eq!(f.from.offset(), &nz());
    }

    #[test]
    fn test_search_response_shapes() {
        let ok: SearchResponse =
            serde_json::from_value(serde_json::json!({"movieList": [{"title": "Shirkers"}]})).unwrap();
        assert_eq!(ok.movie_list.as_ref().map(Vec::len), Some(1));
        assert_eq!(ok.movie_list.unwrap()[0].title(), Some("Shirkers"));

        let known: SearchResponse =
            serde_json::from_value(serde_json::json!({"message": "Wishlist not found"})).unwrap();
        let message = known.message.unwrap();
        assert_eq!(message.as_text(), Some("Wishlist not found"));
        assert!(!message.is_nested());

        let nested: SearchResponse = serde_json::from_value(
            serde_json::json!({"message": {"message": "boom", "stack": "..."}}),
        )
        .unwrap();
        assert!(nested.message.unwrap().is_nested());
    }

    #[test]
    fn test_day_filter_serializes_with_day_name() {
        let json = serde_json::to_value(filter(Day::Saturday)).unwrap();
        assert_eq!(json["day"], "Saturday");
        assert_eq!(json["included"], true);
        assert_eq!(json["from"], "2018-07-19T10:30:00+12:00");
    }
}
