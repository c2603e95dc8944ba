#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::filters::FilterSet;
use crate::domain::model::Day;
use crate::domain::ports::{ConfigProvider, FetchPolicy};
use crate::utils::error::{OrganiserError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveTime;
use std::str::FromStr;
use std::time::Duration;
use self::toml_config::{TomlConfig, DEFAULT_TIMEOUT_SECONDS, MAX_TIMEOUT_SECONDS};

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8080/api/movies";

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(field_name: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|e| OrganiserError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("expected HH:MM ({})", e),
        })
}

/// A user edit to one day of the filter set.
#[derive(Debug, Clone, PartialEq)]
pub struct DayOverride {
    pub day: Day,
    pub included: Option<bool>,
    pub window: Option<(NaiveTime, NaiveTime)>,
}

impl DayOverride {
    pub fn apply_to(&self, filters: &mut FilterSet) {
        if let Some(included) = self.included {
            filters.get_mut(self.day).included = included;
        }
        if let Some((from, to)) = self.window {
            filters.set_window(self.day, from, to);
        }
    }
}

/// `Day=HH:MM-HH:MM`, as given to `--window`.
impl FromStr for DayOverride {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (day, window) = s
            .split_once('=')
            .ok_or_else(|| format!("expected DAY=HH:MM-HH:MM, got '{}'", s))?;
        let day: Day = day.parse()?;
        let (from, to) = window
            .split_once('-')
            .ok_or_else(|| format!("expected HH:MM-HH:MM, got '{}'", window))?;

        let field = format!("--window {}", day);
        let from = parse_time(&field, from).map_err(|e| e.to_string())?;
        let to = parse_time(&field, to).map_err(|e| e.to_string())?;
        validation::validate_window(&field, from, to).map_err(|e| e.to_string())?;

        Ok(Self {
            day,
            included: None,
            window: Some((from, to)),
        })
    }
}

/// Effective settings after merging the config file and command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_endpoint: String,
    pub timeout_seconds: u64,
    pub policy: FetchPolicy,
    pub wishlist_id: String,
    pub overrides: Vec<DayOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            policy: FetchPolicy::default(),
            wishlist_id: String::new(),
            overrides: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        Ok(Self {
            api_endpoint: config.api.endpoint.clone(),
            timeout_seconds: config.timeout_seconds(),
            policy: config.fetch_policy(),
            wishlist_id: config.wishlist_id().unwrap_or_default().to_string(),
            overrides: config.day_overrides()?,
        })
    }

    /// Applies every override in order; later ones win for the same day.
    pub fn apply_overrides(&self, filters: &mut FilterSet) {
        for day_override in &self.overrides {
            day_override.apply_to(filters);
        }
    }
}

impl ConfigProvider for Settings {
    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn fetch_policy(&self) -> FetchPolicy {
        self.policy
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api_endpoint", &self.api_endpoint)?;
        validation::validate_range("timeout_seconds", self.timeout_seconds, 1, MAX_TIMEOUT_SECONDS)?;
        for day_override in &self.overrides {
            if let Some((from, to)) = day_override.window {
                validation::validate_window(&format!("window {}", day_override.day), from, to)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filters::{build_default_filters, exclude_default_filters, FilterDefaults};
    use chrono::{FixedOffset, TimeZone};

    fn defaults() -> FilterDefaults {
        let nz = FixedOffset::east_opt(12 * 3600).unwrap();
        FilterDefaults::at(&nz.with_ymd_and_hms(2018, 7, 25, 9, 0, 0).unwrap())
    }

    #[test]
    fn test_parse_window_argument() {
        let parsed: DayOverride = "fri=18:00-23:30".parse().unwrap();

        assert_eq!(parsed.day, Day::Friday);
        assert_eq!(parsed.included, None);
        assert_eq!(
            parsed.window,
            Some((
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(23, 30, 0).unwrap()
            ))
        );
    }

    #[test]
    fn test_parse_window_argument_errors() {
        assert!("Friday".parse::<DayOverride>().is_err());
        assert!("Friday=18:00".parse::<DayOverride>().is_err());
        assert!("Friyay=18:00-20:00".parse::<DayOverride>().is_err());
        assert!("Friday=20:00-18:00".parse::<DayOverride>().is_err());
        assert!("Friday=late-20:00".parse::<DayOverride>().is_err());
    }

    #[test]
    fn test_parse_time_accepts_seconds() {
        assert_eq!(
            parse_time("t", "10:30:15").unwrap(),
            NaiveTime::from_hms_opt(10, 30, 15).unwrap()
        );
        assert!(parse_time("t", "25:00").is_err());
    }

    #[test]
    fn test_overrides_change_only_their_days() {
        let d = defaults();
        let settings = Settings {
            overrides: vec![
                DayOverride {
                    day: Day::Sunday,
                    included: Some(false),
                    window: None,
                },
                "Wednesday=12:00-18:00".parse().unwrap(),
            ],
            ..Settings::default()
        };

        let mut filters = build_default_filters(&d);
        settings.apply_overrides(&mut filters);

        let reduced = exclude_default_filters(&filters, &d);
        let days: Vec<Day> = reduced.iter().map(|f| f.day).collect();
        assert_eq!(days, vec![Day::Wednesday, Day::Sunday]);
        assert!(!filters.get(Day::Sunday).included);
        assert!(filters.get(Day::Wednesday).included);
    }

    #[test]
    fn test_including_a_default_day_is_not_a_change() {
        let d = defaults();
        let settings = Settings {
            overrides: vec![DayOverride {
                day: Day::Monday,
                included: Some(true),
                window: None,
            }],
            ..Settings::default()
        };

        let mut filters = build_default_filters(&d);
        settings.apply_overrides(&mut filters);
        assert!(exclude_default_filters(&filters, &d).is_empty());
    }

    #[test]
    fn test_settings_from_toml() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
endpoint = "https://api.example.com/movies"

[fetch]
wishlist_id = "abc"

[filters.Tuesday]
included = false
"#,
        )
        .unwrap();

        let settings = Settings::from_toml(&config).unwrap();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.wishlist_id, "abc");
        assert_eq!(settings.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(settings.overrides.len(), 1);
    }

    #[test]
    fn test_default_settings_validate() {
        assert!(Settings::default().validate().is_ok());
        let bad = Settings {
            api_endpoint: "nope".to_string(),
            ..Settings::default()
        };
        assert!(bad.validate().is_err());
    }
}
