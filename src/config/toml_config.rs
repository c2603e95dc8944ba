use crate::config::{parse_time, DayOverride};
use crate::domain::model::Day;
use crate::domain::ports::{ConfigProvider, FetchPolicy};
use crate::utils::error::{OrganiserError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub fetch: FetchConfigSection,
    /// Keyed by day name, e.g. `[filters.Saturday]`.
    #[serde(default)]
    pub filters: BTreeMap<String, DayFilterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfigSection {
    pub policy: Option<FetchPolicy>,
    pub wishlist_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayFilterConfig {
    pub included: Option<bool>,
    /// `HH:MM`
    pub from: Option<String>,
    /// `HH:MM`
    pub to: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the variable's value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OrganiserError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }

    pub fn wishlist_id(&self) -> Option<&str> {
        self.fetch.wishlist_id.as_deref()
    }

    /// Day overrides in Monday-first order.
    pub fn day_overrides(&self) -> Result<Vec<DayOverride>> {
        let mut overrides = self
            .filters
            .iter()
            .map(|(name, filter)| filter.to_override(name))
            .collect::<Result<Vec<_>>>()?;
        overrides.sort_by_key(|o| o.day);
        Ok(overrides)
    }
}

impl DayFilterConfig {
    fn to_override(&self, name: &str) -> Result<DayOverride> {
        let field = format!("filters.{}", name);
        let day: Day = name
            .parse()
            .map_err(|reason| OrganiserError::InvalidConfigValueError {
                field: "filters".to_string(),
                value: name.to_string(),
                reason,
            })?;

        let window = match (&self.from, &self.to) {
            (None, None) => None,
            (Some(from), Some(to)) => {
                let from = parse_time(&format!("{}.from", field), from)?;
                let to = parse_time(&format!("{}.to", field), to)?;
                validation::validate_window(&field, from, to)?;
                Some((from, to))
            }
            _ => {
                return Err(OrganiserError::MissingConfigError {
                    field: format!("{} (from and to must be set together)", field),
                })
            }
        };

        Ok(DayOverride {
            day,
            included: self.included,
            window,
        })
    }
}

impl ConfigProvider for TomlConfig {
    fn api_endpoint(&self) -> &str {
        &self.api.endpoint
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds())
    }

    fn fetch_policy(&self) -> FetchPolicy {
        self.fetch.policy.unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.endpoint", &self.api.endpoint)?;
        validation::validate_range(
            "api.timeout_seconds",
            self.timeout_seconds(),
            1,
            MAX_TIMEOUT_SECONDS,
        )?;
        self.day_overrides()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[api]
endpoint = "https://api.example.com/movies"
timeout_seconds = 10

[fetch]
policy = "cancel_and_replace"
wishlist_id = "abc123"

[filters.Saturday]
included = false

[filters.friday]
from = "18:00"
to = "23:30"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();

        assert_eq!(config.api_endpoint(), "https://api.example.com/movies");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.fetch_policy(), FetchPolicy::CancelAndReplace);
        assert_eq!(config.wishlist_id(), Some("abc123"));

        let overrides = config.day_overrides().unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].day, Day::Friday);
        assert_eq!(
            overrides[0].window,
            Some((
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(23, 30, 0).unwrap()
            ))
        );
        assert_eq!(overrides[1].day, Day::Saturday);
        assert_eq!(overrides[1].included, Some(false));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
endpoint = "http://localhost:8080/movies"
"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.request_timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));
        assert_eq!(config.fetch_policy(), FetchPolicy::IgnoreWhileLoading);
        assert_eq!(config.wishlist_id(), None);
        assert!(config.day_overrides().unwrap().is_empty());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("FESTIVAL_TEST_WISHLIST", "from-env");

        let config = TomlConfig::from_toml_str(
            r#"
[api]
endpoint = "https://api.example.com"

[fetch]
wishlist_id = "${FESTIVAL_TEST_WISHLIST}"
"#,
        )
        .unwrap();
        assert_eq!(config.wishlist_id(), Some("from-env"));

        std::env::remove_var("FESTIVAL_TEST_WISHLIST");
    }

    #[test]
    fn test_unknown_env_var_is_left_alone() {
        let config = TomlConfig::from_toml_str(
            r#"
[api]
endpoint = "https://api.example.com"

[fetch]
wishlist_id = "${FESTIVAL_SURELY_UNSET_VARIABLE}"
"#,
        )
        .unwrap();
        assert_eq!(config.wishlist_id(), Some("${FESTIVAL_SURELY_UNSET_VARIABLE}"));
    }

    #[test]
    fn test_config_validation_failures() {
        let cases = [
            r#"
[api]
endpoint = "invalid-url"
"#,
            r#"
[api]
endpoint = "https://api.example.com"
timeout_seconds = 0
"#,
            r#"
[api]
endpoint = "https://api.example.com"

[filters.Funday]
included = false
"#,
            r#"
[api]
endpoint = "https://api.example.com"

[filters.Monday]
from = "20:00"
to = "10:00"
"#,
            r#"
[api]
endpoint = "https://api.example.com"

[filters.Monday]
from = "20:00"
"#,
            r#"
[api]
endpoint = "https://api.example.com"

[filters.Monday]
from = "8pm"
to = "23:00"
"#,
        ];

        for case in cases {
            let config = TomlConfig::from_toml_str(case).unwrap();
            assert!(config.validate().is_err(), "expected failure for {}", case);
        }
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = TomlConfig::from_toml_str("[api\nendpoint = 1").unwrap_err();
        assert!(matches!(err, OrganiserError::TomlParseError(_)));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[api]
endpoint = "https://api.example.com/movies"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.api_endpoint(), "https://api.example.com/movies");
    }
}
