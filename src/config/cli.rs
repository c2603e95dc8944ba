use crate::app::render::OutputFormat;
use crate::config::toml_config::TomlConfig;
use crate::config::{DayOverride, Settings};
use crate::domain::model::Day;
use crate::domain::ports::FetchPolicy;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "festival-organiser")]
#[command(about = "Fetch the festival screenings on a wishlist, filtered by day and time")]
pub struct CliConfig {
    /// Wishlist to fetch
    #[arg(short, long, env = "FESTIVAL_WISHLIST_ID")]
    pub wishlist_id: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Movie search endpoint (overrides the config file)
    #[arg(long)]
    pub api_endpoint: Option<String>,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// What to do when a fetch is triggered while another is running
    #[arg(long, value_enum)]
    pub policy: Option<FetchPolicy>,

    /// Drop screenings on this day (repeatable)
    #[arg(long = "exclude", value_name = "DAY")]
    pub exclude: Vec<Day>,

    /// Restrict a day to a time window, e.g. Friday=18:00-23:30 (repeatable)
    #[arg(long = "window", value_name = "DAY=HH:MM-HH:MM")]
    pub windows: Vec<DayOverride>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

impl CliConfig {
    /// Config file first, then flags on top of it.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Settings::from_toml(&TomlConfig::from_file(path)?)?
            }
            None => Settings::default(),
        };
        self.apply_to(&mut settings);
        Ok(settings)
    }

    fn apply_to(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.api_endpoint {
            settings.api_endpoint = endpoint.clone();
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        if let Some(policy) = self.policy {
            settings.policy = policy;
        }
        if let Some(wishlist_id) = &self.wishlist_id {
            settings.wishlist_id = wishlist_id.trim().to_string();
        }

        settings.overrides.extend(self.exclude.iter().map(|&day| DayOverride {
            day,
            included: Some(false),
            window: None,
        }));
        settings.overrides.extend(self.windows.iter().cloned());
    }
}
