pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliConfig;

pub use crate::adapters::http::HttpMovieSearch;
pub use crate::config::Settings;
pub use crate::core::orchestrator::{FetchConfig, FetchOrchestrator, FetchOutcome};
pub use crate::domain::filters::{build_default_filters, exclude_default_filters, FilterDefaults, FilterSet};
pub use crate::domain::model::{Day, DayFilter, FetchState, Movie, SearchResponse};
pub use crate::domain::ports::{FetchPolicy, MovieSearch};
pub use crate::utils::error::{OrganiserError, Result};
