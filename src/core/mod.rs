pub mod classify;
pub mod orchestrator;

pub use crate::domain::model::{DayFilter, FetchState, SearchResponse};
pub use crate::domain::ports::{ConfigProvider, FetchPolicy, MovieSearch};
pub use crate::utils::error::Result;
