use crate::domain::model::{DayFilter, SearchResponse};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// The remote movie-search service.
///
/// `Ok(None)` stands for an absent response (empty or unreadable body);
/// `Err` for a transport failure.
#[async_trait]
pub trait MovieSearch: Send + Sync {
    async fn search(
        &self,
        wishlist_id: &str,
        filters: &[DayFilter],
    ) -> Result<Option<SearchResponse>>;
}

#[async_trait]
impl<T: MovieSearch + ?Sized> MovieSearch for Arc<T> {
    async fn search(
        &self,
        wishlist_id: &str,
        filters: &[DayFilter],
    ) -> Result<Option<SearchResponse>> {
        (**self).search(wishlist_id, filters).await
    }
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn fetch_policy(&self) -> FetchPolicy;
}

/// What a trigger does while another fetch is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum FetchPolicy {
    /// The new trigger is a no-op.
    #[default]
    IgnoreWhileLoading,
    /// The in-flight call is dropped without writing state and the new one starts.
    CancelAndReplace,
}
