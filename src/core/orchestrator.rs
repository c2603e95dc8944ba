use crate::core::classify::{classify, Classification};
use crate::domain::filters::{build_default_filters, exclude_default_filters, FilterDefaults, FilterSet};
use crate::domain::model::{Day, DayFilter, FetchState};
use crate::domain::ports::{ConfigProvider, FetchPolicy, MovieSearch};
use crate::utils::error::OrganiserError;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, watch};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub policy: FetchPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            policy: FetchPolicy::default(),
        }
    }
}

impl FetchConfig {
    pub fn from_provider<C: ConfigProvider>(config: &C) -> Self {
        Self {
            timeout: config.request_timeout(),
            policy: config.fetch_policy(),
        }
    }
}

/// What a single call to [`FetchOrchestrator::fetch_movies`] ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success { count: usize },
    KnownError(String),
    UnknownError,
    /// Another fetch was loading and the policy ignores new triggers.
    Skipped,
    /// A newer fetch replaced this one before it finished; nothing was written.
    Superseded,
}

impl From<&Classification> for FetchOutcome {
    fn from(classification: &Classification) -> Self {
        match classification {
            Classification::Success(movies) => FetchOutcome::Success { count: movies.len() },
            Classification::KnownError(message) => FetchOutcome::KnownError(message.clone()),
            Classification::UnknownError => FetchOutcome::UnknownError,
        }
    }
}

struct Inputs {
    wishlist_id: String,
    filters: FilterSet,
}

#[derive(Default)]
struct ActiveFetch {
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

/// Owns the wishlist id, the filter set and the fetch lifecycle state.
///
/// At most one fetch is authoritative at a time; see [`FetchPolicy`] for what
/// happens to overlapping triggers.
pub struct FetchOrchestrator<S: MovieSearch> {
    search: S,
    defaults: FilterDefaults,
    config: FetchConfig,
    inputs: Mutex<Inputs>,
    active: Mutex<ActiveFetch>,
    state: watch::Sender<FetchState>,
}

impl<S: MovieSearch> FetchOrchestrator<S> {
    pub fn new(search: S, defaults: FilterDefaults, config: FetchConfig) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            search,
            defaults,
            config,
            inputs: Mutex::new(Inputs {
                wishlist_id: String::new(),
                filters: build_default_filters(&defaults),
            }),
            active: Mutex::new(ActiveFetch::default()),
            state,
        }
    }

    pub fn defaults(&self) -> &FilterDefaults {
        &self.defaults
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn set_wishlist_id(&self, wishlist_id: impl Into<String>) {
        let wishlist_id = wishlist_id.into();
        tracing::debug!("Wishlist id set to {:?}", wishlist_id);
        self.inputs().wishlist_id = wishlist_id;
    }

    pub fn wishlist_id(&self) -> String {
        self.inputs().wishlist_id.clone()
    }

    pub fn set_filters(&self, filters: FilterSet) {
        self.inputs().filters = filters;
    }

    pub fn filters(&self) -> FilterSet {
        self.inputs().filters.clone()
    }

    pub fn update_day(&self, day: Day, edit: impl FnOnce(&mut DayFilter)) {
        edit(self.inputs().filters.get_mut(day));
    }

    pub fn reset_filters(&self) {
        self.inputs().filters = build_default_filters(&self.defaults);
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Receiver woken on every state write.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Fetches with the currently held wishlist id and filters.
    pub async fn trigger_fetch(&self) -> FetchOutcome {
        let (wishlist_id, filters) = {
            let inputs = self.inputs();
            (inputs.wishlist_id.clone(), inputs.filters.clone())
        };
        self.fetch_movies(&wishlist_id, &filters).await
    }

    /// Runs one fetch cycle: enter loading, send the non-default filters,
    /// classify the response, write it and go back to idle. Every failure
    /// ends up in the state; nothing is returned as an error.
    pub async fn fetch_movies(&self, wishlist_id: &str, filters: &FilterSet) -> FetchOutcome {
        let Some((generation, cancelled)) = self.begin() else {
            tracing::debug!("Fetch already in progress, ignoring trigger");
            return FetchOutcome::Skipped;
        };
        let mut guard = InFlight {
            owner: self,
            generation,
            finished: false,
        };

        let reduced = exclude_default_filters(filters, &self.defaults);
        tracing::info!(
            "Fetching movies for wishlist {:?} with {} non-default day filter(s)",
            wishlist_id,
            reduced.len()
        );
        tracing::debug!("Filter payload: {:?}", reduced);

        let classification = tokio::select! {
            classification = self.run_search(wishlist_id, &reduced) => classification,
            _ = cancelled => {
                guard.finished = true;
                tracing::info!("Fetch for wishlist {:?} superseded by a newer one", wishlist_id);
                return FetchOutcome::Superseded;
            }
        };

        guard.finished = true;
        self.finish(generation, classification)
    }

    async fn run_search(&self, wishlist_id: &str, reduced: &[DayFilter]) -> Classification {
        match tokio::time::timeout(self.config.timeout, self.search.search(wishlist_id, reduced)).await {
            Ok(Ok(response)) => classify(response),
            Ok(Err(e)) => {
                tracing::warn!("Movie search failed: {}", e);
                Classification::UnknownError
            }
            Err(_) => {
                let err = OrganiserError::Timeout {
                    seconds: self.config.timeout.as_secs(),
                };
                tracing::warn!("Movie search abandoned: {}", err);
                Classification::UnknownError
            }
        }
    }

    /// Claims the active-fetch slot and enters loading, or returns `None`
    /// when the trigger should be ignored.
    fn begin(&self) -> Option<(u64, oneshot::Receiver<()>)> {
        let mut active = self.active();

        if self.state.borrow().loading {
            match self.config.policy {
                FetchPolicy::IgnoreWhileLoading => return None,
                FetchPolicy::CancelAndReplace => {
                    if let Some(cancel) = active.cancel.take() {
                        let _ = cancel.send(());
                    }
                }
            }
        }

        let (cancel, cancelled) = oneshot::channel();
        active.generation += 1;
        active.cancel = Some(cancel);
        self.state.send_if_modified(|state| !std::mem::replace(&mut state.loading, true));

        Some((active.generation, cancelled))
    }

    fn finish(&self, generation: u64, classification: Classification) -> FetchOutcome {
        let mut active = self.active();
        if active.generation != generation {
            return FetchOutcome::Superseded;
        }
        active.cancel = None;

        let outcome = FetchOutcome::from(&classification);
        self.state.send_modify(|state| {
            classification.apply(state);
            state.loading = false;
        });

        match &outcome {
            FetchOutcome::Success { count } => tracing::info!("Fetched {} movie(s)", count),
            FetchOutcome::KnownError(message) => tracing::info!("Movie service reported: {}", message),
            _ => tracing::info!("Fetch ended with an unknown error"),
        }
        outcome
    }

    /// Returns to idle when a fetch is dropped before it finished.
    fn abandon(&self, generation: u64) {
        let mut active = self.active();
        if active.generation != generation {
            return;
        }
        active.cancel = None;
        self.state.send_if_modified(|state| std::mem::replace(&mut state.loading, false));
    }

    fn inputs(&self) -> MutexGuard<'_, Inputs> {
        self.inputs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> MutexGuard<'_, ActiveFetch> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct InFlight<'a, S: MovieSearch> {
    owner: &'a FetchOrchestrator<S>,
    generation: u64,
    finished: bool,
}

impl<S: MovieSearch> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        if !self.finished {
            self.owner.abandon(self.generation);
        }
    }
}
