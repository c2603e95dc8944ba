use crate::domain::model::{FetchState, Movie, SearchResponse};

pub const UNKNOWN_ERROR_MESSAGE: &str =
    "An unknown error has occurred please try later or with a different wishlist";

/// Terminal shape of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Success(Vec<Movie>),
    KnownError(String),
    UnknownError,
}

/// First matching rule wins:
/// 1. a non-empty movie list is a success,
/// 2. no response, or a message object wrapping another message, is unknown,
/// 3. a plain message string is passed through.
///
/// Anything else (an empty list with no message, say) is unknown as well.
pub fn classify(response: Option<SearchResponse>) -> Classification {
    let Some(response) = response else {
        return Classification::UnknownError;
    };

    if let Some(movies) = response.movie_list {
        if !movies.is_empty() {
            return Classification::Success(movies);
        }
    }

    match response.message {
        Some(message) if message.is_nested() => Classification::UnknownError,
        Some(message) => match message.as_text() {
            Some(text) => Classification::KnownError(text.to_string()),
            None => {
                tracing::warn!("Unrecognised message shape in search response: {:?}", message);
                Classification::UnknownError
            }
        },
        None => Classification::UnknownError,
    }
}

impl Classification {
    /// Writes the outcome into `state`. Does not touch `loading`.
    pub fn apply(self, state: &mut FetchState) {
        match self {
            Classification::Success(movies) => {
                state.movies = movies;
                state.error = None;
            }
            Classification::KnownError(message) => {
                state.movies.clear();
                state.error = Some(message);
            }
            Classification::UnknownError => {
                state.movies.clear();
                state.error = Some(UNKNOWN_ERROR_MESSAGE.to_string());
            }
        }
    }
}
