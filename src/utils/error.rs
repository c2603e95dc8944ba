use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrganiserError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV output error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

impl OrganiserError {
    /// Short message suitable for printing to the terminal.
    pub fn user_friendly_message(&self) -> String {
        match self {
            OrganiserError::ApiError(_) => "Could not reach the movie service".to_string(),
            OrganiserError::CsvError(_) | OrganiserError::IoError(_) => {
                "Failed to write the movie list".to_string()
            }
            OrganiserError::SerializationError(_) => {
                "The movie service returned data that could not be read".to_string()
            }
            OrganiserError::TomlParseError(_) => "The configuration file is not valid TOML".to_string(),
            OrganiserError::ConfigError { message } => message.clone(),
            OrganiserError::InvalidConfigValueError { field, reason, .. } => {
                format!("{} is invalid: {}", field, reason)
            }
            OrganiserError::MissingConfigError { field } => format!("{} must be set", field),
            OrganiserError::Timeout { seconds } => {
                format!("The movie service did not answer within {}s", seconds)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            OrganiserError::ApiError(_) | OrganiserError::Timeout { .. } => {
                "Check your network connection and the api endpoint, then try again"
            }
            OrganiserError::CsvError(_) | OrganiserError::IoError(_) => {
                "Check that the output is writable"
            }
            OrganiserError::SerializationError(_) => "Try again later or with a different wishlist",
            OrganiserError::TomlParseError(_)
            | OrganiserError::ConfigError { .. }
            | OrganiserError::InvalidConfigValueError { .. }
            | OrganiserError::MissingConfigError { .. } => {
                "Fix the configuration file or command line flags and run again"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, OrganiserError>;
