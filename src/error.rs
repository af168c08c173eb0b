use reqwest::StatusCode;

/// Failure to fetch a collection from one of the backend sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {source_name} failed: {error}")]
    Request {
        source_name: &'static str,
        #[source]
        error: reqwest::Error,
    },

    #[error("{source_name} returned status {status}")]
    Status {
        source_name: &'static str,
        status: StatusCode,
    },

    #[error("could not decode {source_name} payload: {error}")]
    Decode {
        source_name: &'static str,
        #[source]
        error: serde_json::Error,
    },

    #[error("{source_name} is unavailable")]
    Unavailable { source_name: &'static str },
}

impl SourceError {
    pub fn source_name(&self) -> &'static str {
        match self {
            Self::Request { source_name, .. }
            | Self::Status { source_name, .. }
            | Self::Decode { source_name, .. }
            | Self::Unavailable { source_name } => source_name,
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// A listing that breaks the numeric invariants of the data model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingError {
    #[error("listing {id} has invalid {field} {value}")]
    InvalidField {
        id: String,
        field: &'static str,
        value: f64,
    },
}
