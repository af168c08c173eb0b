pub mod config;
pub mod error;
pub mod models;
pub mod notifier;
pub mod search;
pub mod sources;

pub use crate::config::AppConfig;
pub use error::{ListingError, SourceError};
pub use notifier::{Notifier, NotifierHandle, NotifierSettings, TickOutcome};
pub use search::{search, SearchCriteria, SearchPage};
