use crate::error::SourceResult;
use crate::models::{PropertyRecord, Toast, UserSummary};
use async_trait::async_trait;
use tracing::info;

/// Anything that can list every property on the marketplace.
/// Implementations must return listings oldest first, newest appended last.
#[async_trait]
pub trait PropertySource: Send + Sync {
    async fn fetch_all_properties(&self) -> SourceResult<Vec<PropertyRecord>>;
}

/// Anything that can list every registered user
#[async_trait]
pub trait UserSource: Send + Sync {
    async fn fetch_all_users(&self) -> SourceResult<Vec<UserSummary>>;
}

/// Sink for fire-and-forget UI alerts
pub trait Toaster: Send + Sync {
    fn toast(&self, event: Toast);
}

/// Toaster that only writes the alert to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogToaster;

impl Toaster for LogToaster {
    fn toast(&self, event: Toast) {
        info!(title = %event.title, "🔔 {}", event.description);
    }
}
