use crate::error::{SourceError, SourceResult};
use crate::models::{PropertyRecord, UserSummary};
use crate::sources::traits::{PropertySource, UserSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory marketplace, shared between clones.
///
/// Used by the demo mode and by tests that need to grow or break a source
/// between ticks.
#[derive(Clone, Default)]
pub struct MemorySource {
    properties: Arc<RwLock<Vec<PropertyRecord>>>,
    users: Arc<RwLock<Vec<UserSummary>>>,
    properties_offline: Arc<AtomicBool>,
    users_offline: Arc<AtomicBool>,
}

impl MemorySource {
    pub fn new(properties: Vec<PropertyRecord>, users: Vec<UserSummary>) -> Self {
        Self {
            properties: Arc::new(RwLock::new(properties)),
            users: Arc::new(RwLock::new(users)),
            ..Self::default()
        }
    }

    pub async fn push_property(&self, property: PropertyRecord) {
        self.properties.write().await.push(property);
    }

    pub async fn push_user(&self, user: UserSummary) {
        self.users.write().await.push(user);
    }

    pub async fn remove_property(&self, id: &str) {
        self.properties.write().await.retain(|p| p.id != id);
    }

    /// Make property fetches fail until switched back
    pub fn set_properties_offline(&self, offline: bool) {
        self.properties_offline.store(offline, Ordering::SeqCst);
    }

    /// Make user fetches fail until switched back
    pub fn set_users_offline(&self, offline: bool) {
        self.users_offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl PropertySource for MemorySource {
    async fn fetch_all_properties(&self) -> SourceResult<Vec<PropertyRecord>> {
        if self.properties_offline.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                source_name: "properties",
            });
        }
        Ok(self.properties.read().await.clone())
    }
}

#[async_trait]
impl UserSource for MemorySource {
    async fn fetch_all_users(&self) -> SourceResult<Vec<UserSummary>> {
        if self.users_offline.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable {
                source_name: "users",
            });
        }
        Ok(self.users.read().await.clone())
    }
}
