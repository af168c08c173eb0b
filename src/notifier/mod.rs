pub mod feed;

use crate::models::{Notification, NotificationKind};
use crate::sources::{PropertySource, Toaster, UserSource};
use anyhow::{Context, Result};
use chrono::Utc;
use feed::Feed;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of the notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// First fetch in flight
    Initializing,
    Steady,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub poll_interval: Duration,
    /// Polled notifications to keep; the initial load is always kept
    pub max_notifications: Option<usize>,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_notifications: None,
        }
    }
}

/// What a single tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Initial population; no toasts fired
    Initialized { users: usize, properties: usize },
    /// Steady-state poll
    Polled { new_users: usize, new_properties: usize },
    /// Another tick was still in flight
    Skipped,
    /// The notifier was stopped while fetching; results were dropped
    Discarded,
}

/// Point-in-time copy of the notifier state
#[derive(Debug, Clone)]
pub struct NotifierSnapshot {
    pub phase: Phase,
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

struct State {
    phase: Phase,
    feed: Feed,
}

/// Polls users and listings and turns newly-appeared records into
/// notifications and toasts.
pub struct Notifier {
    properties: Arc<dyn PropertySource>,
    users: Arc<dyn UserSource>,
    toaster: Arc<dyn Toaster>,
    settings: NotifierSettings,
    state: Mutex<State>,
    busy: AtomicBool,
    cancel_token: CancellationToken,
}

/// Clears the busy flag when a tick ends, however it ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Notifier {
    pub fn new(
        properties: Arc<dyn PropertySource>,
        users: Arc<dyn UserSource>,
        toaster: Arc<dyn Toaster>,
        settings: NotifierSettings,
    ) -> Self {
        let feed = Feed::new(settings.max_notifications);
        Self {
            properties,
            users,
            toaster,
            settings,
            state: Mutex::new(State {
                phase: Phase::Uninitialized,
                feed,
            }),
            busy: AtomicBool::new(false),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Run one poll: fetch both sources concurrently, diff, notify.
    pub async fn tick(&self) -> TickOutcome {
        if self.cancel_token.is_cancelled() {
            return TickOutcome::Discarded;
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!("Previous tick still running, skipping");
            return TickOutcome::Skipped;
        }
        let _busy = BusyGuard(&self.busy);

        let initial = {
            let mut state = self.state.lock().await;
            if state.phase == Phase::Uninitialized {
                state.phase = Phase::Initializing;
            }
            state.phase == Phase::Initializing
        };

        let (properties, users) = tokio::join!(
            self.properties.fetch_all_properties(),
            self.users.fetch_all_users()
        );

        if self.cancel_token.is_cancelled() {
            debug!("Notifier stopped during fetch, discarding results");
            return TickOutcome::Discarded;
        }

        let properties = properties
            .map_err(|e| warn!(source = e.source_name(), "Fetch failed, treating as empty: {}", e))
            .ok();
        let users = users
            .map_err(|e| warn!(source = e.source_name(), "Fetch failed, treating as empty: {}", e))
            .ok();

        let added = {
            let mut state = self.state.lock().await;
            let added = state
                .feed
                .apply(users.as_deref(), properties.as_deref(), Utc::now());
            state.phase = Phase::Steady;
            added
        };

        if initial {
            let users = users.as_ref().map_or(0, Vec::len);
            let properties = properties.as_ref().map_or(0, Vec::len);
            info!("Notifier initialized with {} users and {} listings", users, properties);
            return TickOutcome::Initialized { users, properties };
        }

        let mut new_users = 0;
        let mut new_properties = 0;
        for notification in &added {
            match notification.kind {
                NotificationKind::User => new_users += 1,
                NotificationKind::Property => new_properties += 1,
            }
            info!("{}", notification.message);
            self.toaster.toast(notification.toast());
        }

        debug!(
            "Tick done: {} new users, {} new listings",
            new_users, new_properties
        );
        TickOutcome::Polled {
            new_users,
            new_properties,
        }
    }

    pub async fn snapshot(&self) -> NotifierSnapshot {
        let state = self.state.lock().await;
        NotifierSnapshot {
            phase: state.phase,
            notifications: state.feed.notifications().to_vec(),
            unread: state.feed.unread(),
        }
    }

    pub async fn mark_all_read(&self) {
        self.state.lock().await.feed.mark_all_read();
    }

    /// Start polling on a background task. The first tick runs immediately.
    pub fn spawn(self) -> NotifierHandle {
        let notifier = Arc::new(self);
        let task = tokio::spawn(Arc::clone(&notifier).run());
        NotifierHandle {
            notifier,
            task: Some(task),
        }
    }

    async fn run(self: Arc<Self>) {
        let period = self.settings.poll_interval.max(Duration::from_millis(100));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Notifier polling every {}s",
            period.as_secs_f32()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        outcome = self.tick() => debug!("Tick outcome: {:?}", outcome),
                        _ = self.cancel_token.cancelled() => break,
                    }
                }
                _ = self.cancel_token.cancelled() => break,
            }
        }

        self.state.lock().await.phase = Phase::Stopped;
        info!("Notifier stopped");
    }
}

/// Owner of a running notifier. Dropping it stops polling.
pub struct NotifierHandle {
    notifier: Arc<Notifier>,
    task: Option<JoinHandle<()>>,
}

impl NotifierHandle {
    pub async fn snapshot(&self) -> NotifierSnapshot {
        self.notifier.snapshot().await
    }

    /// Poll now instead of waiting for the next interval
    pub async fn refresh(&self) -> TickOutcome {
        self.notifier.tick().await
    }

    pub async fn mark_all_read(&self) {
        self.notifier.mark_all_read().await
    }

    /// Stop polling and wait for the task to wind down
    pub async fn stop(mut self) -> Result<()> {
        self.notifier.cancel_token.cancel();
        match self.task.take() {
            Some(task) => task.await.context("notifier task failed to join"),
            None => Ok(()),
        }
    }
}

impl Drop for NotifierHandle {
    fn drop(&mut self) {
        self.notifier.cancel_token.cancel();
    }
}
