use crate::models::{Notification, PropertyRecord, UserSummary};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashSet;

/// Ids seen by the last successful fetch of one source.
/// `None` until that source has loaded once.
#[derive(Debug, Default)]
struct KnownIds(Option<HashSet<String>>);

enum Change<'r, T> {
    /// First successful load: everything is existing data
    Seeded(Vec<&'r T>),
    /// Records whose id was not known, in source order
    Added(Vec<&'r T>),
}

impl KnownIds {
    fn diff<'r, T>(&mut self, fetched: &'r [T], id: impl Fn(&T) -> &str) -> Change<'r, T> {
        let current: HashSet<String> = fetched.iter().map(|r| id(r).to_string()).collect();
        let change = match &self.0 {
            None => Change::Seeded(fetched.iter().collect()),
            Some(known) => Change::Added(
                fetched
                    .iter()
                    .filter(|r| !known.contains(id(*r)))
                    .collect(),
            ),
        };
        self.0 = Some(current);
        change
    }

    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, HashSet::len)
    }
}

/// The dashboard notification list and the bookkeeping needed to extend it.
///
/// A fetch result of `None` means the source failed this tick: it contributes
/// nothing and its known ids are left untouched.
#[derive(Debug)]
pub struct Feed {
    notifications: Vec<Notification>,
    users: KnownIds,
    properties: KnownIds,
    unread: usize,
    /// Entries on top that came from steady-state polls, newest first
    live: usize,
    capacity: Option<usize>,
}

impl Feed {
    /// `capacity` bounds how many polled notifications are kept on top of
    /// the initial load, oldest dropped first. `None` keeps every one.
    /// Seeded entries are never dropped.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            notifications: Vec::new(),
            users: KnownIds::default(),
            properties: KnownIds::default(),
            unread: 0,
            live: 0,
            capacity,
        }
    }

    /// Fold one fetch into the feed and return the notifications that
    /// deserve a toast (records that appeared since the previous load).
    pub fn apply(
        &mut self,
        users: Option<&[UserSummary]>,
        properties: Option<&[PropertyRecord]>,
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        let mut seeded = Vec::new();
        let mut added = Vec::new();

        if let Some(users) = users {
            match self.users.diff(users, |u| u.id.as_str()) {
                Change::Seeded(all) => {
                    seeded.extend(all.into_iter().map(|u| Notification::for_user(u, now)))
                }
                Change::Added(new) => {
                    added.extend(new.into_iter().map(|u| Notification::for_user(u, now)))
                }
            }
        }

        if let Some(properties) = properties {
            match self.properties.diff(properties, |p| p.id.as_str()) {
                Change::Seeded(all) => {
                    seeded.extend(all.into_iter().map(|p| Notification::for_property(p, now)))
                }
                Change::Added(new) => {
                    added.extend(new.into_iter().map(|p| Notification::for_property(p, now)))
                }
            }
        }

        if !seeded.is_empty() {
            // Seeded entries merge into the tail; the live prefix keeps its place
            let mut tail = self.notifications.split_off(self.live);
            tail.extend(seeded);
            tail.sort_by_key(|n| Reverse(n.timestamp));
            self.notifications.extend(tail);
        }

        // Newest record on top
        for notification in &added {
            self.notifications.insert(0, notification.clone());
        }
        self.live += added.len();
        self.unread += added.len();

        if let Some(capacity) = self.capacity {
            let excess = self.live.saturating_sub(capacity);
            self.notifications.drain(self.live - excess..self.live);
            self.live -= excess;
        }
        self.unread = self.unread.min(self.live);

        added
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn mark_all_read(&mut self) {
        self.unread = 0;
    }

    pub fn known_users(&self) -> usize {
        self.users.len()
    }

    pub fn known_properties(&self) -> usize {
        self.properties.len()
    }
}
