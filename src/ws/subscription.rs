//! Per-connection subscription manager.
//!
//! Tracks which event kinds a WebSocket client listens to and provides
//! server-side event filtering.

use std::collections::HashSet;

use crate::domain::StoreEventKind;

/// Manages the set of event-kind subscriptions for a single connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed kinds. If `subscribe_all` is true, this set is ignored.
    kinds: HashSet<StoreEventKind>,
    /// Whether the client subscribes to every kind (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds kinds to the subscription set.
    pub fn subscribe(&mut self, kinds: &[StoreEventKind], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.kinds.extend(kinds.iter().copied());
    }

    /// Removes kinds from the subscription set. A wildcard unsubscribe
    /// clears everything.
    pub fn unsubscribe(&mut self, kinds: &[StoreEventKind], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
            self.kinds.clear();
        }
        for kind in kinds {
            self.kinds.remove(kind);
        }
    }

    /// Returns `true` if events of `kind` pass the filter.
    #[must_use]
    pub fn matches(&self, kind: StoreEventKind) -> bool {
        self.subscribe_all || self.kinds.contains(&kind)
    }

    /// Returns the number of explicitly subscribed kinds.
    #[must_use]
    pub fn count(&self) -> usize {
        self.kinds.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
