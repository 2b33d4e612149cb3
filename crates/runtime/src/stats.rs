use formats::feed::FeedKind;
use serde::Serialize;

use crate::epoch::Epoch;

/// Counters for one feed since startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Successful responses overtaken by a newer one.
    pub stale_discarded: u64,
    /// Features skipped during normalization, summed over applied responses.
    pub dropped_features: u64,
    pub last_applied: Epoch,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshStats {
    pub stations: FeedStats,
    pub firms: FeedStats,
}

impl RefreshStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self, feed: FeedKind) -> &FeedStats {
        match feed {
            FeedKind::Stations => &self.stations,
            FeedKind::Firms => &self.firms,
        }
    }

    fn feed_mut(&mut self, feed: FeedKind) -> &mut FeedStats {
        match feed {
            FeedKind::Stations => &mut self.stations,
            FeedKind::Firms => &mut self.firms,
        }
    }

    pub fn record_issued(&mut self, feed: FeedKind) {
        self.feed_mut(feed).issued += 1;
    }

    pub fn record_applied(&mut self, feed: FeedKind, epoch: Epoch, dropped: usize) {
        let s = self.feed_mut(feed);
        s.succeeded += 1;
        s.dropped_features += dropped as u64;
        s.last_applied = epoch;
    }

    pub fn record_stale(&mut self, feed: FeedKind) {
        self.feed_mut(feed).stale_discarded += 1;
    }

    pub fn record_failed(&mut self, feed: FeedKind, error: impl Into<String>) {
        let s = self.feed_mut(feed);
        s.failed += 1;
        s.last_error = Some(error.into());
    }
}
