use std::fmt;

use formats::feed::FeedKind;
use serde::Serialize;

/// Per-feed request sequence number. Epoch 0 is never issued.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
struct Counters {
    issued: Epoch,
    applied: Epoch,
}

/// Guards against out-of-order completions: a response is applied only when
/// its epoch is newer than the last applied one for the same feed.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RequestEpochs {
    stations: Counters,
    firms: Counters,
}

impl RequestEpochs {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, feed: FeedKind) -> &mut Counters {
        match feed {
            FeedKind::Stations => &mut self.stations,
            FeedKind::Firms => &mut self.firms,
        }
    }

    fn get(&self, feed: FeedKind) -> Counters {
        match feed {
            FeedKind::Stations => self.stations,
            FeedKind::Firms => self.firms,
        }
    }

    /// Tags a new outgoing request.
    pub fn issue(&mut self, feed: FeedKind) -> Epoch {
        let slot = self.slot(feed);
        slot.issued = Epoch(slot.issued.0 + 1);
        slot.issued
    }

    /// Records `epoch` as applied if it is newer than anything applied so far.
    pub fn accept(&mut self, feed: FeedKind, epoch: Epoch) -> bool {
        let slot = self.slot(feed);
        if epoch <= slot.applied {
            return false;
        }
        slot.applied = epoch;
        true
    }

    pub fn last_applied(&self, feed: FeedKind) -> Epoch {
        self.get(feed).applied
    }
}

#[cfg(test)]
mod tests {
    use super::{Epoch, RequestEpochs};
    use formats::feed::FeedKind;

    #[test]
    fn issues_monotonically_per_feed() {
        let mut e = RequestEpochs::new();
        assert_eq!(e.issue(FeedKind::Stations), Epoch(1));
        assert_eq!(e.issue(FeedKind::Stations), Epoch(2));
        assert_eq!(e.issue(FeedKind::Firms), Epoch(1));
    }

    #[test]
    fn rejects_older_or_repeated_completions() {
        let mut e = RequestEpochs::new();
        let first = e.issue(FeedKind::Stations);
        let second = e.issue(FeedKind::Stations);
        assert!(e.accept(FeedKind::Stations, second));
        assert!(!e.accept(FeedKind::Stations, first));
        assert!(!e.accept(FeedKind::Stations, second));
        assert_eq!(e.last_applied(FeedKind::Stations), second);
        assert!(e.accept(FeedKind::Firms, Epoch(1)));
    }
}
