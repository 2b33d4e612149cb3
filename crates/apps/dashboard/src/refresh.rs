use std::time::Duration;

use formats::feed::FeedKind;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::controller::Command;

/// Periodic refresh trigger for one feed. The first refresh fires
/// immediately. Dropping the refresher stops it.
pub struct Refresher {
    feed: FeedKind,
    task: JoinHandle<()>,
}

impl Refresher {
    pub fn spawn(feed: FeedKind, period: Duration, commands: mpsc::Sender<Command>) -> Self {
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if commands.send(Command::Refresh(feed)).await.is_err() {
                    debug!(%feed, "controller gone; refresher exiting");
                    break;
                }
            }
        });
        Self { feed, task }
    }

    pub fn feed(&self) -> FeedKind {
        self.feed
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.task.abort();
    }
}
