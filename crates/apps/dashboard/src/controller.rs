//! Single task owning the dashboard.
//!
//! HTTP handlers and refresh timers talk to it through a command channel;
//! fetches run as separate tasks and report back on a completion channel,
//! tagged with the epoch issued when they started. Every processed command
//! publishes a fresh [`Snapshot`] on a watch channel.

use std::fmt;
use std::sync::Arc;

use formats::feed::{parse_payload, FeedKind};
use formats::station::Variable;
use layers::{InstitutionFilter, LayerSet, ToggleState};
use runtime::{Dashboard, Epoch, Event, RefreshStats, Severity, Transition};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::scene::SceneDocument;
use crate::source::{FeedSource, SourceError};

const COMMAND_BUFFER: usize = 64;

/// Published view of the dashboard after a command has been processed.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub scene: SceneDocument,
    pub variable: Variable,
    pub toggles: ToggleState,
    pub institution: InstitutionFilter,
    pub stats: RefreshStats,
    #[serde(skip)]
    pub layers: LayerSet,
}

pub enum Command {
    /// A user interaction; the reply carries the snapshot that includes it.
    Apply {
        transition: Transition,
        reply: oneshot::Sender<Arc<Snapshot>>,
    },
    Refresh(FeedKind),
}

struct Completion {
    feed: FeedKind,
    epoch: Epoch,
    result: Result<Vec<u8>, SourceError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerClosed;

impl fmt::Display for ControllerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dashboard controller has stopped")
    }
}

impl std::error::Error for ControllerClosed {}

#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
}

impl ControllerHandle {
    pub async fn apply(&self, transition: Transition) -> Result<Arc<Snapshot>, ControllerClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Apply { transition, reply })
            .await
            .map_err(|_| ControllerClosed)?;
        rx.await.map_err(|_| ControllerClosed)
    }

    pub async fn refresh(&self, feed: FeedKind) -> Result<(), ControllerClosed> {
        self.commands
            .send(Command::Refresh(feed))
            .await
            .map_err(|_| ControllerClosed)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.commands.clone()
    }
}

pub struct Controller {
    dashboard: Dashboard,
    scene: SceneDocument,
    source: Arc<dyn FeedSource>,
    completions: mpsc::UnboundedSender<Completion>,
    snapshots: watch::Sender<Arc<Snapshot>>,
}

impl Controller {
    /// Paints the initial scene and starts the controller loop.
    pub fn spawn(
        mut dashboard: Dashboard,
        source: Arc<dyn FeedSource>,
    ) -> (ControllerHandle, JoinHandle<()>) {
        let mut scene = SceneDocument::new(dashboard.view().variable);
        dashboard.render_all(&mut scene);
        scene.record_toggles(&dashboard.view().toggles);
        let initial = Arc::new(snapshot_of(&dashboard, &scene));

        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(initial);

        let mut controller = Controller {
            dashboard,
            scene,
            source,
            completions: completions_tx,
            snapshots: snapshots_tx,
        };
        controller.forward_events();

        let task = tokio::spawn(controller.run(commands_rx, completions_rx));
        let handle = ControllerHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(done) = completions.recv() => self.handle_completion(done),
            }
        }
        debug!("controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Apply { transition, reply } => {
                self.dashboard.apply(transition, &mut self.scene);
                let snapshot = self.publish();
                let _ = reply.send(snapshot);
            }
            Command::Refresh(feed) => {
                let epoch = self.dashboard.begin_fetch(feed);
                let source = Arc::clone(&self.source);
                let completions = self.completions.clone();
                tokio::spawn(async move {
                    let result = source.fetch(feed).await;
                    let _ = completions.send(Completion {
                        feed,
                        epoch,
                        result,
                    });
                });
                self.publish();
            }
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        let Completion {
            feed,
            epoch,
            result,
        } = done;
        let transition = match result {
            Ok(body) => decode(feed, epoch, &body),
            Err(err) => Transition::FetchFailed {
                feed,
                epoch,
                error: err.to_string(),
            },
        };
        self.dashboard.apply(transition, &mut self.scene);
        self.publish();
    }

    fn publish(&mut self) -> Arc<Snapshot> {
        self.forward_events();
        self.scene.record_toggles(&self.dashboard.view().toggles);
        let snapshot = Arc::new(snapshot_of(&self.dashboard, &self.scene));
        self.snapshots.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    fn forward_events(&mut self) {
        for event in self.dashboard.drain_events() {
            log_event(&event);
        }
    }
}

fn decode(feed: FeedKind, epoch: Epoch, body: &[u8]) -> Transition {
    let decoded = match feed {
        FeedKind::Stations => {
            parse_payload(body).map(|payload| Transition::StationsLoaded { epoch, payload })
        }
        FeedKind::Firms => {
            parse_payload(body).map(|payload| Transition::FiresLoaded { epoch, payload })
        }
    };
    decoded.unwrap_or_else(|err| Transition::FetchFailed {
        feed,
        epoch,
        error: err.to_string(),
    })
}

fn snapshot_of(dashboard: &Dashboard, scene: &SceneDocument) -> Snapshot {
    let view = dashboard.view();
    Snapshot {
        scene: scene.clone(),
        variable: view.variable,
        toggles: view.toggles,
        institution: view.institution.clone(),
        stats: dashboard.stats().clone(),
        layers: dashboard.layers().clone(),
    }
}

fn log_event(event: &Event) {
    match event.severity {
        Severity::Debug => debug!(seq = event.seq, kind = event.kind, "{}", event.message),
        Severity::Info => info!(seq = event.seq, kind = event.kind, "{}", event.message),
        Severity::Warn => warn!(seq = event.seq, kind = event.kind, "{}", event.message),
    }
}
