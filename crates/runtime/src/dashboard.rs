use chrono::FixedOffset;
use formats::feed::FeedKind;
use formats::station::Variable;
use layers::{LayerSet, MapSurface, OverlayKind, Toggle, ToggleState, present_layer};

use crate::epoch::Epoch;
use crate::event_bus::{Event, EventBus};
use crate::stats::RefreshStats;
use crate::view::{RenderPlan, Transition, ViewState};

/// Single owner of view state, overlays and refresh bookkeeping.
///
/// Every mutation goes through [`Dashboard::apply`], which runs the pure
/// transition and then carries out its render plan against a surface.
#[derive(Debug)]
pub struct Dashboard {
    view: ViewState,
    layers: LayerSet,
    stats: RefreshStats,
    bus: EventBus,
}

impl Dashboard {
    pub fn new(variable: Variable, toggles: ToggleState, display_offset: FixedOffset) -> Self {
        Self {
            view: ViewState::new(variable, toggles, display_offset),
            layers: LayerSet::new(variable),
            stats: RefreshStats::new(),
            bus: EventBus::new(),
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn stats(&self) -> &RefreshStats {
        &self.stats
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.bus.drain()
    }

    /// Tags an outgoing fetch.
    pub fn begin_fetch(&mut self, feed: FeedKind) -> Epoch {
        let epoch = self.view.epochs.issue(feed);
        self.stats.record_issued(feed);
        self.bus.debug("fetch.issued", format!("{feed} {epoch}"));
        epoch
    }

    /// Paints everything from the current state.
    pub fn render_all(&mut self, surface: &mut impl MapSurface) {
        self.execute(RenderPlan::full(), surface);
    }

    pub fn apply(&mut self, transition: Transition, surface: &mut impl MapSurface) -> RenderPlan {
        let name = transition.name();
        let outcome = match &transition {
            Transition::StationsLoaded { epoch, payload } => {
                Some((FeedKind::Stations, *epoch, payload.dropped))
            }
            Transition::FiresLoaded { epoch, payload } => {
                Some((FeedKind::Firms, *epoch, payload.dropped))
            }
            Transition::FetchFailed { feed, epoch, error } => {
                self.stats.record_failed(*feed, error.clone());
                self.bus
                    .warn("fetch.failed", format!("{feed} {epoch}: {error}"));
                None
            }
            _ => None,
        };

        let (next, plan) = self.view.clone().apply(transition);
        self.view = next;

        if let Some((feed, epoch, dropped)) = outcome {
            if plan.stale {
                self.stats.record_stale(feed);
                self.bus.debug(
                    "fetch.stale",
                    format!(
                        "{feed} {epoch} discarded; {} already applied",
                        self.view.epochs.last_applied(feed)
                    ),
                );
            } else {
                self.stats.record_applied(feed, epoch, dropped);
                if dropped > 0 {
                    self.bus
                        .info("feed.dropped", format!("{feed}: skipped {dropped} features"));
                }
                self.bus.info(
                    "fetch.applied",
                    format!("{feed} {epoch}: {} features", self.feature_count(feed)),
                );
            }
        }
        if plan.unparsed_timestamp {
            self.bus.warn(
                "last_update.unparsed",
                "feed timestamp not understood; label left unchanged",
            );
        }
        if plan.institution_reset {
            self.bus
                .info("institution.reset", "selected institution no longer present");
        }

        self.execute(plan, surface);
        self.bus.debug("transition", format!("{name} -> {plan:?}"));
        plan
    }

    fn feature_count(&self, feed: FeedKind) -> usize {
        match feed {
            FeedKind::Stations => self.view.stations.len(),
            FeedKind::Firms => self.view.fires.len(),
        }
    }

    fn execute(&mut self, plan: RenderPlan, surface: &mut impl MapSurface) {
        let view = &self.view;
        if plan.rebuild_stations {
            self.layers
                .rebuild_stations(&view.filtered, view.variable, &view.toggles);
            for kind in [
                OverlayKind::RainfallFootprint,
                OverlayKind::HumidityFootprint,
                OverlayKind::Stations,
            ] {
                present_layer(&self.layers, kind, surface);
            }
            surface.set_legend(&self.layers.legend);
        }
        if plan.rebuild_fires {
            self.layers.rebuild_fires(&view.fires, &view.toggles);
            present_layer(&self.layers, OverlayKind::FireHotspots, surface);
        }
        if plan.fire_visibility {
            self.layers.set_fire_visibility(&view.toggles);
            surface.set_layer_visible(OverlayKind::FireHotspots, self.layers.fires.is_visible());
        }
        if plan.last_updated {
            if let Some(text) = &view.last_update {
                surface.set_last_updated(text);
            }
        }
        if plan.institution_options {
            surface.set_institution_options(&view.institution_options, &view.institution);
        }
        if plan.controls {
            surface.set_active_variable(view.variable);
            for toggle in Toggle::ALL {
                surface.set_control_visible(toggle, view.control_visible(toggle));
            }
        }
    }
}
