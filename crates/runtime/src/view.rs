//! Dashboard view state and its transition function.
//!
//! `ViewState` is a plain value; [`ViewState::apply`] consumes it together
//! with one [`Transition`] and returns the next state plus a [`RenderPlan`]
//! naming exactly which outputs must be redrawn. Nothing here touches a map.

use chrono::FixedOffset;
use foundation::time::format_last_update;
use formats::feed::{FeedKind, FeedPayload};
use formats::firms::FirmsProperties;
use formats::station::{StationProperties, Variable};
use formats::{FirmsCollection, StationCollection};
use layers::{InstitutionFilter, Toggle, ToggleState, filter_by_institution, institution_options};

use crate::epoch::{Epoch, RequestEpochs};

#[derive(Debug, Clone)]
pub struct ViewState {
    pub variable: Variable,
    pub toggles: ToggleState,
    pub institution: InstitutionFilter,
    /// Latest applied station dataset, unfiltered.
    pub stations: StationCollection,
    /// `stations` narrowed by `institution`.
    pub filtered: StationCollection,
    pub fires: FirmsCollection,
    pub institution_options: Vec<String>,
    /// Formatted "last updated" text; `None` until a feed supplies one.
    pub last_update: Option<String>,
    pub display_offset: FixedOffset,
    pub epochs: RequestEpochs,
}

#[derive(Debug, Clone)]
pub enum Transition {
    SetVariable(Variable),
    ToggleChanged { toggle: Toggle, checked: bool },
    SetInstitution(InstitutionFilter),
    StationsLoaded {
        epoch: Epoch,
        payload: FeedPayload<StationProperties>,
    },
    FiresLoaded {
        epoch: Epoch,
        payload: FeedPayload<FirmsProperties>,
    },
    FetchFailed {
        feed: FeedKind,
        epoch: Epoch,
        error: String,
    },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::SetVariable(_) => "set_variable",
            Transition::ToggleChanged { .. } => "toggle_changed",
            Transition::SetInstitution(_) => "set_institution",
            Transition::StationsLoaded { .. } => "stations_loaded",
            Transition::FiresLoaded { .. } => "fires_loaded",
            Transition::FetchFailed { .. } => "fetch_failed",
        }
    }
}

/// Bounded re-render requested by a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderPlan {
    /// Station markers, both footprints and the legend.
    pub rebuild_stations: bool,
    /// Fire hotspot contents (implies a visibility refresh).
    pub rebuild_fires: bool,
    pub fire_visibility: bool,
    pub last_updated: bool,
    pub institution_options: bool,
    /// Active variable styling and control visibility.
    pub controls: bool,
    /// A completed fetch lost the epoch race and was dropped.
    pub stale: bool,
    /// A payload carried a timestamp that could not be parsed.
    pub unparsed_timestamp: bool,
    /// The selected institution vanished from the dataset and was reset.
    pub institution_reset: bool,
}

impl RenderPlan {
    /// Everything, for the first paint.
    pub fn full() -> Self {
        Self {
            rebuild_stations: true,
            rebuild_fires: true,
            fire_visibility: true,
            last_updated: true,
            institution_options: true,
            controls: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.rebuild_stations
            || self.rebuild_fires
            || self.fire_visibility
            || self.last_updated
            || self.institution_options
            || self.controls)
    }
}

impl ViewState {
    pub fn new(variable: Variable, toggles: ToggleState, display_offset: FixedOffset) -> Self {
        Self {
            variable,
            toggles,
            institution: InstitutionFilter::All,
            stations: StationCollection::default(),
            filtered: StationCollection::default(),
            fires: FirmsCollection::default(),
            institution_options: Vec::new(),
            last_update: None,
            display_offset,
            epochs: RequestEpochs::new(),
        }
    }

    /// Controls currently shown: present and relevant to the variable.
    pub fn control_visible(&self, toggle: Toggle) -> bool {
        self.toggles.control(toggle).is_some() && toggle.is_relevant(self.variable)
    }

    fn refilter(&mut self) {
        self.filtered = filter_by_institution(&self.stations, Some(&self.institution));
    }

    /// Returns whether the label changed; `None` when a timestamp was present
    /// but unparseable.
    fn update_last_update<P>(&mut self, payload: &FeedPayload<P>) -> Option<bool> {
        match (payload.last_update, &payload.last_update_raw) {
            (Some(ts), _) => {
                self.last_update = Some(format_last_update(ts, self.display_offset));
                Some(true)
            }
            (None, Some(_)) => None,
            (None, None) => Some(false),
        }
    }

    pub fn apply(mut self, transition: Transition) -> (ViewState, RenderPlan) {
        let mut plan = RenderPlan::default();
        match transition {
            Transition::SetVariable(variable) => {
                self.variable = variable;
                self.refilter();
                plan.rebuild_stations = true;
                plan.controls = true;
            }
            Transition::ToggleChanged { toggle, checked } => {
                self.toggles.set(toggle, checked);
                match toggle {
                    Toggle::Rainfall | Toggle::Humidity => plan.rebuild_stations = true,
                    Toggle::Fires => plan.fire_visibility = true,
                }
            }
            Transition::SetInstitution(filter) => {
                self.institution = filter;
                self.refilter();
                plan.rebuild_stations = true;
                plan.institution_options = true;
            }
            Transition::StationsLoaded { epoch, payload } => {
                if !self.epochs.accept(FeedKind::Stations, epoch) {
                    plan.stale = true;
                    return (self, plan);
                }
                self.stations = payload.collection.clone();
                self.institution_options = institution_options(&self.stations);
                if let Some(code) = self.institution.code() {
                    if !self.institution_options.iter().any(|o| o == code) {
                        self.institution = InstitutionFilter::All;
                        plan.institution_reset = true;
                    }
                }
                self.refilter();
                match self.update_last_update(&payload) {
                    Some(changed) => plan.last_updated = changed,
                    None => plan.unparsed_timestamp = true,
                }
                plan.rebuild_stations = true;
                plan.institution_options = true;
            }
            Transition::FiresLoaded { epoch, payload } => {
                if !self.epochs.accept(FeedKind::Firms, epoch) {
                    plan.stale = true;
                    return (self, plan);
                }
                self.fires = payload.collection.clone();
                match self.update_last_update(&payload) {
                    Some(changed) => plan.last_updated = changed,
                    None => plan.unparsed_timestamp = true,
                }
                plan.rebuild_fires = true;
                plan.fire_visibility = true;
            }
            Transition::FetchFailed { .. } => {}
        }
        (self, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono::Offset;
    use foundation::geo::LatLon;
    use formats::feed::{Feature, FeatureCollection};
    use pretty_assertions::assert_eq;

    fn offset() -> FixedOffset {
        Utc.fix()
    }

    fn station_payload(codes: &[&str], last_update: Option<&str>) -> FeedPayload<StationProperties> {
        let features: Vec<Feature<StationProperties>> = codes
            .iter()
            .map(|code| {
                Feature::new(
                    LatLon::new(-33.0, -70.0),
                    StationProperties {
                        institution: Some(code.to_string()),
                        ..Default::default()
                    },
                )
            })
            .collect();
        FeedPayload {
            collection: FeatureCollection::new(features),
            last_update: last_update.and_then(foundation::time::parse_timestamp),
            last_update_raw: last_update.map(str::to_string),
            dropped: 0,
        }
    }

    #[test]
    fn set_variable_rebuilds_stations_and_controls_only() {
        let state = ViewState::new(Variable::Temperature, ToggleState::default(), offset());
        let (state, plan) = state.apply(Transition::SetVariable(Variable::WindSpeed));
        assert_eq!(state.variable, Variable::WindSpeed);
        assert!(plan.rebuild_stations && plan.controls);
        assert!(!plan.rebuild_fires && !plan.fire_visibility);
    }

    #[test]
    fn toggles_never_change_variable() {
        let mut state = ViewState::new(Variable::Precipitation24h, ToggleState::default(), offset());
        for toggle in Toggle::ALL {
            let (next, plan) = state.apply(Transition::ToggleChanged { toggle, checked: true });
            assert_eq!(next.variable, Variable::Precipitation24h);
            assert_eq!(plan.fire_visibility, toggle == Toggle::Fires);
            assert_eq!(plan.rebuild_stations, toggle != Toggle::Fires);
            state = next;
        }
    }

    #[test]
    fn station_load_repopulates_options_and_resets_missing_selection() {
        let state = ViewState::new(Variable::Temperature, ToggleState::default(), offset());
        let (state, _) = state.apply(Transition::StationsLoaded {
            epoch: Epoch(1),
            payload: station_payload(&["INIA", "DMC"], Some("2025-01-10T15:04:05Z")),
        });
        assert_eq!(state.institution_options, vec!["DMC", "INIA"]);
        assert_eq!(state.last_update.as_deref(), Some("10-01-2025, 15:04:05"));

        let (state, _) = state.apply(Transition::SetInstitution(InstitutionFilter::parse("INIA")));
        assert_eq!(state.filtered.len(), 1);

        let (state, plan) = state.apply(Transition::StationsLoaded {
            epoch: Epoch(2),
            payload: station_payload(&["DMC", "DMC"], Some("garbage")),
        });
        assert!(plan.institution_reset);
        assert!(plan.unparsed_timestamp);
        assert!(!plan.last_updated);
        assert_eq!(state.institution, InstitutionFilter::All);
        assert_eq!(state.filtered.len(), 2);
        assert_eq!(state.last_update.as_deref(), Some("10-01-2025, 15:04:05"));
    }

    #[test]
    fn stale_completion_leaves_state_untouched() {
        let mut state = ViewState::new(Variable::Temperature, ToggleState::default(), offset());
        let older = state.epochs.issue(FeedKind::Stations);
        let newer = state.epochs.issue(FeedKind::Stations);

        let (state, plan) = state.apply(Transition::StationsLoaded {
            epoch: newer,
            payload: station_payload(&["NEW"], None),
        });
        assert!(!plan.stale);
        let (state, plan) = state.apply(Transition::StationsLoaded {
            epoch: older,
            payload: station_payload(&["OLD", "OLD"], None),
        });
        assert!(plan.stale);
        assert!(plan.is_empty());
        assert_eq!(state.institution_options, vec!["NEW"]);
    }

    #[test]
    fn control_visibility_needs_presence_and_relevance() {
        let toggles = ToggleState {
            rainfall: Some(false),
            humidity: None,
            fires: Some(true),
        };
        let state = ViewState::new(Variable::RelativeHumidity, toggles, offset());
        assert!(!state.control_visible(Toggle::Rainfall));
        assert!(!state.control_visible(Toggle::Humidity));
        assert!(state.control_visible(Toggle::Fires));
    }
}
