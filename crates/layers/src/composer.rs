use foundation::geo::LatLon;
use formats::measurement::Measurement;
use formats::station::{StationProperties, Variable};
use formats::{FirmsCollection, StationCollection};
use serde::Serialize;

use crate::cluster::{ClusterConfig, ClusterItem, cluster_points};
use crate::glyphs::{
    ClusterGlyph, FireMarker, FootprintCircle, StationGlyph, cluster_glyph, fire_marker,
    fire_popup, humidity_footprint, rainfall_footprint, station_glyph, station_popup,
};
use crate::layer::{OverlayKind, OverlayLayer};
use crate::symbology::{Legend, legend};
use crate::toggles::{Toggle, ToggleState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationMarker {
    pub location: LatLon,
    pub glyph: StationGlyph,
    pub popup: String,
    /// The current variable's raw reading, kept for cluster aggregation.
    pub reading: Measurement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footprint {
    pub location: LatLon,
    pub circle: FootprintCircle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireHotspot {
    pub location: LatLon,
    pub marker: FireMarker,
    pub popup: String,
}

/// A station marker or an aggregate standing in for several.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StationItem {
    Marker(StationMarker),
    Cluster {
        location: LatLon,
        glyph: ClusterGlyph,
        /// Indices into the station layer.
        members: Vec<usize>,
    },
}

/// Everything derived from the filtered stations for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct StationOverlays {
    pub markers: Vec<StationMarker>,
    pub rainfall: Vec<Footprint>,
    pub humidity: Vec<Footprint>,
    pub legend: Legend,
}

/// Builds the station-dependent overlays; footprints only when their variable
/// is current and their toggle is on.
pub fn compose_station_overlays(
    stations: &StationCollection,
    variable: Variable,
    toggles: &ToggleState,
) -> StationOverlays {
    let markers = stations
        .iter()
        .map(|f| StationMarker {
            location: f.location,
            glyph: station_glyph(&f.properties, variable),
            popup: station_popup(&f.properties, variable),
            reading: f.properties.reading(variable).clone(),
        })
        .collect();

    StationOverlays {
        markers,
        rainfall: footprints(stations, variable, toggles, Toggle::Rainfall, rainfall_footprint),
        humidity: footprints(stations, variable, toggles, Toggle::Humidity, humidity_footprint),
        legend: legend(variable),
    }
}

fn footprints(
    stations: &StationCollection,
    variable: Variable,
    toggles: &ToggleState,
    toggle: Toggle,
    build: impl Fn(&StationProperties) -> Option<FootprintCircle>,
) -> Vec<Footprint> {
    if !toggles.overlay_enabled(toggle, variable) {
        return Vec::new();
    }
    stations
        .iter()
        .filter_map(|f| {
            build(&f.properties).map(|circle| Footprint {
                location: f.location,
                circle,
            })
        })
        .collect()
}

pub fn compose_fire_hotspots(fires: &FirmsCollection) -> Vec<FireHotspot> {
    fires
        .iter()
        .map(|f| FireHotspot {
            location: f.location,
            marker: fire_marker(&f.properties),
            popup: fire_popup(&f.properties),
        })
        .collect()
}

/// The four overlays plus the legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet {
    pub stations: OverlayLayer<StationMarker>,
    pub rainfall: OverlayLayer<Footprint>,
    pub humidity: OverlayLayer<Footprint>,
    pub fires: OverlayLayer<FireHotspot>,
    pub variable: Variable,
    pub legend: Legend,
}

impl LayerSet {
    pub fn new(variable: Variable) -> Self {
        Self {
            stations: OverlayLayer::new(OverlayKind::Stations),
            rainfall: OverlayLayer::new(OverlayKind::RainfallFootprint),
            humidity: OverlayLayer::new(OverlayKind::HumidityFootprint),
            fires: OverlayLayer::new(OverlayKind::FireHotspots),
            variable,
            legend: legend(variable),
        }
    }

    /// Replaces every station-dependent overlay and re-derives the legend.
    pub fn rebuild_stations(
        &mut self,
        stations: &StationCollection,
        variable: Variable,
        toggles: &ToggleState,
    ) {
        let overlays = compose_station_overlays(stations, variable, toggles);
        self.stations.replace(overlays.markers);
        self.rainfall.replace(overlays.rainfall);
        self.humidity.replace(overlays.humidity);
        self.variable = variable;
        self.legend = overlays.legend;
    }

    pub fn rebuild_fires(&mut self, fires: &FirmsCollection, toggles: &ToggleState) {
        self.fires.replace(compose_fire_hotspots(fires));
        self.set_fire_visibility(toggles);
    }

    /// Visibility only; contents are untouched.
    pub fn set_fire_visibility(&mut self, toggles: &ToggleState) {
        self.fires.set_visible(toggles.is_on(Toggle::Fires));
    }

    /// Station layer as drawn at `zoom`.
    pub fn clustered_stations(&self, zoom: f64, config: &ClusterConfig) -> Vec<StationItem> {
        let markers = self.stations.items();
        let points: Vec<LatLon> = markers.iter().map(|m| m.location).collect();
        cluster_points(&points, zoom, config)
            .into_iter()
            .map(|item| match item {
                ClusterItem::Marker { index } => StationItem::Marker(markers[index].clone()),
                ClusterItem::Cluster { center, members } => StationItem::Cluster {
                    location: center,
                    glyph: cluster_glyph(members.iter().map(|&i| &markers[i].reading), self.variable),
                    members,
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formats::feed::Feature;
    use formats::firms::FirmsProperties;
    use pretty_assertions::assert_eq;

    fn stations() -> StationCollection {
        let rows = [
            serde_json::json!({ "temperatura": 22, "aguaCaida24Horas": 5, "humedadRelativa": 70 }),
            serde_json::json!({ "temperatura": "s/i", "aguaCaida24Horas": "s/i", "humedadRelativa": 40 }),
            serde_json::json!({ "temperatura": 10, "aguaCaida24Horas": 60 }),
        ];
        rows.into_iter()
            .enumerate()
            .map(|(i, json)| {
                let props: StationProperties = serde_json::from_value(json).expect("props");
                Feature::new(LatLon::new(-33.0 - i as f64 * 0.001, -70.6), props)
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn markers_map_one_to_one() {
        let data = stations();
        let out = compose_station_overlays(&data, Variable::Temperature, &ToggleState::default());
        assert_eq!(out.markers.len(), data.len());
        let labels: Vec<&str> = out.markers.iter().map(|m| m.glyph.label.as_str()).collect();
        assert_eq!(labels, vec!["22", "s/i", "10"]);
        assert!(out.rainfall.is_empty());
        assert!(out.humidity.is_empty());
        assert_eq!(out.legend, legend(Variable::Temperature));
    }

    #[test]
    fn footprints_follow_variable_and_toggle() {
        let data = stations();
        let all_on = ToggleState::with_controls(true, true, true);

        let out = compose_station_overlays(&data, Variable::Precipitation24h, &all_on);
        let radii: Vec<f64> = out.rainfall.iter().map(|f| f.circle.radius_m).collect();
        assert_eq!(radii, vec![4500.0, 22000.0]);
        assert!(out.humidity.is_empty());

        let out = compose_station_overlays(&data, Variable::RelativeHumidity, &all_on);
        assert!(out.rainfall.is_empty());
        assert_eq!(out.humidity.len(), 2);

        let off = ToggleState::with_controls(false, false, true);
        let out = compose_station_overlays(&data, Variable::Precipitation24h, &off);
        assert!(out.rainfall.is_empty());
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let data = stations();
        let mut set = LayerSet::new(Variable::Temperature);
        let on = ToggleState::with_controls(true, false, false);
        set.rebuild_stations(&data, Variable::Precipitation24h, &on);
        assert_eq!(set.rainfall.len(), 2);

        set.rebuild_stations(&data, Variable::Temperature, &on);
        assert!(set.rainfall.is_empty());
        assert_eq!(set.stations.len(), 3);
        assert_eq!(set.legend.title, "Temperature (°C)");
    }

    #[test]
    fn fire_toggle_only_changes_visibility() {
        let fires: FirmsCollection = vec![Feature::new(
            LatLon::new(-37.0, -72.0),
            FirmsProperties::default(),
        )]
        .into();
        let mut set = LayerSet::new(Variable::Temperature);
        set.rebuild_fires(&fires, &ToggleState::default());
        assert_eq!(set.fires.len(), 1);
        assert!(!set.fires.is_visible());

        let revision = set.fires.revision();
        set.set_fire_visibility(&ToggleState::with_controls(false, false, true));
        assert!(set.fires.is_visible());
        assert_eq!(set.fires.revision(), revision);
    }

    #[test]
    fn clusters_aggregate_current_variable() {
        let data = stations();
        let mut set = LayerSet::new(Variable::Temperature);
        set.rebuild_stations(&data, Variable::Temperature, &ToggleState::default());

        let items = set.clustered_stations(5.0, &ClusterConfig::default());
        assert_eq!(items.len(), 1);
        let StationItem::Cluster { glyph, members, .. } = &items[0] else {
            panic!("expected a cluster");
        };
        assert_eq!(members, &vec![0, 1, 2]);
        assert_eq!(glyph.count, 3);
        assert_eq!(glyph.mean, 16.0);

        let items = set.clustered_stations(12.0, &ClusterConfig::default());
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| matches!(i, StationItem::Marker(_))));
    }
}
