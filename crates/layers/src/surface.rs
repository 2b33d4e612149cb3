use foundation::geo::LatLon;
use formats::station::Variable;
use serde::Serialize;

use crate::composer::LayerSet;
use crate::glyphs::{FireMarker, FootprintCircle, StationGlyph};
use crate::layer::OverlayKind;
use crate::query::InstitutionFilter;
use crate::symbology::Legend;
use crate::toggles::Toggle;

/// Styled geometry handed to a map widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Station { location: LatLon, glyph: StationGlyph },
    Footprint { location: LatLon, circle: FootprintCircle },
    Fire { location: LatLon, marker: FireMarker },
}

/// What the dashboard needs from a map widget and its surrounding controls.
pub trait MapSurface {
    fn clear_layer(&mut self, layer: OverlayKind);
    fn add_geometry(&mut self, layer: OverlayKind, geometry: Geometry, popup: Option<String>);
    fn set_layer_visible(&mut self, layer: OverlayKind, visible: bool);
    fn set_legend(&mut self, legend: &Legend);
    fn set_last_updated(&mut self, text: &str);
    fn set_institution_options(&mut self, options: &[String], selected: &InstitutionFilter);
    fn set_active_variable(&mut self, variable: Variable);
    fn set_control_visible(&mut self, toggle: Toggle, visible: bool);
}

/// Clears `kind` on the surface and re-adds the layer's current contents.
pub fn present_layer(set: &LayerSet, kind: OverlayKind, surface: &mut impl MapSurface) {
    surface.clear_layer(kind);
    match kind {
        OverlayKind::Stations => {
            for m in set.stations.items() {
                let geometry = Geometry::Station {
                    location: m.location,
                    glyph: m.glyph.clone(),
                };
                surface.add_geometry(kind, geometry, Some(m.popup.clone()));
            }
        }
        OverlayKind::RainfallFootprint | OverlayKind::HumidityFootprint => {
            let layer = if kind == OverlayKind::RainfallFootprint {
                &set.rainfall
            } else {
                &set.humidity
            };
            for f in layer.items() {
                let geometry = Geometry::Footprint {
                    location: f.location,
                    circle: f.circle.clone(),
                };
                surface.add_geometry(kind, geometry, None);
            }
        }
        OverlayKind::FireHotspots => {
            for h in set.fires.items() {
                let geometry = Geometry::Fire {
                    location: h.location,
                    marker: h.marker.clone(),
                };
                surface.add_geometry(kind, geometry, Some(h.popup.clone()));
            }
        }
    }
    surface.set_layer_visible(kind, layer_visible(set, kind));
}

fn layer_visible(set: &LayerSet, kind: OverlayKind) -> bool {
    match kind {
        OverlayKind::Stations => set.stations.is_visible(),
        OverlayKind::RainfallFootprint => set.rainfall.is_visible(),
        OverlayKind::HumidityFootprint => set.humidity.is_visible(),
        OverlayKind::FireHotspots => set.fires.is_visible(),
    }
}

/// Full redraw: every overlay bottom to top, then the legend.
pub fn present_layers(set: &LayerSet, surface: &mut impl MapSurface) {
    for kind in OverlayKind::ALL {
        present_layer(set, kind, surface);
    }
    surface.set_legend(&set.legend);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toggles::ToggleState;
    use formats::feed::Feature;
    use formats::firms::FirmsProperties;
    use formats::station::StationProperties;
    use formats::{FirmsCollection, StationCollection};

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl MapSurface for Recorder {
        fn clear_layer(&mut self, layer: OverlayKind) {
            self.calls.push(format!("clear {}", layer.id()));
        }
        fn add_geometry(&mut self, layer: OverlayKind, _geometry: Geometry, popup: Option<String>) {
            self.calls
                .push(format!("add {} popup={}", layer.id(), popup.is_some()));
        }
        fn set_layer_visible(&mut self, layer: OverlayKind, visible: bool) {
            self.calls.push(format!("visible {} {visible}", layer.id()));
        }
        fn set_legend(&mut self, legend: &Legend) {
            self.calls.push(format!("legend {}", legend.title));
        }
        fn set_last_updated(&mut self, _text: &str) {}
        fn set_institution_options(&mut self, _options: &[String], _selected: &InstitutionFilter) {}
        fn set_active_variable(&mut self, _variable: Variable) {}
        fn set_control_visible(&mut self, _toggle: Toggle, _visible: bool) {}
    }

    #[test]
    fn presents_each_layer_after_clearing_it() {
        let stations: StationCollection = vec![Feature::new(
            LatLon::new(-33.0, -70.0),
            StationProperties::default(),
        )]
        .into();
        let fires: FirmsCollection = vec![Feature::new(
            LatLon::new(-37.0, -72.0),
            FirmsProperties::default(),
        )]
        .into();
        let toggles = ToggleState::with_controls(false, false, true);
        let mut set = LayerSet::new(Variable::Temperature);
        set.rebuild_stations(&stations, Variable::Temperature, &toggles);
        set.rebuild_fires(&fires, &toggles);

        let mut surface = Recorder::default();
        present_layers(&set, &mut surface);
        assert_eq!(
            surface.calls,
            vec![
                "clear fire_hotspots",
                "add fire_hotspots popup=true",
                "visible fire_hotspots true",
                "clear rainfall_footprint",
                "visible rainfall_footprint true",
                "clear humidity_footprint",
                "visible humidity_footprint true",
                "clear stations",
                "add stations popup=true",
                "visible stations true",
                "legend Temperature (°C)",
            ]
        );
    }
}
