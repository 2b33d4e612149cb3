use std::collections::BTreeMap;

use formats::station::Variable;
use layers::symbology::Legend;
use layers::{Geometry, InstitutionFilter, MapSurface, OverlayKind, Toggle, ToggleState};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Serialize)]
pub struct SceneFeature {
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneLayer {
    pub id: &'static str,
    pub title: &'static str,
    pub visible: bool,
    pub features: Vec<SceneFeature>,
}

impl SceneLayer {
    fn new(kind: OverlayKind) -> Self {
        Self {
            id: kind.id(),
            title: kind.title(),
            visible: true,
            features: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstitutionControl {
    pub options: Vec<String>,
    pub selected: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ControlState {
    pub visible: bool,
    /// `None` when the control does not exist.
    pub checked: Option<bool>,
}

/// Browser-facing rendition of everything a map widget would show.
#[derive(Debug, Clone, Serialize)]
pub struct SceneDocument {
    /// Serialized as a list, bottom to top.
    #[serde(serialize_with = "layers_in_draw_order")]
    pub layers: BTreeMap<OverlayKind, SceneLayer>,
    pub legend: Option<Legend>,
    pub legend_html: String,
    pub last_updated: Option<String>,
    pub institutions: InstitutionControl,
    pub active_variable: Variable,
    pub controls: BTreeMap<Toggle, ControlState>,
}

fn layers_in_draw_order<S: Serializer>(
    layers: &BTreeMap<OverlayKind, SceneLayer>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(layers.values())
}

impl SceneDocument {
    pub fn new(variable: Variable) -> Self {
        Self {
            layers: OverlayKind::ALL
                .into_iter()
                .map(|kind| (kind, SceneLayer::new(kind)))
                .collect(),
            legend: None,
            legend_html: String::new(),
            last_updated: None,
            institutions: InstitutionControl {
                options: Vec::new(),
                selected: InstitutionFilter::All.to_string(),
            },
            active_variable: variable,
            controls: Toggle::ALL
                .into_iter()
                .map(|t| (t, ControlState::default()))
                .collect(),
        }
    }

    fn layer_mut(&mut self, kind: OverlayKind) -> &mut SceneLayer {
        self.layers
            .entry(kind)
            .or_insert_with(|| SceneLayer::new(kind))
    }

    /// Mirrors checkbox states, which the surface contract does not carry.
    pub fn record_toggles(&mut self, toggles: &ToggleState) {
        for toggle in Toggle::ALL {
            self.controls.entry(toggle).or_default().checked = toggles.control(toggle);
        }
    }

    pub fn feature_count(&self, kind: OverlayKind) -> usize {
        self.layers.get(&kind).map_or(0, |l| l.features.len())
    }
}

impl MapSurface for SceneDocument {
    fn clear_layer(&mut self, layer: OverlayKind) {
        self.layer_mut(layer).features.clear();
    }

    fn add_geometry(&mut self, layer: OverlayKind, geometry: Geometry, popup: Option<String>) {
        self.layer_mut(layer)
            .features
            .push(SceneFeature { geometry, popup });
    }

    fn set_layer_visible(&mut self, layer: OverlayKind, visible: bool) {
        self.layer_mut(layer).visible = visible;
    }

    fn set_legend(&mut self, legend: &Legend) {
        self.legend_html = legend.to_html();
        self.legend = Some(legend.clone());
    }

    fn set_last_updated(&mut self, text: &str) {
        self.last_updated = Some(format!("Last updated: {text}"));
    }

    fn set_institution_options(&mut self, options: &[String], selected: &InstitutionFilter) {
        self.institutions = InstitutionControl {
            options: options.to_vec(),
            selected: selected.to_string(),
        };
    }

    fn set_active_variable(&mut self, variable: Variable) {
        self.active_variable = variable;
    }

    fn set_control_visible(&mut self, toggle: Toggle, visible: bool) {
        self.controls.entry(toggle).or_default().visible = visible;
    }
}
