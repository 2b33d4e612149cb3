use serde::Serialize;

/// The four overlay collections drawn over the base map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayKind {
    FireHotspots,
    RainfallFootprint,
    HumidityFootprint,
    Stations,
}

impl OverlayKind {
    /// Bottom to top.
    pub const ALL: [OverlayKind; 4] = [
        OverlayKind::FireHotspots,
        OverlayKind::RainfallFootprint,
        OverlayKind::HumidityFootprint,
        OverlayKind::Stations,
    ];

    pub fn id(self) -> &'static str {
        match self {
            OverlayKind::FireHotspots => "fire_hotspots",
            OverlayKind::RainfallFootprint => "rainfall_footprint",
            OverlayKind::HumidityFootprint => "humidity_footprint",
            OverlayKind::Stations => "stations",
        }
    }

    /// Name shown in the layer selector.
    pub fn title(self) -> &'static str {
        match self {
            OverlayKind::FireHotspots => "Fire Hotspots (FIRMS)",
            OverlayKind::RainfallFootprint => "Rainfall 24h footprint",
            OverlayKind::HumidityFootprint => "Humidity pseudo-heatmap",
            OverlayKind::Stations => "Stations",
        }
    }
}

/// A named overlay whose contents are only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLayer<T> {
    kind: OverlayKind,
    items: Vec<T>,
    visible: bool,
    /// Bumped on every clear/replace so consumers can detect rebuilds.
    revision: u64,
}

impl<T> OverlayLayer<T> {
    pub fn new(kind: OverlayKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            visible: true,
            revision: 0,
        }
    }

    pub fn kind(&self) -> OverlayKind {
        self.kind
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.revision = self.revision.wrapping_add(1);
    }

    /// Clears, then populates.
    pub fn replace(&mut self, items: Vec<T>) {
        self.clear();
        self.items = items;
    }
}

#[cfg(test)]
mod tests {
    use super::{OverlayKind, OverlayLayer};

    #[test]
    fn replace_discards_previous_contents() {
        let mut layer = OverlayLayer::new(OverlayKind::RainfallFootprint);
        layer.replace(vec![1, 2, 3]);
        layer.replace(vec![4]);
        assert_eq!(layer.items(), &[4]);
        assert_eq!(layer.revision(), 2);
    }

    #[test]
    fn clear_keeps_visibility() {
        let mut layer: OverlayLayer<u8> = OverlayLayer::new(OverlayKind::FireHotspots);
        layer.set_visible(false);
        layer.clear();
        assert!(layer.is_empty());
        assert!(!layer.is_visible());
    }
}
