use std::collections::HashMap;

use foundation::geo::{LatLon, PixelPoint, mean_position};
use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ClusterConfig {
    pub max_cluster_radius_px: f64,
    /// At or above this zoom every point is its own marker.
    pub disable_clustering_at_zoom: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_cluster_radius_px: 80.0,
            disable_clustering_at_zoom: 8.0,
        }
    }
}

/// One drawable item; indices refer to the input slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClusterItem {
    Marker { index: usize },
    Cluster { center: LatLon, members: Vec<usize> },
}

struct Group {
    anchor: PixelPoint,
    members: Vec<usize>,
}

/// Greedy proximity clustering in Web-Mercator pixel space.
///
/// Points are visited in input order; each joins the earliest-created group
/// whose anchor (its first member) lies within the radius, otherwise it
/// anchors a new group. Output follows group creation order.
pub fn cluster_points(points: &[LatLon], zoom: f64, config: &ClusterConfig) -> Vec<ClusterItem> {
    let radius = config.max_cluster_radius_px;
    if zoom >= config.disable_clustering_at_zoom || radius <= 0.0 {
        return (0..points.len()).map(|index| ClusterItem::Marker { index }).collect();
    }

    let radius_sq = radius * radius;
    let cell_of = |p: PixelPoint| ((p.x / radius).floor() as i64, (p.y / radius).floor() as i64);

    let mut groups: Vec<Group> = Vec::new();
    // Anchor cell -> group indices anchored there.
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();

    for (index, point) in points.iter().enumerate() {
        let pixel = point.to_pixel(zoom);
        let (cx, cy) = cell_of(pixel);

        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(candidates) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                for &g in candidates {
                    if best.is_some_and(|b| b <= g) {
                        continue;
                    }
                    if groups[g].anchor.distance_sq(pixel) <= radius_sq {
                        best = Some(g);
                    }
                }
            }
        }

        match best {
            Some(g) => groups[g].members.push(index),
            None => {
                grid.entry((cx, cy)).or_default().push(groups.len());
                groups.push(Group {
                    anchor: pixel,
                    members: vec![index],
                });
            }
        }
    }

    groups
        .into_iter()
        .map(|group| match group.members.as_slice() {
            [index] => ClusterItem::Marker { index: *index },
            members => ClusterItem::Cluster {
                center: mean_position(members.iter().map(|&i| points[i]))
                    .unwrap_or(points[members[0]]),
                members: group.members,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ClusterConfig, ClusterItem, cluster_points};
    use foundation::geo::LatLon;
    use pretty_assertions::assert_eq;

    #[test]
    fn nearby_points_merge_at_low_zoom() {
        let points = [
            LatLon::new(-33.45, -70.66),
            LatLon::new(-33.46, -70.67),
            LatLon::new(-20.0, -70.0),
        ];
        let items = cluster_points(&points, 5.0, &ClusterConfig::default());
        assert_eq!(items.len(), 2);
        match &items[0] {
            ClusterItem::Cluster { members, center } => {
                assert_eq!(members, &vec![0, 1]);
                assert!((center.lat + 33.455).abs() < 1e-9);
            }
            other => panic!("expected cluster, got {other:?}"),
        }
        assert_eq!(items[1], ClusterItem::Marker { index: 2 });
    }

    #[test]
    fn clustering_disabled_at_high_zoom() {
        let points = [LatLon::new(-33.45, -70.66), LatLon::new(-33.45, -70.66)];
        let items = cluster_points(&points, 8.0, &ClusterConfig::default());
        assert_eq!(
            items,
            vec![ClusterItem::Marker { index: 0 }, ClusterItem::Marker { index: 1 }]
        );
    }

    #[test]
    fn every_point_lands_in_exactly_one_item() {
        let points: Vec<LatLon> = (0..200)
            .map(|i| LatLon::new(-40.0 + (i % 17) as f64 * 0.7, -72.0 + (i % 11) as f64 * 0.4))
            .collect();
        let items = cluster_points(&points, 6.0, &ClusterConfig::default());
        let mut seen: Vec<usize> = items
            .iter()
            .flat_map(|item| match item {
                ClusterItem::Marker { index } => vec![*index],
                ClusterItem::Cluster { members, .. } => members.clone(),
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }
}
