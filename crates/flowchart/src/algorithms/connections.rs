use std::collections::HashSet;

use geo::EuclideanDistance;
use geo_types::Point;
use crate::{
    config::ExtractionConfig,
    types::{Connection, Node, Segment},
};

/// Distances closer than this are treated as equal
const TIE_EPSILON: f64 = 1e-9;

/// Maps segment endpoints onto the nearest node centers.
#[derive(Debug, Clone)]
pub struct ConnectionResolver {
    /// Endpoints must be strictly closer than this to a center
    pub threshold: f64,
    pub deduplicate: bool,
}

impl Default for ConnectionResolver {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl ConnectionResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, deduplicate: false }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            threshold: config.connect_threshold,
            deduplicate: config.deduplicate_connections,
        }
    }

    /// Id of the node whose center is nearest to `point`, if it lies within
    /// the threshold. Equidistant candidates resolve to the lowest id.
    pub fn nearest_node(&self, nodes: &[Node], point: (f64, f64)) -> Option<usize> {
        let point = Point::new(point.0, point.1);
        let mut best: Option<(f64, usize)> = None;
        let mut tied = false;

        for node in nodes {
            let distance = point.euclidean_distance(&Point::new(node.center_x, node.center_y));
            best = match best {
                None => Some((distance, node.id)),
                Some((best_distance, best_id)) => {
                    if (distance - best_distance).abs() <= TIE_EPSILON {
                        tied = true;
                        Some((best_distance, best_id.min(node.id)))
                    } else if distance < best_distance {
                        tied = false;
                        Some((distance, node.id))
                    } else {
                        Some((best_distance, best_id))
                    }
                }
            };
        }

        let (distance, id) = best?;
        if distance >= self.threshold {
            return None;
        }
        if tied {
            tracing::debug!(node_id = id, x = point.x(), y = point.y(), "Ambiguous endpoint, picked lowest id");
        }
        Some(id)
    }

    /// Resolve one segment into a connection, or `None` when either endpoint
    /// is unresolved or both land on the same node.
    pub fn resolve_segment(&self, nodes: &[Node], segment: &Segment) -> Option<Connection> {
        let from_node_id = self.nearest_node(nodes, segment.start())?;
        let to_node_id = self.nearest_node(nodes, segment.end())?;
        if from_node_id == to_node_id {
            return None;
        }
        Some(Connection { from_node_id, to_node_id })
    }

    /// Resolve all segments, keeping segment order.
    pub fn resolve(&self, nodes: &[Node], segments: &[Segment]) -> Vec<Connection> {
        let mut seen = HashSet::new();
        let connections: Vec<Connection> = segments
            .iter()
            .filter_map(|segment| self.resolve_segment(nodes, segment))
            .filter(|connection| !self.deduplicate || seen.insert(*connection))
            .collect();

        tracing::debug!(
            segments = segments.len(),
            connections = connections.len(),
            "Connection resolution finished"
        );
        connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;
    use proptest::prelude::*;

    fn node(id: usize, x: u32, y: u32, width: u32, height: u32) -> Node {
        Node::from_region(Region { id, x, y, width, height }, "")
    }

    fn two_boxes() -> Vec<Node> {
        vec![node(0, 10, 10, 60, 40), node(1, 130, 10, 60, 40)]
    }

    #[test]
    fn test_segment_between_boxes_connects_first_to_second() {
        let resolver = ConnectionResolver::default();
        let connections = resolver.resolve(&two_boxes(), &[Segment::new(70, 30, 130, 30)]);
        assert_eq!(connections, vec![Connection { from_node_id: 0, to_node_id: 1 }]);
    }

    #[test]
    fn test_direction_follows_endpoint_order() {
        let resolver = ConnectionResolver::default();
        let connections = resolver.resolve(&two_boxes(), &[Segment::new(130, 30, 70, 30)]);
        assert_eq!(connections, vec![Connection { from_node_id: 1, to_node_id: 0 }]);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Center at (40, 30)
        let nodes = vec![node(0, 10, 10, 60, 40)];
        let resolver = ConnectionResolver::new(80.0);

        assert_eq!(resolver.nearest_node(&nodes, (120.0, 30.0)), None);
        assert_eq!(resolver.nearest_node(&nodes, (40.0, 110.0)), None);
        assert_eq!(resolver.nearest_node(&nodes, (119.5, 30.0)), Some(0));
    }

    #[test]
    fn test_integer_endpoint_just_inside_threshold() {
        // Center at (40.5, 30): an endpoint at x = 120 is 79.5 away
        let nodes = vec![node(0, 10, 10, 61, 40), node(1, 300, 10, 60, 40)];
        let resolver = ConnectionResolver::new(80.0);
        assert_eq!(resolver.nearest_node(&nodes, (120.0, 30.0)), Some(0));
    }

    #[test]
    fn test_far_segment_is_dropped() {
        let resolver = ConnectionResolver::default();
        let connections = resolver.resolve(&two_boxes(), &[Segment::new(0, 190, 199, 190)]);
        assert!(connections.is_empty());
    }

    #[test]
    fn test_half_resolved_segment_is_dropped() {
        let resolver = ConnectionResolver::default();
        let connections = resolver.resolve(&two_boxes(), &[Segment::new(70, 30, 160, 190)]);
        assert!(connections.is_empty());
    }

    #[test]
    fn test_self_loop_is_dropped() {
        let resolver = ConnectionResolver::default();
        // The top edge of the first box
        let connections = resolver.resolve(&two_boxes(), &[Segment::new(10, 10, 69, 10)]);
        assert!(connections.is_empty());
    }

    #[test]
    fn test_identical_geometry_is_not_a_self_loop() {
        // Two distinct nodes stacked on the same box are still different nodes
        let nodes = vec![node(0, 10, 10, 60, 40), node(1, 10, 10, 60, 40), node(2, 200, 10, 60, 40)];
        let resolver = ConnectionResolver::default();
        let connections = resolver.resolve(&nodes, &[Segment::new(40, 30, 230, 30)]);
        assert_eq!(connections, vec![Connection { from_node_id: 0, to_node_id: 2 }]);
    }

    #[test]
    fn test_ties_pick_lowest_id() {
        // Centers at (40, 30) and (120, 30); the endpoint sits halfway
        let nodes = vec![node(1, 100, 10, 40, 40), node(0, 20, 10, 40, 40)];
        let resolver = ConnectionResolver::default();
        assert_eq!(resolver.nearest_node(&nodes, (80.0, 30.0)), Some(0));

        let reversed: Vec<Node> = nodes.into_iter().rev().collect();
        assert_eq!(resolver.nearest_node(&reversed, (80.0, 30.0)), Some(0));
    }

    #[test]
    fn test_duplicates_kept_unless_deduplicating() {
        let segments = [Segment::new(70, 29, 130, 29), Segment::new(70, 31, 130, 31)];

        let resolver = ConnectionResolver::default();
        assert_eq!(resolver.resolve(&two_boxes(), &segments).len(), 2);

        let dedup = ConnectionResolver { deduplicate: true, ..Default::default() };
        assert_eq!(
            dedup.resolve(&two_boxes(), &segments),
            vec![Connection { from_node_id: 0, to_node_id: 1 }]
        );
    }

    #[test]
    fn test_no_nodes_means_no_connections() {
        let resolver = ConnectionResolver::default();
        assert!(resolver.resolve(&[], &[Segment::new(0, 0, 100, 100)]).is_empty());
    }

    fn arb_nodes() -> impl Strategy<Value = Vec<Node>> {
        prop::collection::vec((0u32..400, 0u32..400, 30u32..80, 20u32..60), 0..8).prop_map(|boxes| {
            boxes
                .into_iter()
                .enumerate()
                .map(|(id, (x, y, w, h))| node(id, x, y, w, h))
                .collect()
        })
    }

    fn arb_segments() -> impl Strategy<Value = Vec<Segment>> {
        prop::collection::vec((0i32..480, 0i32..480, 0i32..480, 0i32..480), 0..12)
            .prop_map(|coords| coords.into_iter().map(|(a, b, c, d)| Segment::new(a, b, c, d)).collect())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_connections_are_valid(nodes in arb_nodes(), segments in arb_segments(), threshold in 1.0f64..200.0) {
            let resolver = ConnectionResolver::new(threshold);
            let connections = resolver.resolve(&nodes, &segments);

            prop_assert!(connections.len() <= segments.len());
            for connection in &connections {
                prop_assert_ne!(connection.from_node_id, connection.to_node_id);
                prop_assert!(nodes.iter().any(|n| n.id == connection.from_node_id));
                prop_assert!(nodes.iter().any(|n| n.id == connection.to_node_id));
            }
        }

        #[test]
        fn prop_resolution_is_stable(nodes in arb_nodes(), segments in arb_segments()) {
            let resolver = ConnectionResolver::default();
            prop_assert_eq!(resolver.resolve(&nodes, &segments), resolver.resolve(&nodes, &segments));
        }
    }
}
