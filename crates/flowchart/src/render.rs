//! Hand-off to renderers.
//!
//! Drawing into a concrete document format is left to the caller. The
//! [`LayoutRenderer`] only turns a graph into scaled, target-neutral boxes and
//! straight connectors that such a caller can place directly.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use crate::{
    config::ExtractionConfig,
    error::{FlowchartError, Result},
    types::Graph,
};

/// Consumer of a finished graph
pub trait GraphRenderer {
    type Output;

    fn render(&self, graph: Graph) -> Result<Self::Output>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShapeLayout {
    pub node_id: usize,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

/// Straight connector between two shape centers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConnectorLayout {
    pub from_node_id: usize,
    pub to_node_id: usize,
    pub begin_x: f64,
    pub begin_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Layout {
    pub shapes: Vec<ShapeLayout>,
    pub connectors: Vec<ConnectorLayout>,
}

impl Layout {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Scales node geometry into target canvas units
#[derive(Debug, Clone)]
pub struct LayoutRenderer {
    pub scale: f64,
}

impl Default for LayoutRenderer {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl LayoutRenderer {
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.scale)
    }
}

impl GraphRenderer for LayoutRenderer {
    type Output = Layout;

    fn render(&self, graph: Graph) -> Result<Layout> {
        let scale = self.scale;
        let connectors = graph
            .connections()
            .iter()
            .map(|connection| -> Result<ConnectorLayout> {
                let missing = |id: usize| {
                    FlowchartError::InvalidGraph(format!("connection references unknown node {id}"))
                };
                let from = graph
                    .node(connection.from_node_id)
                    .ok_or_else(|| missing(connection.from_node_id))?;
                let to = graph
                    .node(connection.to_node_id)
                    .ok_or_else(|| missing(connection.to_node_id))?;
                Ok(ConnectorLayout {
                    from_node_id: from.id,
                    to_node_id: to.id,
                    begin_x: from.center_x * scale,
                    begin_y: from.center_y * scale,
                    end_x: to.center_x * scale,
                    end_y: to.center_y * scale,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (nodes, _) = graph.into_parts();
        let shapes = nodes
            .into_iter()
            .map(|node| ShapeLayout {
                node_id: node.id,
                left: node.x as f64 * scale,
                top: node.y as f64 * scale,
                width: node.width as f64 * scale,
                height: node.height as f64 * scale,
                text: node.text,
            })
            .collect();

        Ok(Layout { shapes, connectors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Connection, Node, Region};

    fn graph() -> Graph {
        Graph::assemble(
            vec![
                Node::from_region(Region { id: 0, x: 10, y: 10, width: 60, height: 40 }, "Start"),
                Node::from_region(Region { id: 1, x: 130, y: 10, width: 60, height: 40 }, "End"),
            ],
            vec![Connection { from_node_id: 0, to_node_id: 1 }],
        )
    }

    #[test]
    fn test_layout_scales_geometry() {
        let layout = LayoutRenderer::new(0.5).render(graph()).expect("Should render");

        assert_eq!(layout.shapes.len(), 2);
        assert_eq!(layout.shapes[0].left, 5.0);
        assert_eq!(layout.shapes[0].width, 30.0);
        assert_eq!(layout.shapes[1].text, "End");
        assert_eq!(
            layout.connectors,
            vec![ConnectorLayout {
                from_node_id: 0,
                to_node_id: 1,
                begin_x: 20.0,
                begin_y: 15.0,
                end_x: 80.0,
                end_y: 15.0,
            }]
        );
    }

    #[test]
    fn test_dangling_connection_is_rejected() {
        let broken = Graph::assemble(
            vec![Node::from_region(Region { id: 0, x: 0, y: 0, width: 30, height: 20 }, "")],
            vec![Connection { from_node_id: 0, to_node_id: 4 }],
        );
        assert!(LayoutRenderer::default().render(broken).is_err());
    }
}
