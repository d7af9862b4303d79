use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box of a qualifying contour, before any text is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    /// Detection index, stable for the lifetime of the run
    pub id: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// A detected flowchart shape with its recognized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub id: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub center_x: f64,
    pub center_y: f64,
    /// Trimmed OCR output, empty when nothing was recognized
    pub text: String,
}

impl Node {
    pub fn from_region(region: Region, text: impl Into<String>) -> Self {
        let (center_x, center_y) = region.center();
        Self {
            id: region.id,
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            center_x,
            center_y,
            text: text.into(),
        }
    }

    pub fn region(&self) -> Region {
        Region {
            id: self.id,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Raw line candidate as reported by the line detector.
///
/// Endpoint order is the detector's walk order and does not necessarily match
/// the direction the arrow was drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn start(&self) -> (f64, f64) {
        (self.x1 as f64, self.y1 as f64)
    }

    pub fn end(&self) -> (f64, f64) {
        (self.x2 as f64, self.y2 as f64)
    }
}

/// Directed edge between two distinct nodes.
///
/// The direction follows the endpoint order of the segment it was resolved
/// from. Treat it as a best-effort guess: arrow heads are not inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Connection {
    pub from_node_id: usize,
    pub to_node_id: usize,
}

/// Final extraction result handed to a renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Graph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl Graph {
    /// Compose the final graph. No filtering happens here: node and
    /// connection policy belongs to the detectors and the resolver.
    pub fn assemble(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        tracing::debug!(
            nodes = nodes.len(),
            connections = connections.len(),
            "Assembled graph"
        );
        Self { nodes, connections }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: usize) -> Option<&Node> {
        // Ids are detection indices, so the fast path is a direct index.
        match self.nodes.get(id) {
            Some(node) if node.id == id => Some(node),
            _ => self.nodes.iter().find(|node| node.id == id),
        }
    }

    pub fn outgoing(&self, id: usize) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from_node_id == id)
    }

    pub fn incoming(&self, id: usize) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.to_node_id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Split into owned parts for a renderer that wants to consume them.
    pub fn into_parts(self) -> (Vec<Node>, Vec<Connection>) {
        (self.nodes, self.connections)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(content: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Non-fatal condition recovered inside a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractionWarning {
    pub node_id: usize,
    pub message: String,
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Extraction {
    pub graph: Graph,
    pub warnings: Vec<ExtractionWarning>,
    /// Original image dimensions
    pub image_width: u32,
    pub image_height: u32,
}
