use crate::domain::model::RelationshipKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Point on the boundary given relative coordinates in `[0, 1]`.
    pub fn anchor(&self, side: Anchor) -> Point {
        Point {
            x: self.x + self.width * side.x,
            y: self.y + self.height * side.y,
        }
    }
}

/// Relative attachment point on a node boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const LEFT: Anchor = Anchor { x: 0.0, y: 0.5 };
    pub const RIGHT: Anchor = Anchor { x: 1.0, y: 0.5 };
    pub const TOP: Anchor = Anchor { x: 0.5, y: 0.0 };
    pub const BOTTOM: Anchor = Anchor { x: 0.5, y: 1.0 };
}

/// Geometry-augmented projection of a `DomainClass`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramNode {
    pub id: String,
    pub label: String,
    pub rows: Vec<String>,
    pub bounds: Rect,
    pub header_height: f64,
    pub row_height: f64,
    pub style: String,
}

/// Geometry-augmented projection of a `DomainRelationship`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    pub label: Option<String>,
    pub source_label: Option<String>,
    pub target_label: Option<String>,
    pub exit: Anchor,
    pub entry: Anchor,
    pub source_point: Point,
    pub target_point: Point,
    pub style: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutMetadata {
    pub columns: usize,
    pub rows: usize,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramLayout {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub metadata: LayoutMetadata,
}

/// Serialized document plus the layout facts a caller may want to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramDocument {
    pub content: String,
    pub format: OutputFormat,
    pub metadata: LayoutMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Drawio,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "drawio" | "xml" | "mxgraph" => Some(OutputFormat::Drawio),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Drawio => "drawio",
            OutputFormat::Json => "json",
        }
    }
}
