//! Grid layout of a `DomainModel` and serialization into the output document.

use crate::core::drawio;
use crate::domain::diagram::{
    Anchor, DiagramDocument, DiagramEdge, DiagramLayout, DiagramNode, LayoutMetadata,
    OutputFormat, Rect,
};
use crate::domain::model::{DomainModel, RelationshipKind};
use crate::utils::error::{Req2DomError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CLASS_STYLE: &str = "swimlane;fontStyle=1;align=center;verticalAlign=top;\
childLayout=stackLayout;horizontal=1;startSize=26;horizontalStack=0;resizeParent=1;\
resizeParentMax=0;resizeLast=0;collapsible=1;marginBottom=0;";

pub const ROW_STYLE: &str = "text;strokeColor=none;fillColor=none;align=left;\
verticalAlign=top;spacingLeft=4;spacingRight=4;overflow=hidden;rotatable=0;\
points=[[0,0.5],[1,0.5]];portConstraint=eastwest;whiteSpace=wrap;";

/// Grid and node sizing. Serialized as the `[layout]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub max_columns: usize,
    pub cell_width: f64,
    pub cell_height: f64,
    pub min_node_width: f64,
    /// Approximate width of one character of label text.
    pub char_width: f64,
    pub horizontal_padding: f64,
    pub header_height: f64,
    pub row_height: f64,
    /// Gap kept between nodes and around the drawing.
    pub margin: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            max_columns: 4,
            cell_width: 260.0,
            cell_height: 220.0,
            min_node_width: 160.0,
            char_width: 7.0,
            horizontal_padding: 24.0,
            header_height: 26.0,
            row_height: 26.0,
            margin: 40.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    options: LayoutOptions,
}

impl Synthesizer {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Classes keep the model's order, which is first appearance in the requirements.
    pub fn layout(&self, model: &DomainModel) -> DiagramLayout {
        let o = &self.options;
        let count = model.classes.len();
        let columns = o.max_columns.max(1).min(count.max(1));
        let rows = count.div_ceil(columns).max(1);

        let sized: Vec<(String, String, Vec<String>, f64, f64)> = model
            .classes
            .values()
            .map(|class| {
                let rows: Vec<String> = class.attributes.iter().map(|a| a.display()).collect();
                let longest = rows
                    .iter()
                    .map(|r| r.chars().count())
                    .chain(std::iter::once(class.name.chars().count()))
                    .max()
                    .unwrap_or(0);
                let width = (longest as f64 * o.char_width + o.horizontal_padding)
                    .max(o.min_node_width)
                    .ceil();
                let height = o.header_height + rows.len().max(1) as f64 * o.row_height;
                (class.id.to_string(), class.name.clone(), rows, width, height)
            })
            .collect();

        // 節點超過格子時放大間距，避免重疊
        let widest = sized.iter().map(|s| s.3).fold(0.0, f64::max);
        let tallest = sized.iter().map(|s| s.4).fold(0.0, f64::max);
        let pitch_x = o.cell_width.max(widest + o.margin);
        let pitch_y = o.cell_height.max(tallest + o.margin);

        let nodes: Vec<DiagramNode> = sized
            .into_iter()
            .enumerate()
            .map(|(i, (id, label, rows, width, height))| DiagramNode {
                id,
                label,
                rows,
                bounds: Rect {
                    x: o.margin + (i % columns) as f64 * pitch_x,
                    y: o.margin + (i / columns) as f64 * pitch_y,
                    width,
                    height,
                },
                header_height: o.header_height,
                row_height: o.row_height,
                style: CLASS_STYLE.to_string(),
            })
            .collect();

        let bounds: HashMap<&str, Rect> =
            nodes.iter().map(|n| (n.id.as_str(), n.bounds)).collect();
        let edges = model
            .relationships
            .iter()
            .filter_map(|rel| {
                let source = bounds.get(rel.source.as_str())?;
                let target = bounds.get(rel.target.as_str())?;
                let (exit, entry) = anchors(source, target, rel.source == rel.target);
                let multiplicities = rel.kind != RelationshipKind::Generalization;
                Some(DiagramEdge {
                    id: rel.id.clone(),
                    source: rel.source.to_string(),
                    target: rel.target.to_string(),
                    kind: rel.kind,
                    label: rel.label.clone(),
                    source_label: multiplicities.then(|| rel.multiplicity.source.clone()),
                    target_label: multiplicities.then(|| rel.multiplicity.target.clone()),
                    exit,
                    entry,
                    source_point: source.anchor(exit),
                    target_point: target.anchor(entry),
                    style: edge_style(rel.kind, exit, entry),
                })
            })
            .collect();

        DiagramLayout {
            nodes,
            edges,
            metadata: LayoutMetadata {
                columns,
                rows,
                width: o.margin + columns as f64 * pitch_x,
                height: o.margin + rows as f64 * pitch_y,
            },
        }
    }

    pub fn render(&self, model: &DomainModel, format: OutputFormat) -> Result<DiagramDocument> {
        let layout = self.layout(model);
        let content = match format {
            OutputFormat::Drawio => drawio::to_drawio(&layout)?,
            OutputFormat::Json => serde_json::to_string_pretty(model).map_err(|e| {
                Req2DomError::Serialization {
                    message: e.to_string(),
                }
            })?,
        };
        tracing::info!(
            "🖼️ Rendered {} nodes and {} edges as {:?} ({} bytes)",
            layout.nodes.len(),
            layout.edges.len(),
            format,
            content.len()
        );
        Ok(DiagramDocument {
            content,
            format,
            metadata: layout.metadata,
        })
    }
}

/// Boundary attachment points facing the other node.
fn anchors(source: &Rect, target: &Rect, self_loop: bool) -> (Anchor, Anchor) {
    if self_loop {
        return (Anchor::RIGHT, Anchor::TOP);
    }
    let from = source.center();
    let to = target.center();
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            (Anchor::RIGHT, Anchor::LEFT)
        } else {
            (Anchor::LEFT, Anchor::RIGHT)
        }
    } else if dy > 0.0 {
        (Anchor::BOTTOM, Anchor::TOP)
    } else {
        (Anchor::TOP, Anchor::BOTTOM)
    }
}

pub fn edge_style(kind: RelationshipKind, exit: Anchor, entry: Anchor) -> String {
    let arrows = match kind {
        RelationshipKind::Generalization => "endArrow=block;endFill=0;endSize=12;",
        RelationshipKind::Aggregation => "startArrow=diamondThin;startFill=0;startSize=14;endArrow=none;",
        RelationshipKind::Composition => "startArrow=diamondThin;startFill=1;startSize=14;endArrow=none;",
        RelationshipKind::Association => "endArrow=none;",
    };
    format!(
        "edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;\
exitX={};exitY={};exitDx=0;exitDy=0;entryX={};entryY={};entryDx=0;entryDy=0;{}",
        exit.x, exit.y, entry.x, entry.y, arrows
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        ClassId, DomainAttribute, DomainClass, DomainRelationship, Multiplicity,
    };
    use indexmap::IndexMap;
    use std::collections::BTreeSet;

    fn model(n: usize) -> DomainModel {
        let mut classes = IndexMap::new();
        for i in 0..n {
            let id = ClassId(format!("class-c{}", i));
            classes.insert(
                id.clone(),
                DomainClass {
                    id,
                    name: format!("Classe{}", i),
                    attributes: vec![DomainAttribute {
                        name: "nome".to_string(),
                        type_name: Some("String".to_string()),
                    }],
                    sources: BTreeSet::from([i]),
                },
            );
        }
        let relationships = (1..n)
            .map(|i| DomainRelationship {
                id: format!("rel.c0.c{}.association", i),
                source: ClassId("class-c0".to_string()),
                target: ClassId(format!("class-c{}", i)),
                kind: RelationshipKind::Association,
                multiplicity: Multiplicity::default(),
                label: None,
            })
            .collect();
        DomainModel {
            classes,
            relationships,
        }
    }

    #[test]
    fn test_grid_positions() {
        let layout = Synthesizer::default().layout(&model(6));
        assert_eq!(layout.metadata.columns, 4);
        assert_eq!(layout.metadata.rows, 2);

        let first = layout.nodes[0].bounds;
        let fifth = layout.nodes[4].bounds;
        assert_eq!((first.x, first.y), (40.0, 40.0));
        assert_eq!(fifth.x, 40.0);
        assert_eq!(fifth.y, 40.0 + 220.0);
        assert_eq!(layout.nodes[1].bounds.x, 40.0 + 260.0);
    }

    #[test]
    fn test_node_sizing() {
        let mut m = model(1);
        let class = m.classes.values_mut().next().unwrap();
        class.attributes.push(DomainAttribute {
            name: "descricao_muito_longa_do_produto_em_catalogo".to_string(),
            type_name: Some("String".to_string()),
        });
        let layout = Synthesizer::default().layout(&m);
        let node = &layout.nodes[0];
        assert!(node.bounds.width > 160.0);
        assert_eq!(node.bounds.height, 26.0 + 2.0 * 26.0);

        let small = Synthesizer::default().layout(&model(1));
        assert_eq!(small.nodes[0].bounds.width, 160.0);
    }

    #[test]
    fn test_edges_attach_to_facing_sides() {
        let layout = Synthesizer::default().layout(&model(6));
        let right = &layout.edges[0];
        assert_eq!(right.exit, Anchor::RIGHT);
        assert_eq!(right.entry, Anchor::LEFT);

        // class-c4 sits directly below class-c0
        let below = layout.edges.iter().find(|e| e.target == "class-c4").unwrap();
        assert_eq!(below.exit, Anchor::BOTTOM);
        assert_eq!(below.entry, Anchor::TOP);
        assert_eq!(below.source_point.y, 40.0 + layout.nodes[0].bounds.height);
    }

    #[test]
    fn test_edge_styles() {
        let s = edge_style(RelationshipKind::Generalization, Anchor::TOP, Anchor::BOTTOM);
        assert!(s.contains("endArrow=block;endFill=0"));
        assert!(s.contains("edgeStyle=orthogonalEdgeStyle"));
        assert!(edge_style(RelationshipKind::Composition, Anchor::TOP, Anchor::BOTTOM)
            .contains("startArrow=diamondThin;startFill=1"));
        assert!(edge_style(RelationshipKind::Aggregation, Anchor::TOP, Anchor::BOTTOM)
            .contains("startFill=0"));
    }

    #[test]
    fn test_json_render() {
        let doc = Synthesizer::default()
            .render(&model(2), OutputFormat::Json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc.content).unwrap();
        assert_eq!(value["classes"]["class-c1"]["name"], "Classe1");
        assert_eq!(value["relationships"][0]["kind"], "association");
    }
}
