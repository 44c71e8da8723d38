//! draw.io (`mxfile` / `mxGraphModel`) serialization of a laid-out diagram.

use crate::core::synthesizer::ROW_STYLE;
use crate::domain::diagram::{DiagramEdge, DiagramLayout, DiagramNode};
use crate::utils::error::{Req2DomError, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;

const MULTIPLICITY_STYLE: &str =
    "edgeLabel;resizable=0;html=1;fontSize=11;verticalAlign=bottom;";

pub fn to_drawio(layout: &DiagramLayout) -> Result<String> {
    check_text(layout)?;

    let mut xml = XmlOut::new();
    xml.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    xml.open("mxfile", &[("host", "req2dom"), ("type", "device")])?;
    xml.open("diagram", &[("id", "domain-model"), ("name", "Domain Model")])?;

    let page_width = number(layout.metadata.width.max(850.0));
    let page_height = number(layout.metadata.height.max(1100.0));
    xml.open(
        "mxGraphModel",
        &[
            ("grid", "1"),
            ("gridSize", "10"),
            ("guides", "1"),
            ("tooltips", "1"),
            ("connect", "1"),
            ("arrows", "1"),
            ("fold", "1"),
            ("page", "1"),
            ("pageScale", "1"),
            ("pageWidth", page_width.as_str()),
            ("pageHeight", page_height.as_str()),
            ("math", "0"),
            ("shadow", "0"),
        ],
    )?;
    xml.open("root", &[])?;
    xml.empty("mxCell", &[("id", "0")])?;
    xml.empty("mxCell", &[("id", "1"), ("parent", "0")])?;

    for node in &layout.nodes {
        write_node(&mut xml, node)?;
    }
    for edge in &layout.edges {
        write_edge(&mut xml, edge)?;
    }

    xml.close("root")?;
    xml.close("mxGraphModel")?;
    xml.close("diagram")?;
    xml.close("mxfile")?;

    xml.finish()
}

fn write_node(xml: &mut XmlOut, node: &DiagramNode) -> Result<()> {
    let b = node.bounds;
    xml.open(
        "mxCell",
        &[
            ("id", node.id.as_str()),
            ("value", node.label.as_str()),
            ("style", node.style.as_str()),
            ("vertex", "1"),
            ("parent", "1"),
        ],
    )?;
    xml.empty(
        "mxGeometry",
        &[
            ("x", number(b.x).as_str()),
            ("y", number(b.y).as_str()),
            ("width", number(b.width).as_str()),
            ("height", number(b.height).as_str()),
            ("as", "geometry"),
        ],
    )?;
    xml.close("mxCell")?;

    for (i, row) in node.rows.iter().enumerate() {
        // 類別 id 不含 `.`，列 id 不會與其他類別相撞
        let id = format!("{}.attr-{}", node.id, i);
        let y = node.header_height + i as f64 * node.row_height;
        xml.open(
            "mxCell",
            &[
                ("id", id.as_str()),
                ("value", row.as_str()),
                ("style", ROW_STYLE),
                ("vertex", "1"),
                ("parent", node.id.as_str()),
            ],
        )?;
        xml.empty(
            "mxGeometry",
            &[
                ("y", number(y).as_str()),
                ("width", number(b.width).as_str()),
                ("height", number(node.row_height).as_str()),
                ("as", "geometry"),
            ],
        )?;
        xml.close("mxCell")?;
    }
    Ok(())
}

fn write_edge(xml: &mut XmlOut, edge: &DiagramEdge) -> Result<()> {
    xml.open(
        "mxCell",
        &[
            ("id", edge.id.as_str()),
            ("value", edge.label.as_deref().unwrap_or("")),
            ("style", edge.style.as_str()),
            ("edge", "1"),
            ("parent", "1"),
            ("source", edge.source.as_str()),
            ("target", edge.target.as_str()),
        ],
    )?;
    xml.empty("mxGeometry", &[("relative", "1"), ("as", "geometry")])?;
    xml.close("mxCell")?;

    // 多重性標籤掛在邊上，x=-1 為起點、x=1 為終點
    let ends = [
        ("source", "-1", "align=left;", &edge.source_label),
        ("target", "1", "align=right;", &edge.target_label),
    ];
    for (end, x, align, label) in ends {
        let Some(label) = label else { continue };
        let id = format!("{}.{}", edge.id, end);
        let style = format!("{}{}", MULTIPLICITY_STYLE, align);
        xml.open(
            "mxCell",
            &[
                ("id", id.as_str()),
                ("value", label.as_str()),
                ("style", style.as_str()),
                ("vertex", "1"),
                ("connectable", "0"),
                ("parent", edge.id.as_str()),
            ],
        )?;
        xml.open("mxGeometry", &[("x", x), ("relative", "1"), ("as", "geometry")])?;
        xml.empty("mxPoint", &[("as", "offset")])?;
        xml.close("mxGeometry")?;
        xml.close("mxCell")?;
    }
    Ok(())
}

/// XML 1.0 forbids most control characters even when escaped.
fn check_text(layout: &DiagramLayout) -> Result<()> {
    let texts = layout
        .nodes
        .iter()
        .flat_map(|n| std::iter::once(&n.label).chain(n.rows.iter()))
        .chain(layout.edges.iter().filter_map(|e| e.label.as_ref()))
        .chain(
            layout
                .edges
                .iter()
                .flat_map(|e| [e.source_label.as_ref(), e.target_label.as_ref()])
                .flatten(),
        );
    for text in texts {
        if let Some(c) = text
            .chars()
            .find(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
        {
            return Err(Req2DomError::Serialization {
                message: format!("'{}' contains control character U+{:04X}", text.escape_debug(), c as u32),
            });
        }
    }
    Ok(())
}

/// Whole numbers without a fractional part, others with one decimal.
fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

struct XmlOut {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Req2DomError::Serialization {
                message: e.to_string(),
            })
    }

    fn open(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attributes.iter().copied());
        self.event(Event::Start(start))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attributes.iter().copied());
        self.event(Event::Empty(start))
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner().into_inner()).map_err(|e| {
            Req2DomError::Serialization {
                message: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::synthesizer::Synthesizer;
    use crate::domain::model::{
        ClassId, DomainAttribute, DomainClass, DomainModel, DomainRelationship, Multiplicity,
        RelationshipKind,
    };
    use indexmap::IndexMap;
    use std::collections::BTreeSet;

    fn class(id: &str, name: &str, attributes: &[&str]) -> DomainClass {
        DomainClass {
            id: ClassId(id.to_string()),
            name: name.to_string(),
            attributes: attributes
                .iter()
                .map(|a| DomainAttribute {
                    name: a.to_string(),
                    type_name: None,
                })
                .collect(),
            sources: BTreeSet::from([0]),
        }
    }

    fn model() -> DomainModel {
        let mut classes = IndexMap::new();
        for c in [
            class("class-cliente", "Cliente", &["nome", "email"]),
            class("class-pessoa", "Pessoa <abstrata>", &[]),
        ] {
            classes.insert(c.id.clone(), c);
        }
        DomainModel {
            classes,
            relationships: vec![DomainRelationship {
                id: "rel.cliente.pessoa.generalization".to_string(),
                source: ClassId("class-cliente".to_string()),
                target: ClassId("class-pessoa".to_string()),
                kind: RelationshipKind::Generalization,
                multiplicity: Multiplicity::default(),
                label: None,
            }],
        }
    }

    #[test]
    fn test_document_structure() {
        let layout = Synthesizer::default().layout(&model());
        let xml = to_drawio(&layout).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<mxCell id=\"0\"/>"));
        assert!(xml.contains("<mxCell id=\"1\" parent=\"0\"/>"));
        assert!(xml.contains("value=\"Pessoa &lt;abstrata&gt;\""));
        assert!(xml.contains("id=\"class-cliente.attr-1\" value=\"email\""));
        assert_eq!(xml.matches("edge=\"1\"").count(), 1);
        // generalization edges carry no multiplicity labels
        assert!(!xml.contains(".source\""));
    }

    #[test]
    fn test_multiplicity_labels() {
        let mut m = model();
        m.relationships[0].kind = RelationshipKind::Association;
        m.relationships[0].multiplicity.target = "0..*".to_string();
        let xml = to_drawio(&Synthesizer::default().layout(&m)).unwrap();
        assert!(xml.contains("id=\"rel.cliente.pessoa.generalization.target\" value=\"0..*\""));
        assert!(xml.contains("<mxGeometry x=\"-1\" relative=\"1\" as=\"geometry\">"));
    }

    #[test]
    fn test_row_ids_never_match_class_ids() {
        let mut classes = IndexMap::new();
        for c in [
            class("class-cliente", "Cliente", &["nome"]),
            class("class-cliente-attr-0", "Cliente Attr 0", &["codigo"]),
        ] {
            classes.insert(c.id.clone(), c);
        }
        let m = DomainModel {
            classes,
            relationships: vec![],
        };
        let xml = to_drawio(&Synthesizer::default().layout(&m)).unwrap();

        let ids: Vec<&str> = xml
            .split("<mxCell id=\"")
            .skip(1)
            .filter_map(|rest| rest.split('"').next())
            .collect();
        assert_eq!(
            ids,
            vec![
                "0",
                "1",
                "class-cliente",
                "class-cliente.attr-0",
                "class-cliente-attr-0",
                "class-cliente-attr-0.attr-0"
            ]
        );
    }

    #[test]
    fn test_deterministic_output() {
        let layout = Synthesizer::default().layout(&model());
        assert_eq!(to_drawio(&layout).unwrap(), to_drawio(&layout).unwrap());
    }

    #[test]
    fn test_control_characters_rejected() {
        let mut m = model();
        m.classes[0].name = "Cli\u{0007}ente".to_string();
        let err = to_drawio(&Synthesizer::default().layout(&m)).unwrap_err();
        assert!(matches!(err, Req2DomError::Serialization { .. }));
    }

    #[test]
    fn test_number_format() {
        assert_eq!(number(40.0), "40");
        assert_eq!(number(12.5), "12.5");
    }
}
