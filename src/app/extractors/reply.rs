//! Parsing of generation-backend replies into candidates.

use crate::core::text::fold;
use crate::domain::model::{
    CandidateAttribute, CandidateEntity, CandidateRelationship, CandidateSet, Provenance,
    RelationshipKind, RequirementUnit, StrategyKind,
};
use crate::utils::error::ExtractionError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE: f32 = 0.7;

/// Reply shape requested from the backend. The Portuguese field names of
/// older prompts are accepted as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyDocument {
    #[serde(default, alias = "entities", alias = "entidades")]
    pub classes: Vec<ReplyClass>,
    #[serde(default, alias = "relacionamentos", alias = "relations")]
    pub relationships: Vec<ReplyRelationship>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyClass {
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, alias = "atributos")]
    pub attributes: Vec<ReplyAttribute>,
    /// Relationships nested under their source class.
    #[serde(default, alias = "relacionamentos", skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<ReplyRelationship>,
    #[serde(default, alias = "requisito", skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
    #[serde(default, alias = "confianca", skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyAttribute {
    Name(String),
    Typed(TypedAttribute),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedAttribute {
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(default, rename = "type", alias = "tipo", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl ReplyAttribute {
    fn into_candidate(self) -> CandidateAttribute {
        match self {
            ReplyAttribute::Name(name) => CandidateAttribute::new(name.trim(), None),
            ReplyAttribute::Typed(typed) => CandidateAttribute::new(
                typed.name.trim(),
                typed
                    .type_name
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty()),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyRelationship {
    #[serde(default, alias = "origem", alias = "from", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(alias = "alvo", alias = "to")]
    pub target: String,
    #[serde(default, alias = "tipo", alias = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "rotulo", alias = "role", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_multiplicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_multiplicity: Option<String>,
    /// `1..n`, `1:n`, `n`... as written by older prompts.
    #[serde(
        default,
        alias = "cardinalidade",
        alias = "cardinality",
        skip_serializing_if = "Option::is_none"
    )]
    pub multiplicity: Option<String>,
    #[serde(default, alias = "requisito", skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
}

/// Cuts the JSON object out of a reply that may carry prose or code fences.
pub fn extract_payload(reply: &str) -> Option<&str> {
    if let Some(start) = reply.find("```") {
        let after = &reply[start + 3..];
        // skip the language tag on the fence line
        let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after[body_start..];
        let body = match body.find("```") {
            Some(end) => &body[..end],
            None => body,
        };
        let body = body.trim();
        if body.starts_with('{') && body.ends_with('}') {
            return Some(body);
        }
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Reads a legacy cardinality string into (source, target) multiplicities.
///
/// `1:n` names both ends; a single value describes the target end.
/// `n`/`N` becomes `*`.
pub fn parse_cardinality(value: &str) -> (Option<String>, Option<String>) {
    let normalize = |s: &str| {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        Some(
            s.split("..")
                .map(|bound| if bound.eq_ignore_ascii_case("n") { "*" } else { bound })
                .collect::<Vec<_>>()
                .join(".."),
        )
    };
    match value.split_once(':') {
        Some((source, target)) => (normalize(source), normalize(target)),
        None => (None, normalize(value)),
    }
}

/// Parses one backend reply for the given batch of units.
pub fn parse_reply(
    reply: &str,
    units: &[RequirementUnit],
) -> std::result::Result<CandidateSet, ExtractionError> {
    let payload = extract_payload(reply).ok_or_else(|| ExtractionError::MalformedResponse {
        message: format!("no JSON object in reply: {}", preview(reply)),
    })?;
    let document: ReplyDocument =
        serde_json::from_str(payload).map_err(|e| ExtractionError::MalformedResponse {
            message: format!("{} in reply: {}", e, preview(payload)),
        })?;

    Ok(into_candidates(document, units))
}

fn into_candidates(document: ReplyDocument, units: &[RequirementUnit]) -> CandidateSet {
    let mut set = CandidateSet::default();
    let provenance = |unit: usize| Provenance {
        unit,
        strategy: StrategyKind::Generative,
    };

    for class in document.classes {
        let name = class.name.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let unit = locate_unit(class.requirement.as_deref(), &name, units);

        let mut entity = CandidateEntity::new(name.clone(), provenance(unit));
        entity.confidence = Some(class.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0));
        entity.attributes = class
            .attributes
            .into_iter()
            .map(ReplyAttribute::into_candidate)
            .filter(|a| !a.name.is_empty())
            .collect();
        set.entities.push(entity);

        for nested in class.relationships {
            let source = nested.source.clone().unwrap_or_else(|| name.clone());
            if let Some(rel) = relationship(nested, &source, units) {
                set.relationships.push(rel);
            }
        }
    }

    for top in document.relationships {
        match top.source.clone() {
            Some(source) => {
                if let Some(rel) = relationship(top, &source, units) {
                    set.relationships.push(rel);
                }
            }
            None => tracing::warn!("⚠️ Reply relationship to '{}' has no source", top.target),
        }
    }

    set
}

fn relationship(
    reply: ReplyRelationship,
    source: &str,
    units: &[RequirementUnit],
) -> Option<CandidateRelationship> {
    let source = source.trim();
    let target = reply.target.trim();
    if source.is_empty() || target.is_empty() {
        return None;
    }

    let kind = match reply.kind.as_deref() {
        Some(kind) => RelationshipKind::parse(kind).unwrap_or_else(|| {
            tracing::debug!("Unknown relationship kind '{}', using association", kind);
            RelationshipKind::Association
        }),
        None => RelationshipKind::Association,
    };

    let (legacy_source, legacy_target) = reply
        .multiplicity
        .as_deref()
        .map(parse_cardinality)
        .unwrap_or((None, None));
    let source_multiplicity = reply.source_multiplicity.or(legacy_source);
    let target_multiplicity = reply.target_multiplicity.or(legacy_target);

    let unit = locate_unit(reply.requirement.as_deref(), source, units);
    let mut rel = CandidateRelationship::new(
        source,
        target,
        kind,
        Provenance {
            unit,
            strategy: StrategyKind::Generative,
        },
    )
    .with_multiplicity(source_multiplicity.as_deref(), target_multiplicity.as_deref());
    if let Some(label) = reply.label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
        rel = rel.with_label(label);
    }
    // 模型明確回傳自身關聯時視為遞迴
    rel.recursive = fold(source) == fold(target);
    Some(rel)
}

/// Unit a reply item came from: the requirement code it names, otherwise
/// the first unit mentioning the name, otherwise the start of the batch.
fn locate_unit(code: Option<&str>, name: &str, units: &[RequirementUnit]) -> usize {
    if let Some(code) = code {
        let wanted = fold(code).replace([' ', '_', '-'], "");
        let found = units.iter().find(|u| {
            let label = unit_label(u);
            fold(&label).replace([' ', '_', '-'], "") == wanted
        });
        if let Some(unit) = found {
            return unit.index;
        }
    }

    let folded_name = fold(name);
    units
        .iter()
        .find(|u| fold(&u.text).contains(&folded_name))
        .or_else(|| units.first())
        .map(|u| u.index)
        .unwrap_or(0)
}

/// Label sent to the backend for a unit: its code, or its 1-based position.
pub fn unit_label(unit: &RequirementUnit) -> String {
    unit.code
        .clone()
        .unwrap_or_else(|| (unit.index + 1).to_string())
}

/// Serializes candidates back into the reply shape, for refinement prompts.
pub fn to_reply_document(candidates: &CandidateSet) -> ReplyDocument {
    ReplyDocument {
        classes: candidates
            .entities
            .iter()
            .map(|entity| ReplyClass {
                name: entity.name.clone(),
                attributes: entity
                    .attributes
                    .iter()
                    .map(|a| {
                        ReplyAttribute::Typed(TypedAttribute {
                            name: a.name.clone(),
                            type_name: a.type_name.clone(),
                        })
                    })
                    .collect(),
                relationships: Vec::new(),
                requirement: None,
                confidence: None,
            })
            .collect(),
        relationships: candidates
            .relationships
            .iter()
            .map(|rel| ReplyRelationship {
                source: Some(rel.source.clone()),
                target: rel.target.clone(),
                kind: Some(rel.kind.as_str().to_string()),
                label: rel.label.clone(),
                source_multiplicity: rel.multiplicity.source.clone(),
                target_multiplicity: rel.multiplicity.target.clone(),
                multiplicity: None,
                requirement: None,
            })
            .collect(),
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(120).collect();
    if text.chars().count() > 120 {
        preview.push('…');
    }
    preview
}
