use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One atomic requirement statement produced by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementUnit {
    pub index: usize,
    pub code: Option<String>,
    pub text: String,
}

impl RequirementUnit {
    pub fn new(index: usize, code: Option<String>, text: impl Into<String>) -> Self {
        Self {
            index,
            code,
            text: text.into(),
        }
    }
}

/// 抽取策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Grammar,
    Generative,
    Hybrid,
}

impl StrategyKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "grammar" | "nlp" => Some(StrategyKind::Grammar),
            "generative" | "llm" => Some(StrategyKind::Generative),
            "hybrid" => Some(StrategyKind::Hybrid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Grammar => "grammar",
            StrategyKind::Generative => "generative",
            StrategyKind::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    Association,
    Aggregation,
    Composition,
    Generalization,
}

impl RelationshipKind {
    /// Accepts English and Portuguese spellings used by generation backends.
    pub fn parse(value: &str) -> Option<Self> {
        let folded: String = crate::core::text::fold(value);
        match folded.as_str() {
            "association" | "associacao" | "dependency" | "dependencia" | "uses" => {
                Some(RelationshipKind::Association)
            }
            "aggregation" | "agregacao" => Some(RelationshipKind::Aggregation),
            "composition" | "composicao" => Some(RelationshipKind::Composition),
            "generalization" | "generalizacao" | "inheritance" | "heranca" | "extends"
            | "is-a" | "is a" => Some(RelationshipKind::Generalization),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Association => "association",
            RelationshipKind::Aggregation => "aggregation",
            RelationshipKind::Composition => "composition",
            RelationshipKind::Generalization => "generalization",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which unit and which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub unit: usize,
    pub strategy: StrategyKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAttribute {
    pub name: String,
    pub type_name: Option<String>,
}

impl CandidateAttribute {
    pub fn new(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntity {
    pub name: String,
    pub attributes: Vec<CandidateAttribute>,
    pub provenance: Provenance,
    /// Only model-based strategies report a confidence.
    pub confidence: Option<f32>,
}

impl CandidateEntity {
    pub fn new(name: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            provenance,
            confidence: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, type_name: Option<&str>) -> Self {
        self.attributes
            .push(CandidateAttribute::new(name, type_name.map(str::to_string)));
        self
    }
}

/// Multiplicity at both ends; `None` means the text did not say.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplicityHint {
    pub source: Option<String>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRelationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
    pub label: Option<String>,
    pub multiplicity: MultiplicityHint,
    pub provenance: Provenance,
    /// Set when the text names the same entity at both ends.
    pub recursive: bool,
}

impl CandidateRelationship {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationshipKind,
        provenance: Provenance,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            label: None,
            multiplicity: MultiplicityHint::default(),
            provenance,
            recursive: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_multiplicity(mut self, source: Option<&str>, target: Option<&str>) -> Self {
        self.multiplicity = MultiplicityHint {
            source: source.map(str::to_string),
            target: target.map(str::to_string),
        };
        self
    }
}

/// 一次抽取的候選集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSet {
    pub entities: Vec<CandidateEntity>,
    pub relationships: Vec<CandidateRelationship>,
}

impl CandidateSet {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    pub fn extend(&mut self, other: CandidateSet) {
        self.entities.extend(other.entities);
        self.relationships.extend(other.relationships);
    }
}

/// Which stage actually produced an extraction result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStage {
    Grammar,
    Generative,
    HybridMerged,
    HybridStructuralOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub candidates: CandidateSet,
    pub produced_by: ExtractionStage,
    pub warnings: Vec<String>,
}

impl Extraction {
    pub fn new(candidates: CandidateSet, produced_by: ExtractionStage) -> Self {
        Self {
            candidates,
            produced_by,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainAttribute {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl DomainAttribute {
    pub fn display(&self) -> String {
        match &self.type_name {
            Some(type_name) => format!("{}: {}", self.name, type_name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainClass {
    pub id: ClassId,
    pub name: String,
    pub attributes: Vec<DomainAttribute>,
    pub sources: BTreeSet<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplicity {
    pub source: String,
    pub target: String,
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self {
            source: "1".to_string(),
            target: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRelationship {
    pub id: String,
    pub source: ClassId,
    pub target: ClassId,
    pub kind: RelationshipKind,
    pub multiplicity: Multiplicity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Canonical model for one pipeline run. Classes keep first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainModel {
    pub classes: IndexMap<ClassId, DomainClass>,
    pub relationships: Vec<DomainRelationship>,
}

impl DomainModel {
    pub fn class(&self, id: &ClassId) -> Option<&DomainClass> {
        self.classes.get(id)
    }

    pub fn class_by_name(&self, name: &str) -> Option<&DomainClass> {
        let key = crate::core::text::fold(name);
        self.classes
            .values()
            .find(|class| crate::core::text::fold(&class.name) == key)
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Ids referenced by a relationship but missing from the class map.
    pub fn dangling_references(&self) -> Vec<&ClassId> {
        self.relationships
            .iter()
            .flat_map(|rel| [&rel.source, &rel.target])
            .filter(|id| self.class(id).is_none())
            .collect()
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            classes: self.classes.len(),
            attributes: self.classes.values().map(|c| c.attributes.len()).sum(),
            relationships: self.relationships.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub classes: usize,
    pub attributes: usize,
    pub relationships: usize,
}
