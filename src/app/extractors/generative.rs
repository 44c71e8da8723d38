use crate::app::extractors::reply::{parse_reply, to_reply_document, unit_label};
use crate::domain::model::{CandidateSet, Extraction, ExtractionStage, RequirementUnit, StrategyKind};
use crate::domain::ports::{ExtractionProvider, GenerationBackend};
use crate::utils::error::ExtractionError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_MAX_UNITS_PER_REQUEST: usize = 20;
pub const DEFAULT_MAX_CHARS_PER_REQUEST: usize = 6000;

/// When the requirements exceed either limit they are sent in several requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_units: usize,
    pub max_chars: usize,
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            max_units: DEFAULT_MAX_UNITS_PER_REQUEST,
            max_chars: DEFAULT_MAX_CHARS_PER_REQUEST,
        }
    }
}

const INSTRUCTION: &str = "You are a software analyst. Read the requirements below and extract \
the domain classes of the system they describe, the attributes of each class and the \
relationships between classes. Use singular class names in the language of the requirements \
and leave out the system itself.";

const REFINE_INSTRUCTION: &str = "A rule-based analysis already extracted the domain model \
below from the same requirements. Keep what is correct, add missing classes, attributes and \
relationships, fix wrong relationship kinds and multiplicities, and return the complete model.";

const REPLY_SHAPE: &str = r#"Answer with JSON only, exactly in this shape:
{
  "classes": [
    {"name": "ClassName", "requirement": "RF01",
     "attributes": [{"name": "attributeName", "type": "String"}]}
  ],
  "relationships": [
    {"source": "ClassName", "target": "OtherClass",
     "kind": "association | aggregation | composition | generalization",
     "label": "verb", "source_multiplicity": "1", "target_multiplicity": "0..*",
     "requirement": "RF01"}
  ]
}"#;

/// Extraction through a text-generation backend.
pub struct GenerativeExtractor {
    backend: Arc<dyn GenerationBackend>,
    limits: BatchLimits,
}

impl GenerativeExtractor {
    pub fn new(backend: Arc<dyn GenerationBackend>, limits: BatchLimits) -> Self {
        Self { backend, limits }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Greedy batching in unit order. A single oversized unit gets its own batch.
    pub fn batches<'a>(&self, units: &'a [RequirementUnit]) -> Vec<&'a [RequirementUnit]> {
        let mut batches = Vec::new();
        let mut start = 0;
        let mut chars = 0;

        for (i, unit) in units.iter().enumerate() {
            let len = unit.text.chars().count();
            let count = i - start;
            if count > 0 && (count >= self.limits.max_units || chars + len > self.limits.max_chars)
            {
                batches.push(&units[start..i]);
                start = i;
                chars = 0;
            }
            chars += len;
        }
        if start < units.len() {
            batches.push(&units[start..]);
        }
        batches
    }

    pub fn prompt(units: &[RequirementUnit]) -> String {
        format!(
            "{}\n\n{}\n\nRequirements:\n{}",
            INSTRUCTION,
            REPLY_SHAPE,
            requirement_lines(units)
        )
    }

    pub fn refinement_prompt(units: &[RequirementUnit], skeleton: &CandidateSet) -> String {
        let skeleton_json = serde_json::to_string_pretty(&to_reply_document(skeleton))
            .unwrap_or_else(|_| "{}".to_string());
        format!(
            "{}\n\n{}\n\n{}\n\nCurrent model:\n{}\n\nRequirements:\n{}",
            INSTRUCTION,
            REFINE_INSTRUCTION,
            REPLY_SHAPE,
            skeleton_json,
            requirement_lines(units)
        )
    }

    /// Refines a structural skeleton instead of starting from nothing.
    pub async fn refine(
        &self,
        units: &[RequirementUnit],
        skeleton: &CandidateSet,
    ) -> std::result::Result<CandidateSet, ExtractionError> {
        let mut candidates = CandidateSet::default();
        for batch in self.batches(units) {
            let batch_skeleton = skeleton_for(batch, skeleton);
            let prompt = Self::refinement_prompt(batch, &batch_skeleton);
            candidates.extend(self.call(batch, &prompt).await?);
        }
        Ok(candidates)
    }

    async fn call(
        &self,
        batch: &[RequirementUnit],
        prompt: &str,
    ) -> std::result::Result<CandidateSet, ExtractionError> {
        let started = Instant::now();
        tracing::info!(
            "🤖 Calling {} (model {}) with {} units",
            self.backend.name(),
            self.backend.model(),
            batch.len()
        );
        let reply = self.backend.generate(prompt).await?;
        tracing::info!(
            "📨 {} replied with {} chars in {:.2?}",
            self.backend.name(),
            reply.len(),
            started.elapsed()
        );
        tracing::debug!("Raw reply: {}", reply);

        parse_reply(&reply, batch)
    }
}

#[async_trait]
impl ExtractionProvider for GenerativeExtractor {
    fn strategy(&self) -> StrategyKind {
        StrategyKind::Generative
    }

    async fn extract(
        &self,
        units: &[RequirementUnit],
    ) -> std::result::Result<Extraction, ExtractionError> {
        let mut candidates = CandidateSet::default();
        let batches = self.batches(units);
        if batches.len() > 1 {
            tracing::info!("📦 Requirements split into {} requests", batches.len());
        }
        for batch in batches {
            candidates.extend(self.call(batch, &Self::prompt(batch)).await?);
        }
        Ok(Extraction::new(candidates, ExtractionStage::Generative))
    }
}

fn requirement_lines(units: &[RequirementUnit]) -> String {
    units
        .iter()
        .map(|unit| format!("Requirement {}: {}", unit_label(unit), unit.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Skeleton candidates that came from the units of one batch.
fn skeleton_for(batch: &[RequirementUnit], skeleton: &CandidateSet) -> CandidateSet {
    let in_batch = |unit: usize| batch.iter().any(|u| u.index == unit);
    CandidateSet {
        entities: skeleton
            .entities
            .iter()
            .filter(|e| in_batch(e.provenance.unit))
            .cloned()
            .collect(),
        relationships: skeleton
            .relationships
            .iter()
            .filter(|r| in_batch(r.provenance.unit))
            .cloned()
            .collect(),
    }
}
