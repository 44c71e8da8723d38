use crate::app::extractors::generative::GenerativeExtractor;
use crate::core::text::{fold, PluralRules};
use crate::domain::model::{
    CandidateSet, Extraction, ExtractionStage, RequirementUnit, StrategyKind,
};
use crate::domain::ports::ExtractionProvider;
use crate::nlp::{Language, LanguageModels};
use crate::utils::error::ExtractionError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Structural pass first, then a generative refinement seeded with its result.
pub struct HybridExtractor {
    structural: Arc<dyn ExtractionProvider>,
    refiner: Arc<GenerativeExtractor>,
    models: Arc<LanguageModels>,
    /// `None` detects the language from the input.
    language: Option<Language>,
    /// Replaces the language's plural rules when merging.
    rules: Option<PluralRules>,
}

impl HybridExtractor {
    pub fn new(
        structural: Arc<dyn ExtractionProvider>,
        refiner: Arc<GenerativeExtractor>,
        models: Arc<LanguageModels>,
    ) -> Self {
        Self {
            structural,
            refiner,
            models,
            language: None,
            rules: None,
        }
    }

    pub fn with_language(mut self, language: Option<Language>) -> Self {
        self.language = language;
        self
    }

    pub fn with_plural_rules(mut self, rules: Option<PluralRules>) -> Self {
        self.rules = rules;
        self
    }

    fn rules_for(&self, units: &[RequirementUnit]) -> PluralRules {
        match &self.rules {
            Some(rules) => rules.clone(),
            None => self
                .models
                .get(Language::resolve(self.language, units))
                .plural_rules()
                .clone(),
        }
    }
}

#[async_trait]
impl ExtractionProvider for HybridExtractor {
    fn strategy(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    async fn extract(
        &self,
        units: &[RequirementUnit],
    ) -> std::result::Result<Extraction, ExtractionError> {
        // 兩階段必須依序執行：精修需要結構骨架作為輸入
        let skeleton = self.structural.extract(units).await?;
        tracing::info!(
            "🦴 Structural skeleton ({}): {} entities, {} relationships",
            self.structural.strategy(),
            skeleton.candidates.entities.len(),
            skeleton.candidates.relationships.len()
        );

        match self.refiner.refine(units, &skeleton.candidates).await {
            Ok(refined) => {
                let merged = merge(&skeleton.candidates, refined, &self.rules_for(units));
                tracing::info!(
                    "🔀 Hybrid merge: {} entities, {} relationships",
                    merged.entities.len(),
                    merged.relationships.len()
                );
                let mut extraction = Extraction::new(merged, ExtractionStage::HybridMerged);
                extraction.warnings = skeleton.warnings;
                Ok(extraction)
            }
            Err(e) => {
                tracing::warn!(
                    "⚠️ Refinement via {} failed ({}), falling back to the structural result: {}",
                    self.refiner.backend_name(),
                    e.cause_name(),
                    e
                );
                let mut extraction =
                    Extraction::new(skeleton.candidates, ExtractionStage::HybridStructuralOnly);
                extraction.warnings = skeleton.warnings;
                extraction.warnings.push(format!(
                    "refinement stage failed ({}): {}; returning the structural result only",
                    e.cause_name(),
                    e
                ));
                Ok(extraction)
            }
        }
    }
}

/// Merges a refinement into its skeleton.
///
/// Entities in both are unioned and take the name of the side with more
/// attributes (ties keep the skeleton's). Refinement-only entities survive
/// when they have an attribute or take part in a relationship.
pub fn merge(skeleton: &CandidateSet, refinement: CandidateSet, rules: &PluralRules) -> CandidateSet {
    let mut merged = skeleton.clone();
    let mut index: HashMap<String, usize> = HashMap::new();
    for (i, entity) in merged.entities.iter().enumerate() {
        index.entry(rules.identity_key(&entity.name)).or_insert(i);
    }

    let endpoints: HashSet<String> = skeleton
        .relationships
        .iter()
        .chain(refinement.relationships.iter())
        .flat_map(|r| [rules.identity_key(&r.source), rules.identity_key(&r.target)])
        .collect();

    for entity in refinement.entities {
        let key = rules.identity_key(&entity.name);
        match index.get(&key) {
            Some(&i) => {
                let existing = &mut merged.entities[i];
                let refined_is_richer = entity.attributes.len() > existing.attributes.len();
                for attribute in &entity.attributes {
                    let folded = fold(&attribute.name);
                    match existing
                        .attributes
                        .iter_mut()
                        .find(|a| fold(&a.name) == folded)
                    {
                        Some(known) => {
                            if known.type_name.is_none() {
                                known.type_name = attribute.type_name.clone();
                            }
                        }
                        None => existing.attributes.push(attribute.clone()),
                    }
                }
                if refined_is_richer {
                    existing.name = entity.name.clone();
                }
                existing.confidence = entity.confidence.or(existing.confidence);
            }
            None => {
                if entity.attributes.is_empty() && !endpoints.contains(&key) {
                    tracing::debug!("Dropping bare refinement entity '{}'", entity.name);
                    continue;
                }
                index.insert(key, merged.entities.len());
                merged.entities.push(entity);
            }
        }
    }

    let mut seen: HashSet<(String, String, _)> = merged
        .relationships
        .iter()
        .map(|r| (rules.identity_key(&r.source), rules.identity_key(&r.target), r.kind))
        .collect();
    for rel in refinement.relationships {
        let key = (rules.identity_key(&rel.source), rules.identity_key(&rel.target), rel.kind);
        if seen.insert(key) {
            merged.relationships.push(rel);
        }
    }

    merged
}
