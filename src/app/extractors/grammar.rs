use crate::domain::model::{
    CandidateAttribute, CandidateEntity, CandidateRelationship, CandidateSet, Extraction,
    ExtractionStage, Provenance, RelationshipKind, RequirementUnit, StrategyKind,
};
use crate::domain::ports::ExtractionProvider;
use crate::nlp::chunker::{Chunk, Chunker, Marker, NounPhrase};
use crate::nlp::lexicon::{LanguageModel, LanguageModels, Quantity, VerbClass, VerbForm};
use crate::nlp::tagger::Tagger;
use crate::nlp::Language;
use crate::utils::error::ExtractionError;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;

/// Deterministic extraction from noun phrases and verb patterns.
/// Never fails: a unit with no recognisable structure yields no candidates.
pub struct GrammarExtractor {
    models: Arc<LanguageModels>,
    /// `None` detects the language from the input.
    language: Option<Language>,
}

impl GrammarExtractor {
    pub fn new(models: Arc<LanguageModels>, language: Option<Language>) -> Self {
        Self { models, language }
    }

    pub fn language_for(&self, units: &[RequirementUnit]) -> Language {
        Language::resolve(self.language, units)
    }

    pub fn extract_units(&self, units: &[RequirementUnit]) -> CandidateSet {
        let language = self.language_for(units);
        let model = self.models.get(language);
        let mut candidates = CandidateSet::default();

        for unit in units {
            let found = UnitAnalysis::new(&model, unit.index).run(&unit.text);
            tracing::debug!(
                "🔎 Unit {} ({}): {} entities, {} relationships",
                unit.index,
                unit.code.as_deref().unwrap_or("-"),
                found.entities.len(),
                found.relationships.len()
            );
            candidates.extend(found);
        }

        candidates
    }
}

#[async_trait]
impl ExtractionProvider for GrammarExtractor {
    fn strategy(&self) -> StrategyKind {
        StrategyKind::Grammar
    }

    async fn extract(
        &self,
        units: &[RequirementUnit],
    ) -> std::result::Result<Extraction, ExtractionError> {
        let candidates = self.extract_units(units);
        tracing::info!(
            "🧩 Grammar extraction: {} entities, {} relationships from {} units",
            candidates.entities.len(),
            candidates.relationships.len(),
            units.len()
        );
        Ok(Extraction::new(candidates, ExtractionStage::Grammar))
    }
}

/// An entity mentioned in the current clause.
#[derive(Debug, Clone)]
struct EntityRef {
    key: String,
    name: String,
    multiplicity: Option<String>,
}

#[derive(Debug, Clone)]
enum Mode {
    Idle,
    Relation(String),
    Possession(String),
    Provision,
    Attributes(EntityRef),
    Generalization,
    Composition,
    PartOf,
}

/// Clause state machine over the chunks of one requirement unit.
struct UnitAnalysis<'m> {
    model: &'m LanguageModel,
    provenance: Provenance,
    entities: IndexMap<String, CandidateEntity>,
    relationships: Vec<CandidateRelationship>,
    subject: Option<EntityRef>,
    last: Option<EntityRef>,
    mode: Mode,
}

impl<'m> UnitAnalysis<'m> {
    fn new(model: &'m LanguageModel, unit: usize) -> Self {
        Self {
            model,
            provenance: Provenance {
                unit,
                strategy: StrategyKind::Grammar,
            },
            entities: IndexMap::new(),
            relationships: Vec::new(),
            subject: None,
            last: None,
            mode: Mode::Idle,
        }
    }

    fn run(mut self, text: &str) -> CandidateSet {
        let tokens = Tagger::new(self.model).tag(text);
        let chunks = Chunker::new(self.model).chunk(&tokens);

        for (i, chunk) in chunks.iter().enumerate() {
            let next = chunks.get(i + 1);
            let prev = chunks[..i]
                .iter()
                .rev()
                .find(|c| !matches!(c, Chunk::Separator(',')));

            match chunk {
                Chunk::Noun(np) => self.noun(np, next),
                Chunk::Possessive { attribute, owner } => {
                    if let Some(owner) = self.entity(owner) {
                        self.attribute(&owner, attribute);
                        self.last = Some(owner);
                    }
                }
                Chunk::Verb { lemma, class, .. } => {
                    self.mode = match class {
                        VerbClass::Possession => Mode::Possession(lemma.clone()),
                        VerbClass::Provision => Mode::Provision,
                        VerbClass::Inheritance => Mode::Generalization,
                        VerbClass::Plain => Mode::Relation(lemma.clone()),
                    };
                }
                Chunk::Copula => self.mode = Mode::Idle,
                Chunk::Marker(marker) => {
                    self.mode = match marker {
                        Marker::Generalization => Mode::Generalization,
                        Marker::Composition => Mode::Composition,
                        Marker::PartOf => Mode::PartOf,
                    };
                }
                Chunk::Relative => {
                    // "produtos que possuem..." vs "permitir que o cliente..."
                    let after_noun =
                        matches!(prev, Some(Chunk::Noun(_)) | Some(Chunk::Possessive { .. }));
                    self.subject = if after_noun { self.last.clone() } else { None };
                    self.mode = Mode::Idle;
                }
                Chunk::Conjunction => {
                    if matches!(next, Some(Chunk::Verb { .. }) | Some(Chunk::Modal)) {
                        self.mode = Mode::Idle;
                    }
                }
                Chunk::Separator(':') => {
                    if let Some(owner) = self.last.clone() {
                        self.mode = Mode::Attributes(owner);
                    }
                }
                Chunk::Boundary => {
                    self.subject = None;
                    self.last = None;
                    self.mode = Mode::Idle;
                }
                Chunk::Separator(_)
                | Chunk::Modal
                | Chunk::Preposition(_)
                | Chunk::Pronoun
                | Chunk::Negation
                | Chunk::Other => {}
            }
        }

        CandidateSet {
            entities: self.entities.into_values().collect(),
            relationships: self.relationships,
        }
    }

    fn noun(&mut self, np: &NounPhrase, next: Option<&Chunk>) {
        let starts_clause = matches!(
            next,
            Some(Chunk::Modal)
                | Some(Chunk::Copula)
                | Some(Chunk::Marker(_))
                | Some(Chunk::Verb {
                    form: VerbForm::Finite | VerbForm::Infinitive,
                    ..
                })
        );
        let can_be_subject = np.preposition.is_none() || np.is_introduced_by(DATIVE);

        if starts_clause && can_be_subject {
            self.subject = self.entity(np);
            self.last = self.subject.clone();
            self.mode = Mode::Idle;
            return;
        }

        // "com nome e preço" describes the entity just mentioned
        if np.is_introduced_by(WITH) && self.model.is_attribute(&np.head) {
            if let Some(owner) = self.last.clone().or_else(|| self.subject.clone()) {
                self.attribute(&owner, np);
                self.mode = Mode::Attributes(owner);
            }
            return;
        }

        match self.mode.clone() {
            Mode::Attributes(owner) => self.attribute(&owner, np),
            Mode::Provision => {
                if let Some(subject) = self.subject.clone() {
                    if !self.model.is_stop_noun(&np.head) {
                        self.attribute(&subject, np);
                    }
                }
            }
            Mode::Possession(lemma) => {
                let many = np.plural
                    || matches!(np.quantity, Some(Quantity::Many))
                    || matches!(np.quantity, Some(Quantity::Exact(n)) if n > 1);
                match self.subject.clone() {
                    Some(subject) if self.model.is_attribute(&np.head) || !many => {
                        if !self.model.is_stop_noun(&np.head) {
                            self.attribute(&subject, np);
                        }
                    }
                    Some(subject) => {
                        if let Some(part) = self.entity(np) {
                            self.relate(&subject, &part, RelationshipKind::Composition, Some(&lemma));
                            self.last = Some(part);
                        }
                    }
                    None => self.mention(np),
                }
            }
            Mode::Relation(lemma) => match self.subject.clone() {
                Some(subject) if self.model.is_attribute(&np.head) => {
                    self.attribute(&subject, np)
                }
                Some(subject) => {
                    if let Some(target) = self.entity(np) {
                        self.relate(&subject, &target, RelationshipKind::Association, Some(&lemma));
                        self.last = Some(target);
                    }
                }
                None => self.mention(np),
            },
            Mode::Generalization => {
                if let (Some(subject), Some(parent)) = (self.subject.clone(), self.entity(np)) {
                    self.relate(&subject, &parent, RelationshipKind::Generalization, None);
                    self.last = Some(parent);
                }
                self.mode = Mode::Idle;
            }
            Mode::Composition => {
                if let (Some(subject), Some(part)) = (self.subject.clone(), self.entity(np)) {
                    self.relate(&subject, &part, RelationshipKind::Composition, None);
                    self.last = Some(part);
                }
            }
            Mode::PartOf => {
                if let (Some(subject), Some(whole)) = (self.subject.clone(), self.entity(np)) {
                    self.relate(&whole, &subject, RelationshipKind::Aggregation, None);
                    self.last = Some(whole);
                }
                self.mode = Mode::Idle;
            }
            Mode::Idle => self.mention(np),
        }
    }

    /// Registers a plain mention and makes it the most recent entity.
    fn mention(&mut self, np: &NounPhrase) {
        if let Some(entity) = self.entity(np) {
            self.last = Some(entity);
        }
    }

    /// Candidate entity for a noun phrase; generic nouns and attribute words
    /// never become classes.
    fn entity(&mut self, np: &NounPhrase) -> Option<EntityRef> {
        if self.model.is_stop_noun(&np.head) || self.model.is_attribute(&np.head) {
            return None;
        }
        let name = self.model.entity_name(&np.head);
        let key = self.model.plural_rules().identity_key(&name);
        let provenance = self.provenance;
        let entity = self
            .entities
            .entry(key.clone())
            .or_insert_with(|| CandidateEntity::new(name, provenance));
        Some(EntityRef {
            key,
            name: entity.name.clone(),
            multiplicity: np.multiplicity(),
        })
    }

    fn attribute(&mut self, owner: &EntityRef, np: &NounPhrase) {
        let name = np.text.to_lowercase();
        let folded = crate::core::text::fold(&name);
        let type_name = self.model.attribute_type(&np.head).map(str::to_string);
        if let Some(entity) = self.entities.get_mut(&owner.key) {
            if !entity
                .attributes
                .iter()
                .any(|a| crate::core::text::fold(&a.name) == folded)
            {
                entity.attributes.push(CandidateAttribute::new(name, type_name));
            }
        }
    }

    fn relate(
        &mut self,
        source: &EntityRef,
        target: &EntityRef,
        kind: RelationshipKind,
        label: Option<&str>,
    ) {
        let mut relationship = CandidateRelationship::new(
            source.name.clone(),
            target.name.clone(),
            kind,
            self.provenance,
        );
        if kind != RelationshipKind::Generalization {
            relationship = relationship.with_multiplicity(
                source.multiplicity.as_deref(),
                target.multiplicity.as_deref(),
            );
        }
        if let Some(label) = label {
            relationship = relationship.with_label(label);
        }
        relationship.recursive = source.key == target.key;
        self.relationships.push(relationship);
    }
}

const DATIVE: &[&str] = &["ao", "aos", "a", "as"];
const WITH: &[&str] = &["com", "with"];

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str, language: Language) -> CandidateSet {
        let extractor = GrammarExtractor::new(Arc::new(LanguageModels::load()), Some(language));
        extractor.extract_units(&[RequirementUnit::new(0, None, text)])
    }

    fn entity<'a>(set: &'a CandidateSet, name: &str) -> &'a CandidateEntity {
        set.entities
            .iter()
            .find(|e| e.name == name)
            .unwrap_or_else(|| panic!("no entity {} in {:?}", name, set.entities))
    }

    fn attribute_names(entity: &CandidateEntity) -> Vec<&str> {
        entity.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_provision_verb_yields_attributes() {
        let set = extract(
            "O cliente deve poder registar-se fornecendo nome, email e telefone.",
            Language::Pt,
        );
        let cliente = entity(&set, "Cliente");
        assert_eq!(attribute_names(cliente), vec!["nome", "email", "telefone"]);
        assert_eq!(cliente.confidence, None);
        assert_eq!(cliente.provenance.strategy, StrategyKind::Grammar);
        assert_eq!(set.entities.len(), 1);
    }

    #[test]
    fn test_plain_verb_yields_associations() {
        let set = extract(
            "O cliente pode adicionar produtos ao carrinho.",
            Language::Pt,
        );
        let to_product = set
            .relationships
            .iter()
            .find(|r| r.target == "Produto")
            .expect("Cliente -> Produto");
        assert_eq!(to_product.source, "Cliente");
        assert_eq!(to_product.kind, RelationshipKind::Association);
        assert_eq!(to_product.label.as_deref(), Some("adicionar"));
        assert_eq!(to_product.multiplicity.target.as_deref(), Some("0..*"));
        assert!(set.relationships.iter().any(|r| r.target == "Carrinho"));
    }

    #[test]
    fn test_possession_singular_is_attribute_plural_is_composition() {
        let set = extract(
            "Cada encomenda tem uma data e vários produtos.",
            Language::Pt,
        );
        let encomenda = entity(&set, "Encomenda");
        assert_eq!(attribute_names(encomenda), vec!["data"]);
        assert_eq!(encomenda.attributes[0].type_name.as_deref(), Some("Date"));

        let rel = &set.relationships[0];
        assert_eq!(rel.kind, RelationshipKind::Composition);
        assert_eq!(rel.source, "Encomenda");
        assert_eq!(rel.target, "Produto");
        assert_eq!(rel.multiplicity.source.as_deref(), Some("1"));
        assert_eq!(rel.multiplicity.target.as_deref(), Some("0..*"));
    }

    #[test]
    fn test_generalization() {
        let set = extract("O gerente é um tipo de funcionário.", Language::Pt);
        let rel = &set.relationships[0];
        assert_eq!(rel.kind, RelationshipKind::Generalization);
        assert_eq!(rel.source, "Gerente");
        assert_eq!(rel.target, "Funcionário");

        let set = extract("A manager is an employee.", Language::En);
        assert_eq!(set.relationships[0].kind, RelationshipKind::Generalization);
        assert_eq!(set.relationships[0].target, "Employee");
    }

    #[test]
    fn test_possessive_and_colon_list() {
        let set = extract("O gestor altera o preço do produto.", Language::Pt);
        assert_eq!(attribute_names(entity(&set, "Produto")), vec!["preço"]);

        let set = extract("Fornecedor: nome, NIF e morada.", Language::Pt);
        assert_eq!(
            attribute_names(entity(&set, "Fornecedor")),
            vec!["nome", "nif", "morada"]
        );
    }

    #[test]
    fn test_relative_clause_switches_subject() {
        let set = extract(
            "O gestor regista produtos que possuem um preço.",
            Language::Pt,
        );
        assert_eq!(attribute_names(entity(&set, "Produto")), vec!["preço"]);
        assert!(set
            .relationships
            .iter()
            .any(|r| r.source == "Gestor" && r.target == "Produto"));
    }

    #[test]
    fn test_generic_subject_is_ignored() {
        let set = extract(
            "O sistema deve permitir que o cliente consulte encomendas.",
            Language::Pt,
        );
        assert!(set.entities.iter().all(|e| e.name != "Sistema"));
        assert!(set
            .relationships
            .iter()
            .any(|r| r.source == "Cliente" && r.target == "Encomenda"));
    }

    #[test]
    fn test_recursive_relationship_is_flagged() {
        let set = extract(
            "Um funcionário supervisiona outros funcionários.",
            Language::Pt,
        );
        let rel = &set.relationships[0];
        assert_eq!(rel.source, rel.target);
        assert!(rel.recursive);
    }

    #[test]
    fn test_english_sentence() {
        let set = extract(
            "The customer places orders with a date and a total.",
            Language::En,
        );
        assert!(set
            .relationships
            .iter()
            .any(|r| r.source == "Customer" && r.target == "Order" && r.label.as_deref() == Some("place")));
        assert_eq!(attribute_names(entity(&set, "Order")), vec!["date", "total"]);
    }

    #[tokio::test]
    async fn test_provider_contract() {
        let extractor = GrammarExtractor::new(LanguageModels::global(), None);
        let units = vec![RequirementUnit::new(0, Some("RF01".into()), "   ")];
        let extraction = extractor.extract(&units).await.unwrap();
        assert!(extraction.candidates.is_empty());
        assert_eq!(extraction.produced_by, ExtractionStage::Grammar);
        assert_eq!(extractor.strategy(), StrategyKind::Grammar);
    }
}
