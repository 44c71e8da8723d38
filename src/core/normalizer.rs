//! Merges candidates from every unit into one canonical `DomainModel`.

use crate::core::text::{slug, PluralRules};
use crate::domain::model::{
    CandidateRelationship, CandidateSet, ClassId, DomainAttribute, DomainClass, DomainModel,
    DomainRelationship, Multiplicity, RelationshipKind,
};
use crate::utils::error::{Req2DomError, Result};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: PluralRules,
}

/// Class under construction, keyed by identity key.
struct ClassDraft {
    name: String,
    attributes: Vec<DomainAttribute>,
    attribute_keys: HashSet<String>,
    sources: BTreeSet<usize>,
    first_seen: usize,
}

impl ClassDraft {
    fn new(name: &str, first_seen: usize) -> Self {
        Self {
            name: name.trim().to_string(),
            attributes: Vec::new(),
            attribute_keys: HashSet::new(),
            sources: BTreeSet::new(),
            first_seen,
        }
    }

    fn min_source(&self) -> usize {
        self.sources.iter().next().copied().unwrap_or(usize::MAX)
    }
}

struct RelationshipDraft {
    source: String,
    target: String,
    kind: RelationshipKind,
    source_multiplicity: Option<String>,
    target_multiplicity: Option<String>,
    label: Option<String>,
}

impl Normalizer {
    pub fn new(rules: PluralRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PluralRules {
        &self.rules
    }

    /// Pure function of its input: the same candidates always give the same model.
    pub fn normalize(&self, candidates: &CandidateSet) -> Result<DomainModel> {
        let mut drafts: IndexMap<String, ClassDraft> = IndexMap::new();

        // 1+2. 實體識別與屬性合併，依需求順序處理
        let mut entities: Vec<_> = candidates.entities.iter().collect();
        entities.sort_by_key(|e| e.provenance.unit);
        for entity in entities {
            let key = self.rules.identity_key(&entity.name);
            if key.is_empty() {
                continue;
            }
            let next = drafts.len();
            let draft = drafts
                .entry(key)
                .or_insert_with(|| ClassDraft::new(&entity.name, next));
            draft.sources.insert(entity.provenance.unit);

            for attribute in &entity.attributes {
                let name = attribute.name.trim();
                let attribute_key = self.rules.identity_key(name);
                if attribute_key.is_empty() {
                    continue;
                }
                if draft.attribute_keys.insert(attribute_key) {
                    draft.attributes.push(DomainAttribute {
                        name: name.to_string(),
                        type_name: attribute.type_name.clone(),
                    });
                } else if let Some(existing) = draft
                    .attributes
                    .iter_mut()
                    .find(|a| self.rules.identity_key(&a.name) == self.rules.identity_key(name))
                {
                    if existing.type_name.is_none() {
                        existing.type_name = attribute.type_name.clone();
                    }
                }
            }
        }

        // 3+4. 關係端點重新指向，孤立端點補成最小類別
        let mut relationships: Vec<&CandidateRelationship> =
            candidates.relationships.iter().collect();
        relationships.sort_by_key(|r| r.provenance.unit);

        let mut merged: IndexMap<(String, String, RelationshipKind), RelationshipDraft> =
            IndexMap::new();
        for rel in relationships {
            let source = self.rules.identity_key(&rel.source);
            let target = self.rules.identity_key(&rel.target);
            if source.is_empty() || target.is_empty() {
                continue;
            }
            if source == target && !rel.recursive {
                tracing::debug!("Dropping self-relationship on '{}'", rel.source);
                continue;
            }

            for (key, name) in [(&source, &rel.source), (&target, &rel.target)] {
                let next = drafts.len();
                let draft = drafts.entry(key.clone()).or_insert_with(|| {
                    tracing::debug!("Materializing class '{}' from a relationship", name);
                    ClassDraft::new(name, next)
                });
                draft.sources.insert(rel.provenance.unit);
            }

            let label = rel
                .label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            merged
                .entry((source.clone(), target.clone(), rel.kind))
                .and_modify(|existing| {
                    existing.source_multiplicity = more_specific(
                        existing.source_multiplicity.take(),
                        rel.multiplicity.source.clone(),
                    );
                    existing.target_multiplicity = more_specific(
                        existing.target_multiplicity.take(),
                        rel.multiplicity.target.clone(),
                    );
                    if existing.label.is_none() {
                        existing.label = label.clone();
                    }
                })
                .or_insert_with(|| RelationshipDraft {
                    source,
                    target,
                    kind: rel.kind,
                    source_multiplicity: clean(rel.multiplicity.source.clone()),
                    target_multiplicity: clean(rel.multiplicity.target.clone()),
                    label,
                });
        }

        if drafts.is_empty() {
            return Err(Req2DomError::EmptyModel);
        }

        // 依首次出現的需求排序，同一需求內保持首見順序
        drafts.sort_by(|_, a, _, b| {
            (a.min_source(), a.first_seen).cmp(&(b.min_source(), b.first_seen))
        });

        let mut ids: HashMap<String, ClassId> = HashMap::new();
        let mut used: HashSet<String> = HashSet::new();
        let mut classes = IndexMap::new();
        for (key, draft) in drafts {
            let id = unique_id(&draft.name, &mut used);
            ids.insert(key, id.clone());
            classes.insert(
                id.clone(),
                DomainClass {
                    id,
                    name: draft.name,
                    attributes: draft.attributes,
                    sources: draft.sources,
                },
            );
        }

        let relationships = merged
            .into_values()
            .filter_map(|draft| {
                let source = ids.get(&draft.source)?.clone();
                let target = ids.get(&draft.target)?.clone();
                let defaults = Multiplicity::default();
                Some(DomainRelationship {
                    id: relationship_id(&source, &target, draft.kind),
                    source,
                    target,
                    kind: draft.kind,
                    multiplicity: Multiplicity {
                        source: draft.source_multiplicity.unwrap_or(defaults.source),
                        target: draft.target_multiplicity.unwrap_or(defaults.target),
                    },
                    label: draft.label,
                })
            })
            .collect();

        let model = DomainModel {
            classes,
            relationships,
        };
        let stats = model.stats();
        tracing::info!(
            "🧹 Normalized model: {} classes, {} attributes, {} relationships",
            stats.classes,
            stats.attributes,
            stats.relationships
        );
        Ok(model)
    }
}

fn unique_id(name: &str, used: &mut HashSet<String>) -> ClassId {
    let base = format!("class-{}", slug(name));
    let mut id = base.clone();
    let mut counter = 2;
    while !used.insert(id.clone()) {
        id = format!("{}-{}", base, counter);
        counter += 1;
    }
    ClassId(id)
}

/// `slug` never emits `.`, so joining the class fragments with it keeps
/// distinct pairs apart (`item`+`pedido-cliente` vs `item-pedido`+`cliente`).
fn relationship_id(source: &ClassId, target: &ClassId, kind: RelationshipKind) -> String {
    let fragment = |id: &ClassId| {
        let id = id.as_str();
        id.strip_prefix("class-").unwrap_or(id).to_string()
    };
    format!("rel.{}.{}.{}", fragment(source), fragment(target), kind)
}

fn clean(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// No value < the default "1" < anything explicit. Ties keep the first.
fn more_specific(current: Option<String>, candidate: Option<String>) -> Option<String> {
    let rank = |v: &Option<String>| match v.as_deref() {
        None => 0,
        Some("1") => 1,
        Some(_) => 2,
    };
    let candidate = clean(candidate);
    if rank(&candidate) > rank(&current) {
        candidate
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CandidateEntity, Provenance, StrategyKind};

    fn prov(unit: usize) -> Provenance {
        Provenance {
            unit,
            strategy: StrategyKind::Grammar,
        }
    }

    fn sample() -> CandidateSet {
        CandidateSet {
            entities: vec![
                CandidateEntity::new("Livro", prov(1))
                    .with_attribute("título", Some("String"))
                    .with_attribute("ISBN", None),
                CandidateEntity::new("livros", prov(2)).with_attribute("Titulo", None),
                CandidateEntity::new("Livraria", prov(0)).with_attribute("nome", None),
            ],
            relationships: vec![
                CandidateRelationship::new("Livraria", "livros", RelationshipKind::Association, prov(0)),
                CandidateRelationship::new("Livraria", "Livro", RelationshipKind::Association, prov(1))
                    .with_multiplicity(Some("1"), Some("0..*"))
                    .with_label("vende"),
                CandidateRelationship::new("Livro", "Autor", RelationshipKind::Association, prov(2)),
                CandidateRelationship::new("Livro", "Livros", RelationshipKind::Association, prov(2)),
            ],
        }
    }

    #[test]
    fn test_identity_resolution_and_attribute_merge() {
        let model = Normalizer::default().normalize(&sample()).unwrap();

        let names: Vec<&str> = model.classes.values().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Livraria", "Livro", "Autor"]);

        let livro = model.class_by_name("livro").unwrap();
        assert_eq!(livro.id.as_str(), "class-livro");
        let attributes: Vec<String> = livro.attributes.iter().map(|a| a.display()).collect();
        assert_eq!(attributes, vec!["título: String", "ISBN"]);
        // relationship mentions count as sources too
        assert_eq!(livro.sources, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn test_relationship_merge_keeps_specific_multiplicity() {
        let model = Normalizer::default().normalize(&sample()).unwrap();

        let sells: Vec<_> = model
            .relationships
            .iter()
            .filter(|r| r.source.as_str() == "class-livraria")
            .collect();
        assert_eq!(sells.len(), 1);
        assert_eq!(sells[0].id, "rel.livraria.livro.association");
        assert_eq!(sells[0].multiplicity.target, "0..*");
        assert_eq!(sells[0].multiplicity.source, "1");
        assert_eq!(sells[0].label.as_deref(), Some("vende"));
    }

    #[test]
    fn test_orphans_materialized_and_self_loops_dropped() {
        let model = Normalizer::default().normalize(&sample()).unwrap();

        let autor = model.class_by_name("Autor").unwrap();
        assert!(autor.attributes.is_empty());
        assert!(model.dangling_references().is_empty());
        assert!(model.relationships.iter().all(|r| r.source != r.target));
        assert_eq!(model.relationships.len(), 2);
    }

    #[test]
    fn test_recursive_relationship_kept() {
        let mut rel =
            CandidateRelationship::new("Funcionário", "funcionários", RelationshipKind::Association, prov(0));
        rel.recursive = true;
        let set = CandidateSet {
            entities: vec![],
            relationships: vec![rel],
        };
        let model = Normalizer::default().normalize(&set).unwrap();
        assert_eq!(model.classes.len(), 1);
        assert_eq!(model.relationships[0].source, model.relationships[0].target);
    }

    #[test]
    fn test_idempotent() {
        let normalizer = Normalizer::default();
        let first = normalizer.normalize(&sample()).unwrap();
        let second = normalizer.normalize(&sample()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_model() {
        let err = Normalizer::default()
            .normalize(&CandidateSet::default())
            .unwrap_err();
        assert!(matches!(err, Req2DomError::EmptyModel));

        let blank = CandidateSet {
            entities: vec![CandidateEntity::new("   ", prov(0))],
            relationships: vec![],
        };
        assert!(Normalizer::default().normalize(&blank).is_err());
    }

    #[test]
    fn test_colliding_slugs_get_counters() {
        let set = CandidateSet {
            entities: vec![
                CandidateEntity::new("Item-Pedido", prov(0)),
                CandidateEntity::new("Item Pedido", prov(0)),
            ],
            relationships: vec![],
        };
        let model = Normalizer::default().normalize(&set).unwrap();
        let ids: Vec<&str> = model.classes.keys().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["class-item-pedido", "class-item-pedido-2"]);
    }

    #[test]
    fn test_overlapping_compound_names_keep_distinct_relationship_ids() {
        let set = CandidateSet {
            entities: vec![],
            relationships: vec![
                CandidateRelationship::new("Item", "Pedido Cliente", RelationshipKind::Association, prov(0)),
                CandidateRelationship::new("Item Pedido", "Cliente", RelationshipKind::Association, prov(1)),
            ],
        };
        let model = Normalizer::default().normalize(&set).unwrap();

        let ids: Vec<&str> = model.relationships.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "rel.item.pedido-cliente.association",
                "rel.item-pedido.cliente.association"
            ]
        );
    }
}
