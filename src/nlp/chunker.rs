//! Groups tagged tokens into noun phrases, verb groups and structural markers.

use crate::nlp::lexicon::{LanguageModel, Quantity, VerbClass, VerbForm};
use crate::nlp::tagger::{Tag, Token};
use crate::nlp::Language;

#[derive(Debug, Clone, PartialEq)]
pub struct NounPhrase {
    /// Every word of the phrase, modifiers included, as written.
    pub text: String,
    /// Naming head, including `de` compounds (`data de nascimento`).
    pub head: String,
    /// Folded preposition or contraction that introduced the phrase.
    pub preposition: Option<String>,
    pub quantity: Option<Quantity>,
    pub plural: bool,
    pub determined: bool,
}

impl NounPhrase {
    /// Multiplicity implied by the phrase: explicit quantities first, then plurality.
    pub fn multiplicity(&self) -> Option<String> {
        match self.quantity {
            Some(q) => Some(q.multiplicity()),
            None if self.plural => Some("0..*".to_string()),
            None => None,
        }
    }

    pub fn is_introduced_by(&self, words: &[&str]) -> bool {
        self.preposition
            .as_deref()
            .map(|p| words.contains(&p))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// é um, é um tipo de, is a kind of
    Generalization,
    /// é composto por, consists of
    Composition,
    /// faz parte de, is part of
    PartOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Noun(NounPhrase),
    /// `nome do cliente`, `customer's name`
    Possessive {
        attribute: NounPhrase,
        owner: NounPhrase,
    },
    Verb {
        lemma: String,
        class: VerbClass,
        form: VerbForm,
    },
    Modal,
    Copula,
    Marker(Marker),
    Relative,
    Conjunction,
    Preposition(String),
    Pronoun,
    Negation,
    Separator(char),
    Boundary,
    Other,
}

const TYPE_WORDS: &[&str] = &[
    "tipo", "tipos", "especie", "especies", "subtipo", "subtipos", "subclasse", "type", "types",
    "kind", "kinds", "subtype", "subclass", "sort",
];

const OF_WORDS: &[&str] = &["de", "do", "da", "dos", "das", "of"];

const COMPOSITION_WORDS: &[&str] = &[
    "composto",
    "composta",
    "compostos",
    "compostas",
    "constituido",
    "constituida",
    "constituidos",
    "constituidas",
    "formado",
    "formada",
    "formados",
    "formadas",
    "composed",
    "comprised",
    "consists",
    "consist",
    "consisting",
    "made",
];

const COMPOSITION_PREPS: &[&str] = &[
    "por", "pelo", "pela", "pelos", "pelas", "de", "do", "da", "dos", "das", "of", "up",
];

const PART_WORDS: &[&str] = &["parte", "part"];

const POSSESSIVE_LINKS: &[&str] = &["do", "da", "dos", "das", "of"];

pub struct Chunker<'a> {
    model: &'a LanguageModel,
}

impl<'a> Chunker<'a> {
    pub fn new(model: &'a LanguageModel) -> Self {
        Self { model }
    }

    pub fn chunk(&self, tokens: &[Token]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            if let Some((marker, next)) = self.marker_at(tokens, i) {
                chunks.push(marker);
                i = next;
                continue;
            }

            let token = &tokens[i];
            if matches!(
                token.tag,
                Tag::Det | Tag::Num | Tag::Noun | Tag::Adj | Tag::Prep | Tag::Contraction
            ) {
                if let Some((chunk, next)) = self.noun_chunk_at(tokens, i) {
                    chunks.push(chunk);
                    i = next;
                    continue;
                }
            }

            chunks.push(match token.tag {
                Tag::Verb => Chunk::Verb {
                    lemma: token.lemma.clone().unwrap_or_else(|| token.folded.clone()),
                    class: token.verb_class.unwrap_or(VerbClass::Plain),
                    form: token.verb_form.unwrap_or(VerbForm::Finite),
                },
                Tag::Modal => Chunk::Modal,
                Tag::Copula => Chunk::Copula,
                Tag::Relative => Chunk::Relative,
                Tag::Conj => Chunk::Conjunction,
                Tag::Pronoun => Chunk::Pronoun,
                Tag::Negation => Chunk::Negation,
                Tag::Prep | Tag::Contraction => Chunk::Preposition(token.folded.clone()),
                Tag::Punct if token.is_boundary() => Chunk::Boundary,
                Tag::Punct if token.is_punct(',') => Chunk::Separator(','),
                Tag::Punct if token.is_punct(':') => Chunk::Separator(':'),
                _ => Chunk::Other,
            });
            i += 1;
        }

        chunks
    }

    fn marker_at(&self, tokens: &[Token], i: usize) -> Option<(Chunk, usize)> {
        let word = |k: usize| tokens.get(k).map(|t| t.folded.as_str()).unwrap_or("");
        let token = &tokens[i];

        // faz parte de / is part of / is a part of
        if PART_WORDS.contains(&word(i)) && OF_WORDS.contains(&word(i + 1)) {
            return Some((Chunk::Marker(Marker::PartOf), i + 1));
        }
        if token.tag == Tag::Det
            && PART_WORDS.contains(&word(i + 1))
            && OF_WORDS.contains(&word(i + 2))
        {
            return Some((Chunk::Marker(Marker::PartOf), i + 2));
        }

        if COMPOSITION_WORDS.contains(&word(i)) && COMPOSITION_PREPS.contains(&word(i + 1)) {
            // made up of
            let next = if word(i + 1) == "up" { i + 2 } else { i + 1 };
            return Some((Chunk::Marker(Marker::Composition), next));
        }

        if token.tag != Tag::Copula {
            return None;
        }
        let next = tokens.get(i + 1)?;

        // is a type of / é um tipo de
        if next.tag == Tag::Det
            && TYPE_WORDS.contains(&word(i + 2))
            && OF_WORDS.contains(&word(i + 3))
        {
            return Some((Chunk::Marker(Marker::Generalization), i + 4));
        }
        // são tipos de / é do tipo
        if TYPE_WORDS.contains(&word(i + 1)) && OF_WORDS.contains(&word(i + 2)) {
            return Some((Chunk::Marker(Marker::Generalization), i + 3));
        }
        if word(i + 1) == "do" && TYPE_WORDS.contains(&word(i + 2)) {
            return Some((Chunk::Marker(Marker::Generalization), i + 3));
        }
        // é um X / is an X: the determiner stays with the phrase
        if next.tag == Tag::Det && next.quantity == Some(Quantity::One) {
            return Some((Chunk::Marker(Marker::Generalization), i + 1));
        }
        None
    }

    fn noun_chunk_at(&self, tokens: &[Token], i: usize) -> Option<(Chunk, usize)> {
        let (phrase, next) = self.noun_phrase_at(tokens, i)?;

        // customer's name
        if tokens.get(next).map(|t| t.tag) == Some(Tag::Possessive) {
            if let Some((attribute, end)) = self.noun_phrase_at(tokens, next + 1) {
                return Some((
                    Chunk::Possessive {
                        attribute,
                        owner: phrase,
                    },
                    end,
                ));
            }
        }

        // nome do cliente / name of the customer
        if self.model.is_attribute(&phrase.head) {
            if let Some(link) = tokens.get(next) {
                let linked = POSSESSIVE_LINKS.contains(&link.folded.as_str())
                    || (link.folded == "de"
                        && tokens.get(next + 1).map(|t| t.tag) == Some(Tag::Det));
                if linked {
                    if let Some((owner, end)) = self.noun_phrase_at(tokens, next) {
                        if !self.model.is_attribute(&owner.head) {
                            return Some((
                                Chunk::Possessive {
                                    attribute: phrase,
                                    owner,
                                },
                                end,
                            ));
                        }
                    }
                }
            }
        }

        Some((Chunk::Noun(phrase), next))
    }

    /// Preposition? determiners* adjectives* nouns+ (de noun)* adjectives*
    fn noun_phrase_at(&self, tokens: &[Token], start: usize) -> Option<(NounPhrase, usize)> {
        let mut j = start;
        let mut preposition = None;
        let mut quantity = None;
        let mut plural = false;
        let mut determined = false;
        let mut words: Vec<&str> = Vec::new();

        if let Some(t) = tokens.get(j) {
            if matches!(t.tag, Tag::Prep | Tag::Contraction) {
                preposition = Some(t.folded.clone());
                determined = t.tag == Tag::Contraction;
                plural = t.plural;
                j += 1;
            }
        }

        while let Some(t) = tokens.get(j) {
            if !matches!(t.tag, Tag::Det | Tag::Num) {
                break;
            }
            quantity = t.quantity.or(quantity);
            plural |= t.plural;
            determined = true;
            j += 1;
        }

        while let Some(t) = tokens.get(j) {
            if t.tag != Tag::Adj {
                break;
            }
            words.push(&t.surface);
            j += 1;
        }

        let first_noun = tokens.get(j).filter(|t| t.tag == Tag::Noun)?;
        let mut head_words: Vec<&str> = vec![&first_noun.surface];
        let mut head_plural = first_noun.plural;
        words.push(&first_noun.surface);
        j += 1;

        match self.model.language {
            Language::En => {
                // compound nouns: the last one carries number
                while let Some(t) = tokens.get(j).filter(|t| t.tag == Tag::Noun) {
                    head_words.push(&t.surface);
                    words.push(&t.surface);
                    head_plural = t.plural;
                    j += 1;
                }
            }
            Language::Pt => {
                loop {
                    let Some(t) = tokens.get(j) else { break };
                    // código postal, produto novo: modifiers stay out of the head
                    let modifier = t.tag == Tag::Adj
                        || (t.tag == Tag::Noun
                            && !self.model.is_attribute(&t.folded)
                            && !COMPOSITION_WORDS.contains(&t.folded.as_str())
                            && !PART_WORDS.contains(&t.folded.as_str()));
                    if modifier {
                        words.push(&t.surface);
                        j += 1;
                        continue;
                    }
                    // data de nascimento, carrinho de compras
                    if t.folded == "de" {
                        if let Some(n) = tokens.get(j + 1).filter(|n| n.tag == Tag::Noun) {
                            head_words.push(&t.surface);
                            head_words.push(&n.surface);
                            words.push(&t.surface);
                            words.push(&n.surface);
                            j += 2;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        let phrase = NounPhrase {
            text: words.join(" "),
            head: head_words.join(" "),
            preposition,
            quantity,
            plural: plural || head_plural,
            determined,
        };
        Some((phrase, j))
    }
}
