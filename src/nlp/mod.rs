// Linguistic analysis used by the grammar strategy: word tables, a
// rule-based tagger and a noun-phrase chunker.

pub mod chunker;
pub mod lexicon;
pub mod tagger;

pub use chunker::{Chunk, Chunker, Marker, NounPhrase};
pub use lexicon::{LanguageModel, LanguageModels, LexiconFile, Quantity, VerbClass};
pub use tagger::{Tag, Tagger, Token};

use crate::domain::model::RequirementUnit;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pt,
    En,
}

const PT_MARKERS: &[&str] = &[
    "o", "os", "as", "um", "uma", "de", "do", "da", "dos", "das", "que", "deve", "pode", "para",
    "com", "no", "na", "em", "ao", "e", "cada", "nao",
];

const EN_MARKERS: &[&str] = &[
    "the", "an", "of", "and", "must", "can", "should", "to", "with", "in", "is", "are", "has",
    "have", "each", "that", "not",
];

impl Language {
    /// `None` for `auto`, which asks for detection.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pt" | "pt-pt" | "pt-br" | "portuguese" | "portugues" => Some(Language::Pt),
            "en" | "en-us" | "en-gb" | "english" => Some(Language::En),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Pt => "pt",
            Language::En => "en",
        }
    }

    /// Picks the language whose function words occur more often.
    /// Ties go to Portuguese.
    pub fn detect(text: &str) -> Self {
        let mut pt = 0usize;
        let mut en = 0usize;
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let folded = crate::core::text::fold(word);
            if PT_MARKERS.contains(&folded.as_str()) {
                pt += 1;
            }
            if EN_MARKERS.contains(&folded.as_str()) {
                en += 1;
            }
        }
        tracing::debug!("🌐 Language detection: pt={} en={}", pt, en);
        if en > pt {
            Language::En
        } else {
            Language::Pt
        }
    }

    /// The configured language, or the one detected over every unit.
    pub fn resolve(configured: Option<Language>, units: &[RequirementUnit]) -> Self {
        configured.unwrap_or_else(|| {
            let text: Vec<&str> = units.iter().map(|u| u.text.as_str()).collect();
            Language::detect(&text.join(" "))
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
