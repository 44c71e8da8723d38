//! Text folding used for identity comparison.
//!
//! Folding is NFD decomposition, removal of combining marks, lowercasing
//! and whitespace collapsing. Singular/plural folding is a fixed list of
//! suffix rewrites applied to every word of a folded name.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case- and diacritic-folded form of `s`.
pub fn fold(s: &str) -> String {
    let stripped: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// ASCII identifier fragment: folded, non-alphanumerics collapsed to `-`.
pub fn slug(s: &str) -> String {
    let folded = fold(s);
    let mut out = String::with_capacity(folded.len());
    let mut last_dash = true;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "x".to_string()
    } else {
        out
    }
}

/// One suffix rewrite, e.g. `coes -> cao`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRule {
    pub suffix: String,
    pub replacement: String,
}

impl SuffixRule {
    pub fn new(suffix: &str, replacement: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            replacement: replacement.to_string(),
        }
    }
}

/// Plural folding rules for identity comparison. First matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluralRules {
    pub rules: Vec<SuffixRule>,
    pub min_stem_length: usize,
}

impl PluralRules {
    /// Portuguese rules, written against already folded (accent-free) words.
    pub fn portuguese() -> Self {
        Self {
            rules: vec![
                SuffixRule::new("coes", "cao"),
                SuffixRule::new("oes", "ao"),
                SuffixRule::new("aes", "ao"),
                SuffixRule::new("ais", "al"),
                SuffixRule::new("eis", "el"),
                SuffixRule::new("ois", "ol"),
                SuffixRule::new("ns", "m"),
                SuffixRule::new("res", "r"),
                SuffixRule::new("zes", "z"),
                SuffixRule::new("s", ""),
            ],
            min_stem_length: 3,
        }
    }

    pub fn english() -> Self {
        Self {
            rules: vec![
                SuffixRule::new("ies", "y"),
                SuffixRule::new("sses", "ss"),
                SuffixRule::new("ches", "ch"),
                SuffixRule::new("shes", "sh"),
                SuffixRule::new("xes", "x"),
                SuffixRule::new("ss", "ss"),
                SuffixRule::new("us", "us"),
                SuffixRule::new("s", ""),
            ],
            min_stem_length: 3,
        }
    }

    pub fn singularize_word(&self, word: &str) -> String {
        for rule in &self.rules {
            if let Some(stem) = word.strip_suffix(rule.suffix.as_str()) {
                if stem.chars().count() < self.min_stem_length {
                    continue;
                }
                return format!("{}{}", stem, rule.replacement);
            }
        }
        word.to_string()
    }

    /// Identity key: folded name with every word singularized.
    pub fn identity_key(&self, name: &str) -> String {
        fold(name)
            .split(' ')
            .map(|word| self.singularize_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for PluralRules {
    fn default() -> Self {
        Self::portuguese()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_case_and_diacritics() {
        assert_eq!(fold("  Informação   Pública "), "informacao publica");
        assert_eq!(fold("Ação"), "acao");
        assert_eq!(fold("CLIENTE"), "cliente");
    }

    #[test]
    fn test_identity_key_merges_plurals() {
        let rules = PluralRules::portuguese();
        assert_eq!(rules.identity_key("Livro"), rules.identity_key("livros"));
        assert_ne!(rules.identity_key("Livro"), rules.identity_key("Livraria"));
        assert_eq!(rules.identity_key("Informações"), "informacao");
        assert_eq!(rules.identity_key("itens"), "item");
        assert_eq!(rules.identity_key("professores"), "professor");
        assert_eq!(rules.identity_key("animais"), "animal");
    }

    #[test]
    fn test_min_stem_length_guards_short_words() {
        let rules = PluralRules::portuguese();
        assert_eq!(rules.singularize_word("mes"), "mes");
        assert_eq!(rules.singularize_word("bus"), "bus");
    }

    #[test]
    fn test_english_rules() {
        let rules = PluralRules::english();
        assert_eq!(rules.identity_key("Categories"), "category");
        assert_eq!(rules.identity_key("addresses"), "address");
        assert_eq!(rules.identity_key("status"), "status");
        assert_eq!(rules.identity_key("Orders"), "order");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Carrinho de Compras"), "carrinho-de-compras");
        assert_eq!(slug("Ação!"), "acao");
        assert_eq!(slug("???"), "x");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("cliente"), "Cliente");
        assert_eq!(capitalize("ética"), "Ética");
        assert_eq!(capitalize(""), "");
    }
}
