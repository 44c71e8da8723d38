//! Rule-based part-of-speech tagging.
//!
//! Words are looked up in the closed-class and verb tables first; a second
//! pass resolves verb/noun ambiguity from the neighbouring tags.

use crate::core::text::fold;
use crate::nlp::lexicon::{LanguageModel, Quantity, VerbClass, VerbForm, WordClass};
use crate::nlp::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Det,
    Num,
    Prep,
    Contraction,
    Conj,
    Relative,
    Pronoun,
    Negation,
    Adverb,
    Adj,
    Modal,
    Copula,
    Verb,
    Noun,
    /// English `'s`
    Possessive,
    Punct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub surface: String,
    pub folded: String,
    pub tag: Tag,
    pub lemma: Option<String>,
    pub verb_class: Option<VerbClass>,
    pub verb_form: Option<VerbForm>,
    pub quantity: Option<Quantity>,
    pub plural: bool,
}

impl Token {
    fn new(surface: &str, tag: Tag) -> Self {
        Self {
            surface: surface.to_string(),
            folded: fold(surface),
            tag,
            lemma: None,
            verb_class: None,
            verb_form: None,
            quantity: None,
            plural: false,
        }
    }

    pub fn is(&self, tag: Tag) -> bool {
        self.tag == tag
    }

    pub fn is_punct(&self, c: char) -> bool {
        self.tag == Tag::Punct && self.surface.starts_with(c)
    }

    /// Sentence-internal boundary: `.`, `!`, `?` or `;`.
    pub fn is_boundary(&self) -> bool {
        self.tag == Tag::Punct && matches!(self.surface.as_str(), "." | "!" | "?" | ";")
    }
}

pub struct Tagger<'a> {
    model: &'a LanguageModel,
}

impl<'a> Tagger<'a> {
    pub fn new(model: &'a LanguageModel) -> Self {
        Self { model }
    }

    pub fn tag(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        for raw in tokenize(text) {
            self.push_word(&raw, &mut tokens);
        }
        self.disambiguate(&mut tokens);
        tokens
    }

    fn push_word(&self, raw: &str, out: &mut Vec<Token>) {
        let first = raw.chars().next().unwrap_or(' ');
        if !first.is_alphanumeric() {
            out.push(Token::new(raw, Tag::Punct));
            return;
        }

        if self.model.language == Language::En {
            if let Some(stem) = raw
                .strip_suffix("'s")
                .or_else(|| raw.strip_suffix("’s"))
                .filter(|stem| !stem.is_empty())
            {
                out.push(self.classify(stem));
                out.push(Token::new("'s", Tag::Possessive));
                return;
            }
        }

        // registar-se -> registar + se; e-mail stays whole
        if self.model.language == Language::Pt && raw.contains('-') {
            let folded = fold(raw);
            if self.model.attribute_type(&folded).is_none() {
                if let Some((verb, clitic)) = raw.rsplit_once('-') {
                    if self.model.is_clitic(&fold(clitic)) && self.model.verb(&fold(verb)).is_some()
                    {
                        out.push(self.classify(verb));
                        out.push(Token::new(clitic, Tag::Pronoun));
                        return;
                    }
                }
            }
        }

        out.push(self.classify(raw));
    }

    fn classify(&self, raw: &str) -> Token {
        let lower = raw.to_lowercase();
        let mut token = Token::new(raw, Tag::Noun);

        if self.model.language == Language::Pt {
            match lower.as_str() {
                "é" => {
                    token.tag = Tag::Copula;
                    token.lemma = Some("ser".to_string());
                    return token;
                }
                "à" | "às" => {
                    token.tag = Tag::Contraction;
                    token.plural = lower == "às";
                    return token;
                }
                _ => {}
            }
        }

        if let Ok(n) = token.folded.parse::<u32>() {
            token.tag = Tag::Num;
            token.quantity = Some(if n == 1 {
                Quantity::One
            } else {
                Quantity::Exact(n)
            });
            return token;
        }

        if let Some(class) = self.model.closed_class(&token.folded) {
            token.tag = match class {
                WordClass::Determiner { quantity, plural } => {
                    token.quantity = quantity;
                    token.plural = plural;
                    Tag::Det
                }
                WordClass::Number(n) => {
                    token.quantity = Some(Quantity::Exact(n));
                    token.plural = true;
                    Tag::Num
                }
                WordClass::Preposition => Tag::Prep,
                WordClass::Contraction { plural } => {
                    token.plural = plural;
                    Tag::Contraction
                }
                WordClass::Conjunction => Tag::Conj,
                WordClass::Relative => Tag::Relative,
                WordClass::Pronoun => Tag::Pronoun,
                WordClass::Negation => Tag::Negation,
                WordClass::Adverb => Tag::Adverb,
                WordClass::Adjective => Tag::Adj,
                WordClass::Modal => Tag::Modal,
                WordClass::Copula => Tag::Copula,
            };
            return token;
        }

        if let Some(entry) = self.model.verb(&token.folded) {
            token.tag = Tag::Verb;
            token.lemma = Some(entry.lemma.clone());
            token.verb_class = Some(entry.class);
            token.verb_form = Some(entry.form);
            return token;
        }

        if let Some(lemma) = self.gerund_lemma(&token.folded) {
            token.tag = Tag::Verb;
            token.lemma = Some(lemma);
            token.verb_class = Some(VerbClass::Plain);
            token.verb_form = Some(VerbForm::Gerund);
            return token;
        }

        if !token.folded.chars().any(char::is_alphabetic) {
            token.tag = Tag::Num;
            return token;
        }

        token.plural = self.model.is_plural(&token.folded);
        token
    }

    /// Unknown Portuguese gerunds: comprando -> comprar.
    fn gerund_lemma(&self, folded: &str) -> Option<String> {
        if self.model.language != Language::Pt
            || folded.chars().count() <= 5
            || GERUND_EXCEPTIONS.contains(&folded)
            || self.model.is_attribute(folded)
        {
            return None;
        }
        [("ando", "ar"), ("endo", "er"), ("indo", "ir")]
            .iter()
            .find_map(|(suffix, theme)| {
                folded
                    .strip_suffix(suffix)
                    .map(|stem| format!("{}{}", stem, theme))
            })
    }

    fn disambiguate(&self, tokens: &mut [Token]) {
        for i in 0..tokens.len() {
            let prev = if i > 0 { Some(tokens[i - 1].clone()) } else { None };
            let next_tag = tokens.get(i + 1).map(|t| t.tag);
            let next_folded = tokens.get(i + 1).map(|t| t.folded.clone());
            let after_next = tokens.get(i + 2).map(|t| (t.tag, t.verb_form));

            let token = &mut tokens[i];
            match token.tag {
                Tag::Verb => {
                    // tem de / tem que / has to + infinitive behave as modals
                    let is_have = matches!(token.lemma.as_deref(), Some("ter") | Some("have"));
                    let obligation = matches!(next_folded.as_deref(), Some("de") | Some("que") | Some("to"))
                        && matches!(after_next, Some((Tag::Verb, _)));
                    if is_have && obligation {
                        token.tag = Tag::Modal;
                        continue;
                    }

                    // "the registered users"
                    if self.model.language == Language::En
                        && token.folded.ends_with("ed")
                        && next_tag == Some(Tag::Noun)
                        && !matches!(prev.as_ref().map(|p| p.tag), Some(Tag::Noun) | None)
                    {
                        token.tag = Tag::Adj;
                    } else if self.verb_is_noun(token, prev.as_ref(), next_tag) {
                        token.tag = Tag::Noun;
                        token.plural = self.model.is_plural(&token.folded);
                        token.lemma = None;
                        token.verb_class = None;
                        token.verb_form = None;
                    }
                }
                Tag::Noun => {
                    if self.is_adjective(token, prev.as_ref()) {
                        token.tag = Tag::Adj;
                    }
                }
                _ => {}
            }
        }
    }

    fn verb_is_noun(&self, token: &Token, prev: Option<&Token>, next: Option<Tag>) -> bool {
        let form = token.verb_form.unwrap_or(VerbForm::Finite);
        let Some(prev) = prev else {
            // sentence-initial: "Books have authors" vs imperative "Register customers"
            return self.model.language == Language::En
                && form == VerbForm::Finite
                && next != Some(Tag::Noun);
        };

        match self.model.language {
            Language::Pt => match prev.tag {
                Tag::Det | Tag::Num => !(form == VerbForm::Infinitive && prev.folded == "a"),
                Tag::Contraction => !(form == VerbForm::Infinitive && prev.folded == "ao"),
                Tag::Prep => form != VerbForm::Infinitive,
                Tag::Verb => form == VerbForm::Finite,
                _ => false,
            },
            Language::En => match prev.tag {
                Tag::Det | Tag::Num | Tag::Possessive | Tag::Adj => true,
                Tag::Prep => prev.folded != "to" && form != VerbForm::Gerund,
                Tag::Verb => form != VerbForm::Gerund,
                Tag::Punct => prev.is_boundary() && form == VerbForm::Finite,
                _ => false,
            },
        }
    }

    fn is_adjective(&self, token: &Token, prev: Option<&Token>) -> bool {
        let folded = token.folded.as_str();
        if self.model.is_attribute(folded) {
            return false;
        }
        match self.model.language {
            Language::Pt => {
                let after_noun = matches!(prev.map(|p| p.tag), Some(Tag::Noun) | Some(Tag::Adj));
                let participle = ["ado", "ada", "ados", "adas", "ido", "ida", "idos", "idas"]
                    .iter()
                    .any(|s| folded.ends_with(s));
                let able = ["avel", "aveis", "ivel", "iveis"]
                    .iter()
                    .any(|s| folded.ends_with(s));
                (after_noun && participle && folded.chars().count() > 4) || able
            }
            Language::En => {
                folded.chars().count() > 5 && (folded.ends_with("able") || folded.ends_with("ible"))
            }
        }
    }
}

const GERUND_EXCEPTIONS: &[&str] = &["comando", "dividendo", "quando", "segundo", "mundo"];

/// Splits text into word tokens and single punctuation characters.
/// Hyphens and apostrophes inside a word are kept with it.
pub fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        let joiner = matches!(c, '-' | '\'' | '’')
            && !current.is_empty()
            && chars.get(i + 1).map(|n| n.is_alphanumeric()).unwrap_or(false);
        if c.is_alphanumeric() || joiner {
            current.push(c);
            continue;
        }
        // 2.5 and 1,000 stay one number
        if matches!(c, '.' | ',')
            && current.chars().all(|d| d.is_ascii_digit())
            && !current.is_empty()
            && chars.get(i + 1).map(|n| n.is_ascii_digit()).unwrap_or(false)
        {
            current.push(c);
            continue;
        }
        if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        if !c.is_whitespace() {
            tokens.push(c.to_string());
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
