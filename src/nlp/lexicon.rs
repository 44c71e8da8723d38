//! Word tables for the grammar-based analysis.
//!
//! Every key is stored folded (see [`crate::core::text::fold`]), so lookups
//! are insensitive to case and diacritics. A `LanguageModel` is built once
//! and never mutated afterwards; concurrent requests share it through `Arc`.

use crate::core::text::{fold, PluralRules};
use crate::nlp::Language;
use crate::utils::error::{Req2DomError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Quantity signalled by a determiner or number next to a noun phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    One,
    Each,
    Many,
    Exact(u32),
}

impl Quantity {
    pub fn multiplicity(&self) -> String {
        match self {
            Quantity::One | Quantity::Each => "1".to_string(),
            Quantity::Many => "0..*".to_string(),
            Quantity::Exact(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbClass {
    /// ter, possuir, have, contain...
    Possession,
    /// fornecer, indicar, provide, enter...
    Provision,
    /// herdar, estender, inherit, extend...
    Inheritance,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbForm {
    Infinitive,
    Gerund,
    Finite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbEntry {
    pub lemma: String,
    pub class: VerbClass,
    pub form: VerbForm,
}

/// Closed word classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    Determiner {
        quantity: Option<Quantity>,
        plural: bool,
    },
    Number(u32),
    Preposition,
    /// Preposition fused with an article: ao, do, pelo...
    Contraction {
        plural: bool,
    },
    Conjunction,
    Relative,
    Pronoun,
    Negation,
    Adverb,
    Adjective,
    Modal,
    Copula,
}

/// Extra vocabulary for one language, usually loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconOverrides {
    #[serde(default)]
    pub stop_nouns: Vec<String>,
    /// attribute word -> type name
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub verbs: Vec<VerbOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbOverride {
    pub lemma: String,
    pub class: VerbClass,
    /// Conjugated forms; generated from the lemma when empty.
    #[serde(default)]
    pub forms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconFile {
    pub pt: Option<LexiconOverrides>,
    pub en: Option<LexiconOverrides>,
}

impl LexiconFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| Req2DomError::InvalidConfigValue {
            field: "grammar.lexicon_file".to_string(),
            value: path.as_ref().display().to_string(),
            reason: format!("Lexicon parsing error: {}", e),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LanguageModel {
    pub language: Language,
    closed: HashMap<String, WordClass>,
    verbs: HashMap<String, VerbEntry>,
    stop_nouns: HashSet<String>,
    attributes: HashMap<String, String>,
    invariant_nouns: HashSet<String>,
    clitics: HashSet<String>,
    surface_rules: Vec<(String, String)>,
    plural_rules: PluralRules,
}

impl LanguageModel {
    pub fn portuguese() -> Self {
        let mut model = Self::empty(Language::Pt, PluralRules::portuguese());

        for (word, quantity, plural) in PT_DETERMINERS {
            model.closed.insert(
                word.to_string(),
                WordClass::Determiner {
                    quantity: *quantity,
                    plural: *plural,
                },
            );
        }
        for (word, n) in PT_NUMBERS {
            model.closed.insert(word.to_string(), WordClass::Number(*n));
        }
        for word in PT_CONTRACTIONS {
            let plural = word.ends_with('s');
            model
                .closed
                .insert(word.to_string(), WordClass::Contraction { plural });
        }
        model.insert_closed(PT_PREPOSITIONS, WordClass::Preposition);
        model.insert_closed(PT_CONJUNCTIONS, WordClass::Conjunction);
        model.insert_closed(PT_RELATIVES, WordClass::Relative);
        model.insert_closed(PT_PRONOUNS, WordClass::Pronoun);
        model.insert_closed(PT_NEGATIONS, WordClass::Negation);
        model.insert_closed(PT_ADVERBS, WordClass::Adverb);
        model.insert_closed(PT_ADJECTIVES, WordClass::Adjective);
        model.insert_closed(PT_MODALS, WordClass::Modal);
        model.insert_closed(PT_COPULAS, WordClass::Copula);

        for (lemma, class) in PT_REGULAR_VERBS {
            let forms = portuguese_forms(lemma);
            model.insert_verb(lemma, *class, &forms);
        }
        for (lemma, class, forms) in PT_IRREGULAR_VERBS {
            let forms: Vec<String> = forms.iter().map(|f| f.to_string()).collect();
            model.insert_verb(lemma, *class, &forms);
        }

        model.stop_nouns = PT_STOP_NOUNS.iter().map(|s| s.to_string()).collect();
        model.attributes = PT_ATTRIBUTES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        model.invariant_nouns = PT_INVARIANT_NOUNS.iter().map(|s| s.to_string()).collect();
        model.clitics = PT_CLITICS.iter().map(|s| s.to_string()).collect();
        model.surface_rules = PT_SURFACE_RULES
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        model
    }

    pub fn english() -> Self {
        let mut model = Self::empty(Language::En, PluralRules::english());

        for (word, quantity, plural) in EN_DETERMINERS {
            model.closed.insert(
                word.to_string(),
                WordClass::Determiner {
                    quantity: *quantity,
                    plural: *plural,
                },
            );
        }
        for (word, n) in EN_NUMBERS {
            model.closed.insert(word.to_string(), WordClass::Number(*n));
        }
        model.insert_closed(EN_PREPOSITIONS, WordClass::Preposition);
        model.insert_closed(EN_CONJUNCTIONS, WordClass::Conjunction);
        model.insert_closed(EN_RELATIVES, WordClass::Relative);
        model.insert_closed(EN_PRONOUNS, WordClass::Pronoun);
        model.insert_closed(EN_NEGATIONS, WordClass::Negation);
        model.insert_closed(EN_ADVERBS, WordClass::Adverb);
        model.insert_closed(EN_ADJECTIVES, WordClass::Adjective);
        model.insert_closed(EN_MODALS, WordClass::Modal);
        model.insert_closed(EN_COPULAS, WordClass::Copula);

        for (lemma, class) in EN_VERBS {
            let forms = english_forms(lemma);
            model.insert_verb(lemma, *class, &forms);
        }
        for (lemma, class, forms) in EN_IRREGULAR_FORMS {
            let forms: Vec<String> = forms.iter().map(|f| f.to_string()).collect();
            model.insert_verb(lemma, *class, &forms);
        }

        model.stop_nouns = EN_STOP_NOUNS.iter().map(|s| s.to_string()).collect();
        model.attributes = EN_ATTRIBUTES
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        model.invariant_nouns = EN_INVARIANT_NOUNS.iter().map(|s| s.to_string()).collect();
        model.surface_rules = EN_SURFACE_RULES
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        model
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Pt => Self::portuguese(),
            Language::En => Self::english(),
        }
    }

    fn empty(language: Language, plural_rules: PluralRules) -> Self {
        Self {
            language,
            closed: HashMap::new(),
            verbs: HashMap::new(),
            stop_nouns: HashSet::new(),
            attributes: HashMap::new(),
            invariant_nouns: HashSet::new(),
            clitics: HashSet::new(),
            surface_rules: Vec::new(),
            plural_rules,
        }
    }

    fn insert_closed(&mut self, words: &[&str], class: WordClass) {
        for word in words {
            self.closed.insert(word.to_string(), class);
        }
    }

    fn insert_verb(&mut self, lemma: &str, class: VerbClass, forms: &[String]) {
        let lemma = fold(lemma);
        for form in forms {
            let form = fold(form);
            let kind = if form == lemma {
                VerbForm::Infinitive
            } else if self.is_gerund_form(&form) {
                VerbForm::Gerund
            } else {
                VerbForm::Finite
            };
            // 不覆蓋已有的封閉詞類或先註冊的動詞
            if self.closed.contains_key(&form) {
                continue;
            }
            self.verbs.entry(form).or_insert(VerbEntry {
                lemma: lemma.clone(),
                class,
                form: kind,
            });
        }
    }

    fn is_gerund_form(&self, form: &str) -> bool {
        match self.language {
            Language::Pt => ["ando", "endo", "indo", "ondo"]
                .iter()
                .any(|suffix| form.ends_with(suffix)),
            Language::En => form.ends_with("ing"),
        }
    }

    /// Applies user-supplied vocabulary on top of the built-in tables.
    pub fn apply_overrides(&mut self, overrides: &LexiconOverrides) {
        for noun in &overrides.stop_nouns {
            self.stop_nouns.insert(self.plural_rules.identity_key(noun));
        }
        for (word, type_name) in &overrides.attributes {
            self.attributes.insert(fold(word), type_name.clone());
        }
        for verb in &overrides.verbs {
            let forms = if verb.forms.is_empty() {
                match self.language {
                    Language::Pt => portuguese_forms(&verb.lemma),
                    Language::En => english_forms(&verb.lemma),
                }
            } else {
                let mut forms = verb.forms.clone();
                forms.push(verb.lemma.clone());
                forms
            };
            let lemma = fold(&verb.lemma);
            // 覆寫時以使用者定義為準
            for form in &forms {
                self.verbs.remove(&fold(form));
            }
            self.insert_verb(&lemma, verb.class, &forms);
        }
    }

    pub fn closed_class(&self, folded: &str) -> Option<WordClass> {
        self.closed.get(folded).copied()
    }

    pub fn verb(&self, folded: &str) -> Option<&VerbEntry> {
        self.verbs.get(folded)
    }

    pub fn is_clitic(&self, folded: &str) -> bool {
        self.clitics.contains(folded)
    }

    pub fn plural_rules(&self) -> &PluralRules {
        &self.plural_rules
    }

    pub fn is_plural(&self, folded_word: &str) -> bool {
        !self.invariant_nouns.contains(folded_word)
            && !self.attributes.contains_key(folded_word)
            && self.plural_rules.singularize_word(folded_word) != folded_word
    }

    /// Naming head of a phrase: first word in Portuguese, last in English.
    fn head_word<'a>(&self, phrase: &'a str) -> &'a str {
        let mut words = phrase.split_whitespace();
        let head = match self.language {
            Language::Pt => words.next(),
            Language::En => words.last(),
        };
        head.unwrap_or(phrase)
    }

    /// Type of an attribute word, trying the whole phrase before its head.
    pub fn attribute_type(&self, phrase: &str) -> Option<&str> {
        let folded = fold(phrase);
        if let Some(t) = self.attributes.get(&folded) {
            return Some(t);
        }
        let head = self.head_word(&folded);
        self.attributes
            .get(head)
            .or_else(|| {
                let singular = self.plural_rules.singularize_word(head);
                self.attributes.get(&singular)
            })
            .map(String::as_str)
    }

    pub fn is_attribute(&self, phrase: &str) -> bool {
        self.attribute_type(phrase).is_some()
    }

    pub fn is_stop_noun(&self, phrase: &str) -> bool {
        self.stop_nouns
            .contains(&self.plural_rules.identity_key(phrase))
    }

    /// Singular display form of a plural surface word, accents preserved.
    pub fn singular_surface(&self, word: &str) -> String {
        let folded = fold(word);
        if !self.is_plural(&folded) {
            return word.to_string();
        }
        for (suffix, replacement) in &self.surface_rules {
            if let Some(stem) = word.strip_suffix(suffix.as_str()) {
                if stem.chars().count() < self.plural_rules.min_stem_length {
                    continue;
                }
                return format!("{}{}", stem, replacement);
            }
        }
        word.to_string()
    }

    /// Class name for a noun-phrase head: singular, capitalized.
    pub fn entity_name(&self, head: &str) -> String {
        let lowered = head.to_lowercase();
        let mut words: Vec<String> = lowered.split_whitespace().map(str::to_string).collect();
        let index = match self.language {
            Language::Pt => 0,
            Language::En => words.len().saturating_sub(1),
        };
        if let Some(word) = words.get_mut(index) {
            *word = self.singular_surface(word);
        }
        crate::core::text::capitalize(&words.join(" "))
    }
}

/// The process-wide set of loaded language models.
#[derive(Debug, Clone)]
pub struct LanguageModels {
    pt: Arc<LanguageModel>,
    en: Arc<LanguageModel>,
}

static GLOBAL_MODELS: OnceLock<Arc<LanguageModels>> = OnceLock::new();

impl LanguageModels {
    pub fn load() -> Self {
        Self {
            pt: Arc::new(LanguageModel::portuguese()),
            en: Arc::new(LanguageModel::english()),
        }
    }

    pub fn load_with(overrides: &LexiconFile) -> Self {
        let mut pt = LanguageModel::portuguese();
        let mut en = LanguageModel::english();
        if let Some(o) = &overrides.pt {
            pt.apply_overrides(o);
        }
        if let Some(o) = &overrides.en {
            en.apply_overrides(o);
        }
        Self {
            pt: Arc::new(pt),
            en: Arc::new(en),
        }
    }

    /// Built-in models, loaded on first use and shared for the process lifetime.
    pub fn global() -> Arc<LanguageModels> {
        GLOBAL_MODELS
            .get_or_init(|| {
                tracing::debug!("📚 Loading built-in language models");
                Arc::new(Self::load())
            })
            .clone()
    }

    pub fn get(&self, language: Language) -> Arc<LanguageModel> {
        match language {
            Language::Pt => self.pt.clone(),
            Language::En => self.en.clone(),
        }
    }
}

/// Regular Portuguese conjugation: infinitive, present, preterite, future,
/// subjunctive, gerund and imperfect forms.
pub fn portuguese_forms(lemma: &str) -> Vec<String> {
    let lemma = fold(lemma);
    if lemma.len() < 3 {
        return vec![lemma];
    }
    let (stem, theme) = lemma.split_at(lemma.len() - 2);
    let endings: &[&str] = match theme {
        "ar" => &[
            "ar", "a", "am", "ou", "aram", "ara", "arao", "e", "em", "ando", "ava", "avam",
            "amos", "aria", "ariam",
        ],
        "er" => &[
            "er", "e", "em", "eu", "eram", "era", "erao", "a", "am", "endo", "ia", "iam", "emos",
            "eria", "eriam",
        ],
        "ir" => &[
            "ir", "e", "em", "iu", "iram", "ira", "irao", "a", "am", "indo", "ia", "iam", "imos",
            "iria", "iriam",
        ],
        _ => return vec![lemma.clone()],
    };
    endings
        .iter()
        .map(|ending| format!("{}{}", stem, ending))
        .collect()
}

/// Regular English inflection: base, third person, past and -ing forms.
pub fn english_forms(lemma: &str) -> Vec<String> {
    let base = fold(lemma);
    let consonant_y = base.ends_with('y')
        && base
            .chars()
            .rev()
            .nth(1)
            .map(|c| !"aeiou".contains(c))
            .unwrap_or(false);

    let third = if consonant_y {
        format!("{}ies", &base[..base.len() - 1])
    } else if ["s", "sh", "ch", "x", "z", "o"]
        .iter()
        .any(|s| base.ends_with(s))
    {
        format!("{}es", base)
    } else {
        format!("{}s", base)
    };

    let past = if base.ends_with('e') {
        format!("{}d", base)
    } else if consonant_y {
        format!("{}ied", &base[..base.len() - 1])
    } else {
        format!("{}ed", base)
    };

    let gerund = if base.ends_with('e') && !base.ends_with("ee") {
        format!("{}ing", &base[..base.len() - 1])
    } else {
        format!("{}ing", base)
    };

    vec![base, third, past, gerund]
}

const PT_DETERMINERS: &[(&str, Option<Quantity>, bool)] = &[
    ("o", None, false),
    ("a", None, false),
    ("os", None, true),
    ("as", None, true),
    ("um", Some(Quantity::One), false),
    ("uma", Some(Quantity::One), false),
    ("uns", Some(Quantity::Many), true),
    ("umas", Some(Quantity::Many), true),
    ("cada", Some(Quantity::Each), false),
    ("qualquer", Some(Quantity::One), false),
    ("todos", Some(Quantity::Many), true),
    ("todas", Some(Quantity::Many), true),
    ("varios", Some(Quantity::Many), true),
    ("varias", Some(Quantity::Many), true),
    ("muitos", Some(Quantity::Many), true),
    ("muitas", Some(Quantity::Many), true),
    ("diversos", Some(Quantity::Many), true),
    ("diversas", Some(Quantity::Many), true),
    ("alguns", Some(Quantity::Many), true),
    ("algumas", Some(Quantity::Many), true),
    ("multiplos", Some(Quantity::Many), true),
    ("multiplas", Some(Quantity::Many), true),
    ("outro", None, false),
    ("outra", None, false),
    ("outros", None, true),
    ("outras", None, true),
    ("este", None, false),
    ("esta", None, false),
    ("estes", None, true),
    ("estas", None, true),
    ("esse", None, false),
    ("essa", None, false),
    ("esses", None, true),
    ("essas", None, true),
    ("aquele", None, false),
    ("aquela", None, false),
    ("seu", None, false),
    ("sua", None, false),
    ("seus", None, true),
    ("suas", None, true),
    ("meu", None, false),
    ("minha", None, false),
    ("nosso", None, false),
    ("nossa", None, false),
    ("nenhum", None, false),
    ("nenhuma", None, false),
];

const PT_NUMBERS: &[(&str, u32)] = &[
    ("dois", 2),
    ("duas", 2),
    ("tres", 3),
    ("quatro", 4),
    ("cinco", 5),
    ("seis", 6),
    ("sete", 7),
    ("oito", 8),
    ("nove", 9),
    ("dez", 10),
];

const PT_CONTRACTIONS: &[&str] = &[
    "ao", "aos", "do", "da", "dos", "das", "no", "na", "nos", "nas", "pelo", "pela", "pelos",
    "pelas", "num", "numa", "nuns", "numas", "dum", "duma", "deste", "desta", "destes", "destas",
    "neste", "nesta", "nestes", "nestas", "desse", "dessa", "nesse", "nessa", "daquele",
    "daquela", "naquele", "naquela",
];

const PT_PREPOSITIONS: &[&str] = &[
    "de", "em", "para", "por", "com", "sem", "sobre", "entre", "ate", "apos", "desde", "contra",
    "sob", "perante", "via", "atraves", "conforme",
];

const PT_CONJUNCTIONS: &[&str] = &["e", "ou", "mas", "nem", "porem", "contudo"];

const PT_RELATIVES: &[&str] = &[
    "que", "quem", "cujo", "cuja", "cujos", "cujas", "onde", "qual", "quais",
];

const PT_PRONOUNS: &[&str] = &[
    "se", "ele", "ela", "eles", "elas", "lhe", "lhes", "me", "te", "si", "isto", "isso",
    "aquilo", "tudo", "algo", "alguem", "ninguem",
];

const PT_NEGATIONS: &[&str] = &["nao", "nunca", "jamais"];

const PT_ADVERBS: &[&str] = &[
    "tambem", "apenas", "somente", "so", "ja", "sempre", "ainda", "bem", "mais", "menos",
    "quando", "como", "entao", "logo", "depois", "antes", "aqui", "ali", "assim", "etc",
    "previamente", "automaticamente", "obrigatoriamente",
];

const PT_ADJECTIVES: &[&str] = &[
    "novo", "nova", "novos", "novas", "antigo", "antiga", "principal", "principais", "proprio",
    "propria", "mesmo", "mesma", "diferente", "diferentes", "unico", "unica", "completo",
    "completa", "pessoal", "pessoais", "publico", "publica", "privado", "privada", "online",
    "digital", "especifico", "especifica", "simples", "grande", "pequeno", "pequena", "maximo",
    "maxima", "minimo", "minima", "respetivo", "respetiva", "respectivo", "respectiva",
    "obrigatorio", "obrigatoria", "opcional", "valido", "valida", "seguinte", "anterior", "atual",
    "correspondente", "respetivos", "respetivas",
];

const PT_MODALS: &[&str] = &[
    "deve", "devem", "devera", "deverao", "devia", "deveria", "deveriam", "dever", "pode", "podem",
    "podera", "poderao", "podia", "poderia", "poderiam", "possa", "possam", "poder", "consegue",
    "conseguem", "conseguir", "quer", "querem", "querer", "pretende", "pretendem", "precisa",
    "precisam", "necessita", "necessitam",
];

/// "é" folds to the conjunction "e"; the tagger checks it on the raw surface.
const PT_COPULAS: &[&str] = &[
    "sao", "ser", "sera", "serao", "era", "eram", "foi", "foram", "seja", "sejam", "sendo",
    "sido",
];

const PT_CLITICS: &[&str] = &[
    "se", "me", "te", "lhe", "lhes", "lo", "la", "los", "las", "o", "a", "os", "as", "nos", "vos",
];

const PT_REGULAR_VERBS: &[(&str, VerbClass)] = &[
    ("fornecer", VerbClass::Provision),
    ("indicar", VerbClass::Provision),
    ("informar", VerbClass::Provision),
    ("inserir", VerbClass::Provision),
    ("introduzir", VerbClass::Provision),
    ("preencher", VerbClass::Provision),
    ("especificar", VerbClass::Provision),
    ("definir", VerbClass::Provision),
    ("detalhar", VerbClass::Provision),
    ("declarar", VerbClass::Provision),
    ("herdar", VerbClass::Inheritance),
    ("estender", VerbClass::Inheritance),
    ("especializar", VerbClass::Inheritance),
    ("derivar", VerbClass::Inheritance),
    ("registar", VerbClass::Plain),
    ("registrar", VerbClass::Plain),
    ("cadastrar", VerbClass::Plain),
    ("adicionar", VerbClass::Plain),
    ("remover", VerbClass::Plain),
    ("comprar", VerbClass::Plain),
    ("vender", VerbClass::Plain),
    ("consultar", VerbClass::Plain),
    ("visualizar", VerbClass::Plain),
    ("pesquisar", VerbClass::Plain),
    ("procurar", VerbClass::Plain),
    ("criar", VerbClass::Plain),
    ("editar", VerbClass::Plain),
    ("alterar", VerbClass::Plain),
    ("atualizar", VerbClass::Plain),
    ("apagar", VerbClass::Plain),
    ("eliminar", VerbClass::Plain),
    ("excluir", VerbClass::Plain),
    ("gerir", VerbClass::Plain),
    ("gerenciar", VerbClass::Plain),
    ("aprovar", VerbClass::Plain),
    ("rejeitar", VerbClass::Plain),
    ("efetuar", VerbClass::Plain),
    ("realizar", VerbClass::Plain),
    ("emitir", VerbClass::Plain),
    ("enviar", VerbClass::Plain),
    ("receber", VerbClass::Plain),
    ("pagar", VerbClass::Plain),
    ("reservar", VerbClass::Plain),
    ("cancelar", VerbClass::Plain),
    ("escrever", VerbClass::Plain),
    ("publicar", VerbClass::Plain),
    ("avaliar", VerbClass::Plain),
    ("associar", VerbClass::Plain),
    ("pertencer", VerbClass::Plain),
    ("requisitar", VerbClass::Plain),
    ("emprestar", VerbClass::Plain),
    ("devolver", VerbClass::Plain),
    ("solicitar", VerbClass::Plain),
    ("listar", VerbClass::Plain),
    ("selecionar", VerbClass::Plain),
    ("escolher", VerbClass::Plain),
    ("imprimir", VerbClass::Plain),
    ("gerar", VerbClass::Plain),
    ("autenticar", VerbClass::Plain),
    ("aceder", VerbClass::Plain),
    ("acessar", VerbClass::Plain),
    ("submeter", VerbClass::Plain),
    ("confirmar", VerbClass::Plain),
    ("validar", VerbClass::Plain),
    ("notificar", VerbClass::Plain),
    ("contactar", VerbClass::Plain),
    ("contatar", VerbClass::Plain),
    ("agendar", VerbClass::Plain),
    ("marcar", VerbClass::Plain),
    ("inscrever", VerbClass::Plain),
    ("matricular", VerbClass::Plain),
    ("lecionar", VerbClass::Plain),
    ("ensinar", VerbClass::Plain),
    ("frequentar", VerbClass::Plain),
    ("usar", VerbClass::Plain),
    ("utilizar", VerbClass::Plain),
    ("controlar", VerbClass::Plain),
    ("acompanhar", VerbClass::Plain),
    ("partilhar", VerbClass::Plain),
    ("comentar", VerbClass::Plain),
    ("classificar", VerbClass::Plain),
    ("organizar", VerbClass::Plain),
    ("armazenar", VerbClass::Plain),
    ("guardar", VerbClass::Plain),
    ("encomendar", VerbClass::Plain),
    ("supervisionar", VerbClass::Plain),
    ("coordenar", VerbClass::Plain),
    ("administrar", VerbClass::Plain),
    ("contratar", VerbClass::Plain),
    ("atender", VerbClass::Plain),
    ("entregar", VerbClass::Plain),
    ("transportar", VerbClass::Plain),
    ("alugar", VerbClass::Plain),
    ("trabalhar", VerbClass::Plain),
    ("participar", VerbClass::Plain),
    ("referenciar", VerbClass::Plain),
    ("permitir", VerbClass::Plain),
    ("descrever", VerbClass::Plain),
    ("avisar", VerbClass::Plain),
];

const PT_IRREGULAR_VERBS: &[(&str, VerbClass, &[&str])] = &[
    (
        "ter",
        VerbClass::Possession,
        &[
            "ter", "tem", "têm", "tinha", "tinham", "teve", "tiveram", "terá", "terão", "tenha",
            "tenham", "tendo",
        ],
    ),
    (
        "possuir",
        VerbClass::Possession,
        &[
            "possuir", "possui", "possuem", "possuiu", "possuíram", "possuirá", "possuindo",
            "possua", "possuam", "possuía",
        ],
    ),
    (
        "conter",
        VerbClass::Possession,
        &[
            "conter", "contém", "contêm", "continha", "continham", "conterá", "contenha",
            "contenham", "contendo",
        ],
    ),
    (
        "incluir",
        VerbClass::Possession,
        &[
            "incluir", "inclui", "incluem", "incluiu", "incluíram", "incluirá", "incluindo",
            "inclua", "incluam",
        ],
    ),
    ("introduzir", VerbClass::Provision, &["introduz"]),
    (
        "atribuir",
        VerbClass::Plain,
        &["atribuir", "atribui", "atribuem", "atribuiu", "atribuindo", "atribua"],
    ),
    (
        "pedir",
        VerbClass::Plain,
        &[
            "pedir", "pede", "pedem", "pediu", "pediram", "pedirá", "pedindo", "peça", "peçam",
            "pedia",
        ],
    ),
    (
        "fazer",
        VerbClass::Plain,
        &[
            "fazer", "faz", "fazem", "fez", "fizeram", "fará", "farão", "faça", "façam",
            "fazendo", "fazia",
        ],
    ),
    (
        "ver",
        VerbClass::Plain,
        &["ver", "vê", "veem", "viu", "viram", "verá", "vendo", "veja", "vejam"],
    ),
    (
        "ler",
        VerbClass::Plain,
        &["ler", "lê", "leem", "leu", "leram", "lerá", "lendo", "leia", "leiam"],
    ),
];

/// Generic nouns never promoted to classes (stored as identity keys).
const PT_STOP_NOUNS: &[&str] = &[
    "sistema", "dado", "informacao", "processo", "forma", "modo", "vez", "tempo", "lugar",
    "coisa", "exemplo", "parte", "meio", "erro", "resultado", "condicao", "plataforma",
    "funcionalidade", "possibilidade", "aplicacao", "opcao", "acao", "operacao", "momento",
    "caso", "funcao", "capacidade", "necessidade", "requisito", "site", "interface", "software",
    "app", "ecra", "utilizacao", "especie",
];

const PT_ATTRIBUTES: &[(&str, &str)] = &[
    ("id", "Integer"),
    ("identificador", "Integer"),
    ("codigo", "String"),
    ("nome", "String"),
    ("apelido", "String"),
    ("sobrenome", "String"),
    ("descricao", "String"),
    ("email", "String"),
    ("e-mail", "String"),
    ("telefone", "String"),
    ("telemovel", "String"),
    ("celular", "String"),
    ("contacto", "String"),
    ("contato", "String"),
    ("morada", "String"),
    ("endereco", "String"),
    ("cidade", "String"),
    ("pais", "String"),
    ("data", "Date"),
    ("hora", "DateTime"),
    ("horario", "String"),
    ("prazo", "Date"),
    ("validade", "Date"),
    ("preco", "Double"),
    ("valor", "Double"),
    ("custo", "Double"),
    ("salario", "Double"),
    ("saldo", "Double"),
    ("montante", "Double"),
    ("desconto", "Double"),
    ("taxa", "Double"),
    ("iva", "Double"),
    ("percentagem", "Double"),
    ("nota", "Double"),
    ("peso", "Double"),
    ("altura", "Double"),
    ("quantidade", "Integer"),
    ("stock", "Integer"),
    ("idade", "Integer"),
    ("duracao", "Integer"),
    ("lotacao", "Integer"),
    ("ano", "Integer"),
    ("nivel", "Integer"),
    ("pontuacao", "Integer"),
    ("total", "Double"),
    ("estado", "String"),
    ("status", "String"),
    ("tipo", "String"),
    ("ativo", "Boolean"),
    ("disponivel", "Boolean"),
    ("titulo", "String"),
    ("nif", "String"),
    ("cpf", "String"),
    ("password", "String"),
    ("senha", "String"),
    ("username", "String"),
    ("login", "String"),
    ("observacao", "String"),
    ("referencia", "String"),
    ("isbn", "String"),
    ("numero", "String"),
    ("matricula", "String"),
    ("sigla", "String"),
    ("genero", "String"),
    ("sexo", "String"),
    ("nacionalidade", "String"),
    ("profissao", "String"),
    ("cargo", "String"),
    ("localizacao", "String"),
    ("foto", "String"),
    ("imagem", "String"),
    ("url", "String"),
    ("website", "String"),
    ("versao", "String"),
    ("conteudo", "String"),
    ("texto", "String"),
    ("assunto", "String"),
];

const PT_INVARIANT_NOUNS: &[&str] = &[
    "pais", "lapis", "status", "onibus", "virus", "atlas", "mes", "gas", "portugues", "ingles",
    "cais", "tenis", "bonus", "campus", "iris", "simples",
];

/// Surface plural rules with accents, mirroring [`PluralRules::portuguese`].
const PT_SURFACE_RULES: &[(&str, &str)] = &[
    ("ções", "ção"),
    ("coes", "cao"),
    ("ões", "ão"),
    ("ães", "ão"),
    ("ais", "al"),
    ("éis", "el"),
    ("eis", "el"),
    ("óis", "ol"),
    ("ois", "ol"),
    ("ns", "m"),
    ("res", "r"),
    ("zes", "z"),
    ("s", ""),
];

const EN_DETERMINERS: &[(&str, Option<Quantity>, bool)] = &[
    ("the", None, false),
    ("a", Some(Quantity::One), false),
    ("an", Some(Quantity::One), false),
    ("one", Some(Quantity::One), false),
    ("single", Some(Quantity::One), false),
    ("each", Some(Quantity::Each), false),
    ("every", Some(Quantity::Each), false),
    ("many", Some(Quantity::Many), true),
    ("several", Some(Quantity::Many), true),
    ("multiple", Some(Quantity::Many), true),
    ("various", Some(Quantity::Many), true),
    ("all", Some(Quantity::Many), true),
    ("some", Some(Quantity::Many), true),
    ("any", None, false),
    ("these", None, true),
    ("those", None, true),
    ("this", None, false),
    ("his", None, false),
    ("her", None, false),
    ("its", None, false),
    ("their", None, false),
    ("your", None, false),
    ("my", None, false),
    ("our", None, false),
    ("another", None, false),
    ("other", None, false),
];

const EN_NUMBERS: &[(&str, u32)] = &[
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

const EN_PREPOSITIONS: &[&str] = &[
    "of", "in", "on", "at", "to", "for", "from", "by", "with", "without", "about", "into",
    "through", "over", "under", "between", "via", "per", "within",
];

const EN_CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor"];

const EN_RELATIVES: &[&str] = &["that", "which", "who", "whom", "whose", "where"];

const EN_PRONOUNS: &[&str] = &[
    "it", "they", "them", "he", "she", "him", "themselves", "itself", "himself", "herself",
    "you", "we", "i", "us",
];

const EN_NEGATIONS: &[&str] = &["not", "never", "no"];

const EN_ADVERBS: &[&str] = &[
    "also", "only", "then", "when", "if", "as", "so", "just", "always", "already", "still",
    "more", "less", "how", "very", "etc",
];

const EN_ADJECTIVES: &[&str] = &[
    "new", "old", "main", "own", "same", "different", "unique", "complete", "personal", "public",
    "private", "online", "digital", "specific", "simple", "large", "small", "maximum", "minimum",
    "respective", "mandatory", "optional", "valid", "current",
];

const EN_MODALS: &[&str] = &[
    "must", "can", "cannot", "could", "should", "shall", "will", "would", "may", "might", "able",
    "need", "needs",
];

const EN_COPULAS: &[&str] = &["is", "are", "be", "was", "were", "been", "being"];

const EN_VERBS: &[(&str, VerbClass)] = &[
    ("have", VerbClass::Possession),
    ("contain", VerbClass::Possession),
    ("include", VerbClass::Possession),
    ("own", VerbClass::Possession),
    ("hold", VerbClass::Possession),
    ("possess", VerbClass::Possession),
    ("provide", VerbClass::Provision),
    ("enter", VerbClass::Provision),
    ("specify", VerbClass::Provision),
    ("supply", VerbClass::Provision),
    ("give", VerbClass::Provision),
    ("fill", VerbClass::Provision),
    ("input", VerbClass::Provision),
    ("inform", VerbClass::Provision),
    ("indicate", VerbClass::Provision),
    ("define", VerbClass::Provision),
    ("declare", VerbClass::Provision),
    ("inherit", VerbClass::Inheritance),
    ("extend", VerbClass::Inheritance),
    ("specialize", VerbClass::Inheritance),
    ("derive", VerbClass::Inheritance),
    ("register", VerbClass::Plain),
    ("add", VerbClass::Plain),
    ("remove", VerbClass::Plain),
    ("buy", VerbClass::Plain),
    ("purchase", VerbClass::Plain),
    ("sell", VerbClass::Plain),
    ("view", VerbClass::Plain),
    ("search", VerbClass::Plain),
    ("browse", VerbClass::Plain),
    ("create", VerbClass::Plain),
    ("edit", VerbClass::Plain),
    ("update", VerbClass::Plain),
    ("delete", VerbClass::Plain),
    ("manage", VerbClass::Plain),
    ("approve", VerbClass::Plain),
    ("reject", VerbClass::Plain),
    ("make", VerbClass::Plain),
    ("issue", VerbClass::Plain),
    ("send", VerbClass::Plain),
    ("receive", VerbClass::Plain),
    ("pay", VerbClass::Plain),
    ("book", VerbClass::Plain),
    ("reserve", VerbClass::Plain),
    ("cancel", VerbClass::Plain),
    ("write", VerbClass::Plain),
    ("publish", VerbClass::Plain),
    ("rate", VerbClass::Plain),
    ("assign", VerbClass::Plain),
    ("belong", VerbClass::Plain),
    ("borrow", VerbClass::Plain),
    ("lend", VerbClass::Plain),
    ("return", VerbClass::Plain),
    ("request", VerbClass::Plain),
    ("list", VerbClass::Plain),
    ("select", VerbClass::Plain),
    ("choose", VerbClass::Plain),
    ("print", VerbClass::Plain),
    ("generate", VerbClass::Plain),
    ("submit", VerbClass::Plain),
    ("confirm", VerbClass::Plain),
    ("validate", VerbClass::Plain),
    ("notify", VerbClass::Plain),
    ("contact", VerbClass::Plain),
    ("schedule", VerbClass::Plain),
    ("enroll", VerbClass::Plain),
    ("teach", VerbClass::Plain),
    ("attend", VerbClass::Plain),
    ("use", VerbClass::Plain),
    ("track", VerbClass::Plain),
    ("share", VerbClass::Plain),
    ("comment", VerbClass::Plain),
    ("classify", VerbClass::Plain),
    ("organize", VerbClass::Plain),
    ("store", VerbClass::Plain),
    ("place", VerbClass::Plain),
    ("access", VerbClass::Plain),
    ("check", VerbClass::Plain),
    ("supervise", VerbClass::Plain),
    ("employ", VerbClass::Plain),
    ("hire", VerbClass::Plain),
    ("deliver", VerbClass::Plain),
    ("rent", VerbClass::Plain),
    ("work", VerbClass::Plain),
    ("participate", VerbClass::Plain),
    ("reference", VerbClass::Plain),
    ("allow", VerbClass::Plain),
    ("associate", VerbClass::Plain),
    ("visit", VerbClass::Plain),
    ("follow", VerbClass::Plain),
    ("post", VerbClass::Plain),
    ("upload", VerbClass::Plain),
    ("download", VerbClass::Plain),
];

const EN_IRREGULAR_FORMS: &[(&str, VerbClass, &[&str])] = &[
    ("have", VerbClass::Possession, &["has", "had", "having"]),
    ("hold", VerbClass::Possession, &["held"]),
    ("give", VerbClass::Provision, &["gave", "given"]),
    ("buy", VerbClass::Plain, &["bought"]),
    ("sell", VerbClass::Plain, &["sold"]),
    ("make", VerbClass::Plain, &["made"]),
    ("write", VerbClass::Plain, &["wrote", "written"]),
    ("pay", VerbClass::Plain, &["paid"]),
    ("send", VerbClass::Plain, &["sent"]),
    ("choose", VerbClass::Plain, &["chose", "chosen"]),
    ("lend", VerbClass::Plain, &["lent"]),
    ("teach", VerbClass::Plain, &["taught"]),
    ("submit", VerbClass::Plain, &["submitted", "submitting"]),
    ("cancel", VerbClass::Plain, &["cancelled", "cancelling"]),
];

const EN_STOP_NOUNS: &[&str] = &[
    "system", "data", "datum", "information", "process", "way", "thing", "example", "part",
    "mean", "error", "result", "condition", "platform", "feature", "functionality",
    "possibility", "application", "option", "action", "operation", "moment", "case", "kind",
    "ability", "requirement", "interface", "software", "app", "screen", "page",
];

const EN_ATTRIBUTES: &[(&str, &str)] = &[
    ("id", "Integer"),
    ("identifier", "Integer"),
    ("code", "String"),
    ("name", "String"),
    ("surname", "String"),
    ("description", "String"),
    ("email", "String"),
    ("e-mail", "String"),
    ("phone", "String"),
    ("telephone", "String"),
    ("mobile", "String"),
    ("address", "String"),
    ("city", "String"),
    ("country", "String"),
    ("zip", "String"),
    ("postcode", "String"),
    ("date", "Date"),
    ("birthdate", "Date"),
    ("deadline", "Date"),
    ("time", "DateTime"),
    ("price", "Double"),
    ("value", "Double"),
    ("cost", "Double"),
    ("salary", "Double"),
    ("balance", "Double"),
    ("amount", "Double"),
    ("discount", "Double"),
    ("rate", "Double"),
    ("vat", "Double"),
    ("grade", "Double"),
    ("weight", "Double"),
    ("height", "Double"),
    ("total", "Double"),
    ("quantity", "Integer"),
    ("stock", "Integer"),
    ("age", "Integer"),
    ("duration", "Integer"),
    ("year", "Integer"),
    ("level", "Integer"),
    ("score", "Integer"),
    ("rating", "Integer"),
    ("status", "String"),
    ("state", "String"),
    ("type", "String"),
    ("active", "Boolean"),
    ("available", "Boolean"),
    ("title", "String"),
    ("password", "String"),
    ("username", "String"),
    ("login", "String"),
    ("note", "String"),
    ("reference", "String"),
    ("isbn", "String"),
    ("number", "String"),
    ("gender", "String"),
    ("nationality", "String"),
    ("location", "String"),
    ("photo", "String"),
    ("image", "String"),
    ("url", "String"),
    ("website", "String"),
    ("version", "String"),
    ("content", "String"),
    ("text", "String"),
];

const EN_INVARIANT_NOUNS: &[&str] = &["status", "bus", "news", "series", "species", "campus"];

const EN_SURFACE_RULES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("s", ""),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portuguese_conjugation() {
        let forms = portuguese_forms("adicionar");
        assert!(forms.contains(&"adiciona".to_string()));
        assert!(forms.contains(&"adicionando".to_string()));
        assert!(forms.contains(&"adicionou".to_string()));

        let model = LanguageModel::portuguese();
        let entry = model.verb("fornecendo").unwrap();
        assert_eq!(entry.lemma, "fornecer");
        assert_eq!(entry.class, VerbClass::Provision);
        assert_eq!(entry.form, VerbForm::Gerund);
        assert_eq!(model.verb("tem").unwrap().class, VerbClass::Possession);
        assert_eq!(model.verb("registar").unwrap().form, VerbForm::Infinitive);
    }

    #[test]
    fn test_closed_classes_win_over_verb_forms() {
        let model = LanguageModel::portuguese();
        // "da" would otherwise be a form of a verb ending in -ar
        assert!(matches!(
            model.closed_class("da"),
            Some(WordClass::Contraction { .. })
        ));
        assert!(model.verb("pode").is_none());
        assert_eq!(model.closed_class("pode"), Some(WordClass::Modal));
    }

    #[test]
    fn test_english_inflection() {
        assert_eq!(
            english_forms("place"),
            vec!["place", "places", "placed", "placing"]
        );
        assert_eq!(
            english_forms("classify"),
            vec!["classify", "classifies", "classified", "classifying"]
        );
        let model = LanguageModel::english();
        assert_eq!(model.verb("has").unwrap().lemma, "have");
        assert_eq!(model.verb("bought").unwrap().lemma, "buy");
    }

    #[test]
    fn test_attribute_types() {
        let model = LanguageModel::portuguese();
        assert_eq!(model.attribute_type("Email"), Some("String"));
        assert_eq!(model.attribute_type("data de nascimento"), Some("Date"));
        assert_eq!(model.attribute_type("preço"), Some("Double"));
        assert_eq!(model.attribute_type("produto"), None);

        let en = LanguageModel::english();
        assert_eq!(en.attribute_type("delivery address"), Some("String"));
    }

    #[test]
    fn test_entity_names_are_singular() {
        let model = LanguageModel::portuguese();
        assert_eq!(model.entity_name("produtos"), "Produto");
        assert_eq!(model.entity_name("Informações"), "Informação");
        assert_eq!(model.entity_name("carrinho de compras"), "Carrinho de compras");
        assert_eq!(model.entity_name("país"), "País");

        let en = LanguageModel::english();
        assert_eq!(en.entity_name("order items"), "Order item");
        assert_eq!(en.entity_name("categories"), "Category");
    }

    #[test]
    fn test_stop_nouns() {
        let model = LanguageModel::portuguese();
        assert!(model.is_stop_noun("sistema"));
        assert!(model.is_stop_noun("Dados"));
        assert!(!model.is_stop_noun("cliente"));
    }

    #[test]
    fn test_overrides_extend_vocabulary() {
        let file: LexiconFile = toml::from_str(
            r#"
            [pt]
            stop_nouns = ["modulo"]

            [pt.attributes]
            matricula = "String"
            cor = "String"

            [[pt.verbs]]
            lemma = "aprovisionar"
            class = "plain"
            "#,
        )
        .unwrap();

        let models = LanguageModels::load_with(&file);
        let pt = models.get(Language::Pt);
        assert!(pt.is_stop_noun("módulos"));
        assert_eq!(pt.attribute_type("cor"), Some("String"));
        assert_eq!(pt.verb("aprovisiona").unwrap().lemma, "aprovisionar");
    }

    #[test]
    fn test_global_models_are_shared() {
        let a = LanguageModels::global();
        let b = LanguageModels::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
