use crate::domain::model::RequirementUnit;
use crate::utils::error::{Req2DomError, Result};
use regex::Regex;

/// Short alphabetic prefix, number, separator: `RF01:`, `RNF-2.`, `UC_12)`.
pub const DEFAULT_CODE_PATTERN: &str =
    r"\b(?P<code>(?P<prefix>[A-Z]{1,5})[-_]?(?P<number>\d{1,5}))\s*[:.)\-–]\s*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentationMode {
    Coded,
    Sentence,
}

#[derive(Debug, Clone)]
pub struct Segmentation {
    pub mode: SegmentationMode,
    pub units: Vec<RequirementUnit>,
}

/// Splits raw requirements text into atomic requirement units.
#[derive(Debug, Clone)]
pub struct Segmenter {
    code_pattern: Regex,
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            code_pattern: Regex::new(DEFAULT_CODE_PATTERN).expect("default code pattern is valid"),
        }
    }

    pub fn with_code_pattern(pattern: &str) -> Result<Self> {
        crate::utils::validation::validate_code_pattern("segmenter.code_pattern", pattern)?;
        let code_pattern = Regex::new(pattern).map_err(|e| Req2DomError::Config {
            message: format!("Invalid requirement code pattern: {}", e),
        })?;
        Ok(Self { code_pattern })
    }

    pub fn segment(&self, text: &str) -> Result<Segmentation> {
        if text.trim().is_empty() {
            return Err(Req2DomError::EmptyInput);
        }

        let coded = self.segment_coded(text);
        let segmentation = if coded.is_empty() {
            let units = split_sentences(text)
                .into_iter()
                .enumerate()
                .map(|(index, sentence)| RequirementUnit::new(index, None, sentence))
                .collect();
            Segmentation {
                mode: SegmentationMode::Sentence,
                units,
            }
        } else {
            Segmentation {
                mode: SegmentationMode::Coded,
                units: coded,
            }
        };

        tracing::debug!(
            "✂️ Segmented {} chars into {} units ({:?} mode)",
            text.len(),
            segmentation.units.len(),
            segmentation.mode
        );
        Ok(segmentation)
    }

    fn segment_coded(&self, text: &str) -> Vec<RequirementUnit> {
        // (code, prefix, number, text start, code start)
        let mut boundaries = Vec::new();
        let mut last_end = None;
        for caps in self.code_pattern.captures_iter(text) {
            let (Some(prefix), Some(number), Some(whole)) =
                (caps.name("prefix"), caps.name("number"), caps.get(0))
            else {
                continue;
            };
            // 沒有 code 群組時，以 prefix 到 number 的範圍作為編號
            let (code, code_start) = match caps.name("code") {
                Some(code) => (code.as_str().to_string(), code.start()),
                None => (
                    text[prefix.start()..number.end()].to_string(),
                    prefix.start(),
                ),
            };
            // `MP3.` 這類句中縮寫不是需求編號
            if last_end != Some(code_start) && !at_boundary(text, code_start) {
                tracing::trace!("Ignoring '{}' inside a sentence", code);
                continue;
            }
            last_end = Some(whole.end());
            boundaries.push((
                code.replace([' ', '_'], ""),
                prefix.as_str().to_string(),
                number.as_str().parse::<u64>().unwrap_or(u64::MAX),
                whole.end(),
                code_start,
            ));
        }

        if boundaries.is_empty() {
            return Vec::new();
        }

        let preamble = text[..boundaries[0].4].trim();
        let mut pieces: Vec<(String, String, u64, String)> = Vec::with_capacity(boundaries.len());
        for (i, (code, prefix, number, start, _)) in boundaries.iter().enumerate() {
            let end = boundaries
                .get(i + 1)
                .map(|next| next.4)
                .unwrap_or(text.len());
            let body = text[*start..end].trim();
            let body = if i == 0 && !preamble.is_empty() {
                format!("{} {}", preamble, body).trim_end().to_string()
            } else {
                body.to_string()
            };
            pieces.push((code.clone(), prefix.clone(), *number, body));
        }

        // 以需求編號排序（穩定排序保留同號的原始順序）
        pieces.sort_by(|a, b| (&a.1, a.2).cmp(&(&b.1, b.2)));

        pieces
            .into_iter()
            .enumerate()
            .map(|(index, (code, _, _, body))| {
                if body.is_empty() {
                    tracing::warn!("⚠️ Requirement {} has no text", code);
                }
                RequirementUnit::new(index, Some(code), body)
            })
            .collect()
    }
}

/// A code starts a requirement only at the start of a line or after
/// sentence-ending punctuation.
fn at_boundary(text: &str, start: usize) -> bool {
    let before = &text[..start];
    let line = before.rsplit('\n').next().unwrap_or("");
    if line.trim().is_empty() {
        return true;
    }
    matches!(before.trim_end().chars().last(), Some('.' | '!' | '?' | ';'))
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Splits on terminal punctuation followed by whitespace and an upper-case
/// letter, on blank lines and on list bullets. Never returns empty pieces and
/// keeps a trailing sentence without terminal punctuation.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];

        if matches!(c, '.' | '!' | '?') {
            // consume a run of terminal punctuation
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            let mut k = j;
            while k < chars.len() && chars[k].1.is_whitespace() {
                k += 1;
            }
            if k > j && k < chars.len() && chars[k].1.is_uppercase() {
                let end = chars.get(j).map(|(p, _)| *p).unwrap_or(text.len());
                push_piece(&mut sentences, &text[start..end]);
                start = chars[k].0;
                i = k;
                continue;
            }
            i = j;
            continue;
        }

        if c == '\n' {
            let mut k = i + 1;
            let mut blank_line = false;
            while k < chars.len() && chars[k].1.is_whitespace() {
                if chars[k].1 == '\n' {
                    blank_line = true;
                }
                k += 1;
            }
            let bullet = k < chars.len()
                && matches!(chars[k].1, '-' | '*' | '•')
                && chars.get(k + 1).map(|(_, c)| c.is_whitespace()).unwrap_or(false);
            if blank_line || bullet {
                push_piece(&mut sentences, &text[start..pos]);
                start = if bullet {
                    chars.get(k + 1).map(|(p, _)| *p).unwrap_or(text.len())
                } else {
                    chars.get(k).map(|(p, _)| *p).unwrap_or(text.len())
                };
                i = if bullet { k + 1 } else { k };
                continue;
            }
        }

        i += 1;
    }

    push_piece(&mut sentences, &text[start..]);
    sentences
}

fn push_piece(out: &mut Vec<String>, piece: &str) {
    let trimmed = piece
        .trim()
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
        .trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
