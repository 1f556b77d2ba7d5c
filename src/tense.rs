//! Surface-form tense classification.
//!
//! A sentence is past tense when, after dropping trailing characters that are
//! neither kana nor kanji (punctuation, brackets, latin letters, whitespace),
//! it ends with one of [`PAST_MARKERS`]. This is a heuristic on the written
//! form only; no part-of-speech information is consulted.
//!
//! Known misses: past forms ending in `だ` after a sound change (`読んだ`,
//! `泳いだ`) count as present/future, as do conjectures like `でしょう` and
//! nominal sentences.

use std::fmt;

use serde::Serialize;

/// Past-tense suffixes, checked in order. Longer forms come first so that
/// [`past_marker`] reports the most specific one.
pub const PAST_MARKERS: [&str; 4] = ["だった", "ました", "でした", "た"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tense {
    Past,
    PresentFuture,
}

impl Tense {
    /// Display label as used in the exported tables.
    pub fn label(self) -> &'static str {
        match self {
            Tense::Past => "過去形",
            Tense::PresentFuture => "現在・未来形",
        }
    }
}

impl fmt::Display for Tense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A trimmed sentence with its tense, fixed at classification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sentence {
    text: String,
    tense: Tense,
}

impl Sentence {
    /// Trim `text` and classify it; `None` when nothing is left.
    /// # Example
    /// ```
    /// use jp_tense_style::{Sentence, Tense};
    /// let s = Sentence::new("  駅に着きました ").unwrap();
    /// assert_eq!(s.text(), "駅に着きました");
    /// assert_eq!(s.tense(), Tense::Past);
    /// assert!(Sentence::new(" \n").is_none());
    /// ```
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        let trimmed_len = text.trim().len();
        if trimmed_len == 0 {
            return None;
        }
        let text = if trimmed_len == text.len() {
            text
        } else {
            text.trim().to_string()
        };
        let tense = classify(&text);
        Some(Sentence { text, tense })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tense(&self) -> Tense {
        self.tense
    }
}

/// Hiragana ぁ-ん, katakana ァ-ヶ and the CJK block 一-龠.
fn is_core_char(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{3093}' | '\u{30A1}'..='\u{30F6}' | '\u{4E00}'..='\u{9FA0}')
}

/// Returns the past marker ending the sentence, if any.
/// # Example
/// ```
/// use jp_tense_style::past_marker;
/// assert_eq!(past_marker("駅に着きました」"), Some("ました"));
/// assert_eq!(past_marker("駅に着きます"), None);
/// ```
pub fn past_marker(sentence: &str) -> Option<&'static str> {
    let core = sentence.trim_end_matches(|c: char| !is_core_char(c));
    PAST_MARKERS.iter().copied().find(|m| core.ends_with(m))
}

pub fn classify(sentence: &str) -> Tense {
    match past_marker(sentence) {
        Some(_) => Tense::Past,
        None => Tense::PresentFuture,
    }
}

/// Classify every segmented sentence, preserving order. Blank entries are
/// dropped.
pub fn classify_all(sentences: Vec<String>) -> Vec<Sentence> {
    sentences.into_iter().filter_map(Sentence::new).collect()
}
