//! Sentence-final form extraction.
//!
//! An [`EndingPolicy`] is an ordered list of candidate suffixes, optionally
//! restricted to a trailing character window. The first candidate that ends
//! the sentence wins, so a policy must list longer forms before any shorter
//! form that is a suffix of them; [`EndingPolicy::new`] enforces this.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::frequency::FrequencyTable;
use crate::tense::Sentence;

/// Canonical set: polite and plain copula/verb endings.
pub const CANONICAL_ENDINGS: [&str; 10] = [
    "となります",
    "になります",
    "いたします",
    "である",
    "でした",
    "だった",
    "ました",
    "ます",
    "です",
    "だ",
];

/// Extended set: canonical plus plain finite verb forms.
pub const EXTENDED_ENDINGS: [&str; 13] = [
    "となります",
    "になります",
    "いたします",
    "である",
    "でした",
    "だった",
    "ました",
    "ます",
    "です",
    "した",
    "する",
    "なる",
    "だ",
];

/// Trailing window used by the extended preset.
pub const EXTENDED_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndingPolicy {
    patterns: Vec<String>,
    window: Option<usize>,
}

impl EndingPolicy {
    /// Build a policy, rejecting orderings where a shorter form would mask a
    /// longer one listed after it.
    pub fn new<S: Into<String>>(
        patterns: impl IntoIterator<Item = S>,
        window: Option<usize>,
    ) -> Result<Self, AnalysisError> {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        if patterns.is_empty() {
            return Err(AnalysisError::InvalidPolicy("no patterns".into()));
        }
        if window == Some(0) {
            return Err(AnalysisError::InvalidPolicy("window must be positive".into()));
        }
        for (i, p) in patterns.iter().enumerate() {
            if p.is_empty() {
                return Err(AnalysisError::InvalidPolicy("empty pattern".into()));
            }
            for later in &patterns[i + 1..] {
                if later == p {
                    return Err(AnalysisError::InvalidPolicy(format!("duplicate {p:?}")));
                }
                if later.ends_with(p.as_str()) {
                    return Err(AnalysisError::InvalidPolicy(format!(
                        "{p:?} masks {later:?}; list {later:?} first"
                    )));
                }
            }
        }
        Ok(EndingPolicy { patterns, window })
    }

    pub fn canonical() -> Self {
        EndingPolicy {
            patterns: CANONICAL_ENDINGS.iter().map(|s| s.to_string()).collect(),
            window: None,
        }
    }

    pub fn extended() -> Self {
        EndingPolicy {
            patterns: EXTENDED_ENDINGS.iter().map(|s| s.to_string()).collect(),
            window: Some(EXTENDED_WINDOW),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn window(&self) -> Option<usize> {
        self.window
    }

    /// Return the sentence-final form, or `None` when no candidate matches.
    /// # Example
    /// ```
    /// use jp_tense_style::EndingPolicy;
    /// let policy = EndingPolicy::canonical();
    /// assert_eq!(policy.extract("昨日学校に行きました"), Some("ました"));
    /// assert_eq!(policy.extract("明日は晴れるでしょう"), None);
    /// ```
    pub fn extract(&self, sentence: &str) -> Option<&str> {
        let tail = match self.window {
            Some(n) => tail_chars(sentence, n),
            None => sentence,
        };
        self.patterns
            .iter()
            .find(|p| tail.ends_with(p.as_str()))
            .map(String::as_str)
    }
}

impl Default for EndingPolicy {
    fn default() -> Self {
        EndingPolicy::canonical()
    }
}

/// Last `n` characters of `s` (all of `s` if shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

/// An extracted ending and the index of the sentence it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndingRecord {
    pub ending: String,
    pub sentence: usize,
}

/// Extract endings from all sentences; sentences without a match are skipped.
pub fn extract_endings(sentences: &[Sentence], policy: &EndingPolicy) -> Vec<EndingRecord> {
    sentences
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            policy.extract(s.text()).map(|e| EndingRecord {
                ending: e.to_string(),
                sentence: i,
            })
        })
        .collect()
}

pub fn ending_frequencies(records: &[EndingRecord]) -> FrequencyTable {
    FrequencyTable::count(records.iter().map(|r| r.ending.as_str()))
}
