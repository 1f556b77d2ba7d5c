//! Morphological tokenization.
//!
//! The analysis only needs base forms and the major part-of-speech category
//! of each token, so the dependency on a concrete analyzer is kept behind
//! [`MorphologicalTokenizer`]. [`LinderaTokenizer`] is the default
//! implementation, backed by the IPADIC dictionary embedded in Lindera.

use lindera::{
    dictionary::{DictionaryKind, load_dictionary_from_kind},
    mode::Mode,
    segmenter::Segmenter,
    tokenizer::Tokenizer,
};
use thiserror::Error;

use crate::error::AnalysisError;

/// IPADIC major categories counted as content words.
pub const CONTENT_POS: [&str; 3] = ["名詞", "動詞", "形容詞"];

/// Index of the base form in IPADIC token details.
const IPADIC_BASE_FORM: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tokenization failed: {0}")]
pub struct TokenizeError(pub String);

/// One token: its dictionary form and major part-of-speech category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Morpheme {
    pub base_form: String,
    pub pos: String,
}

impl Morpheme {
    pub fn new(base_form: impl Into<String>, pos: impl Into<String>) -> Self {
        Morpheme {
            base_form: base_form.into(),
            pos: pos.into(),
        }
    }

    /// Noun, verb or adjective.
    pub fn is_content_word(&self) -> bool {
        CONTENT_POS.contains(&self.pos.as_str())
    }
}

/// Anything that can split text into (base form, POS) pairs.
///
/// Implementations must return the same tokens for the same input within a
/// process run. The analysis only calls `tokenize` through a shared reference.
pub trait MorphologicalTokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<Morpheme>, TokenizeError>;
}

/// Lindera with the embedded IPADIC dictionary, normal segmentation mode.
pub struct LinderaTokenizer {
    tokenizer: Tokenizer,
}

impl LinderaTokenizer {
    pub fn new() -> Result<Self, AnalysisError> {
        let dictionary = load_dictionary_from_kind(DictionaryKind::IPADIC)
            .map_err(|e| AnalysisError::TokenizerInit(e.to_string()))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        Ok(LinderaTokenizer {
            tokenizer: Tokenizer::new(segmenter),
        })
    }
}

impl MorphologicalTokenizer for LinderaTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<Morpheme>, TokenizeError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let mut tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| TokenizeError(e.to_string()))?;

        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens.iter_mut() {
            let details = token.details();
            let Some(pos) = details.first().map(|p| p.to_string()) else {
                continue;
            };
            let lemma = details
                .get(IPADIC_BASE_FORM)
                .filter(|b| !b.is_empty() && **b != "*")
                .map(|b| b.to_string());
            let base_form = lemma.unwrap_or_else(|| token.text.to_string());
            out.push(Morpheme { base_form, pos });
        }
        Ok(out)
    }
}

/// Tokenize and keep only content words, returning their base forms.
pub fn content_words<T: MorphologicalTokenizer + ?Sized>(
    tokenizer: &T,
    text: &str,
) -> Result<Vec<String>, TokenizeError> {
    Ok(tokenizer
        .tokenize(text)?
        .into_iter()
        .filter(Morpheme::is_content_word)
        .map(|m| m.base_form)
        .collect())
}
