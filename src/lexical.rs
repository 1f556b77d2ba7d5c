//! Tense-conditioned content-word frequencies.

use log::{debug, warn};
use serde::Serialize;

use crate::frequency::FrequencyTable;
use crate::tense::{Sentence, Tense};
use crate::tokenizer::{MorphologicalTokenizer, content_words};

/// Number of words kept per tense unless configured otherwise.
pub const DEFAULT_TOP_N: usize = 20;

/// Most frequent content words for each tense.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TenseWordFrequencies {
    pub past: FrequencyTable,
    pub present_future: FrequencyTable,
}

impl TenseWordFrequencies {
    pub fn for_tense(&self, tense: Tense) -> &FrequencyTable {
        match tense {
            Tense::Past => &self.past,
            Tense::PresentFuture => &self.present_future,
        }
    }
}

/// Count content-word base forms of the sentences with the given tense.
///
/// A sentence the tokenizer rejects is logged and contributes no tokens.
pub fn words_for_tense<T: MorphologicalTokenizer + ?Sized>(
    sentences: &[Sentence],
    tense: Tense,
    tokenizer: &T,
    top_n: usize,
) -> FrequencyTable {
    let mut words: Vec<String> = Vec::new();
    let mut partition = 0usize;
    for sentence in sentences.iter().filter(|s| s.tense() == tense) {
        partition += 1;
        match content_words(tokenizer, sentence.text()) {
            Ok(mut w) => words.append(&mut w),
            Err(e) => warn!("skipping sentence {:?}: {}", sentence.text(), e),
        }
    }
    debug!(
        "{}: {} sentences, {} content words",
        tense,
        partition,
        words.len()
    );
    FrequencyTable::count(&words).top(top_n)
}

pub fn word_frequencies<T: MorphologicalTokenizer + ?Sized>(
    sentences: &[Sentence],
    tokenizer: &T,
    top_n: usize,
) -> TenseWordFrequencies {
    TenseWordFrequencies {
        past: words_for_tense(sentences, Tense::Past, tokenizer, top_n),
        present_future: words_for_tense(sentences, Tense::PresentFuture, tokenizer, top_n),
    }
}
