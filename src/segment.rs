//! Sentence segmentation on Japanese terminal punctuation.

/// Full-width sentence terminators: period, exclamation and question mark.
pub const TERMINATORS: [char; 3] = ['。', '！', '？'];

/// Split raw text into trimmed, non-empty sentences.
///
/// Delimiters are dropped. Text without any terminator yields a single
/// sentence (the trimmed input); empty input yields nothing.
/// # Example
/// ```
/// use jp_tense_style::segment;
/// let s = segment("今日は晴れです。  明日は？ ");
/// assert_eq!(s, vec!["今日は晴れです".to_string(), "明日は".to_string()]);
/// ```
pub fn segment(text: &str) -> Vec<String> {
    text.split(&TERMINATORS[..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
