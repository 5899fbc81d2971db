//! Comment text normalization ahead of classification.
//!
//! Strips markdown links, URLs, and punctuation, expands emoji glyphs
//! into their textual name tokens, and keeps only comments detected as
//! English. Comments that fail language detection are dropped silently;
//! that is acceptable data loss, not an error.

use regex::Regex;
use tracing::trace;
use whatlang::Lang;

/// Normalizes raw comment bodies into lowercased, language-filtered
/// strings suitable for a text-classification batch.
pub struct TextNormalizer {
    markdown_link: Regex,
    url: Regex,
    non_word: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    pub fn new() -> Self {
        Self {
            markdown_link: Regex::new(r"\[[^\]]*\]\([^)]*\)").unwrap(),
            url: Regex::new(r"http\S+").unwrap(),
            non_word: Regex::new(r"\W").unwrap(),
        }
    }

    /// Normalize a batch of raw comments.
    ///
    /// Output order follows input order, so downstream sentiment and
    /// emotion batches stay index-aligned with each other. Comments
    /// dropped by the language filter contribute to nothing downstream,
    /// including the distribution denominator.
    pub fn normalize_all(&self, comments: &[String]) -> Vec<String> {
        comments
            .iter()
            .filter_map(|raw| self.normalize_one(raw))
            .collect()
    }

    /// Normalize a single comment, or `None` when it is not English.
    fn normalize_one(&self, raw: &str) -> Option<String> {
        let text = self.markdown_link.replace_all(raw, " ");
        let text = self.url.replace_all(&text, " ");
        // Expand emoji before the word-character pass so their name
        // tokens survive it.
        let text = demojize(&text);
        let text = self.non_word.replace_all(&text, " ");

        // Language detection runs on the cleaned text. No result (for
        // instance an empty string) counts as a failed detection.
        match whatlang::detect(&text) {
            Some(info) if info.lang() == Lang::Eng => {}
            other => {
                trace!(lang = ?other.map(|i| i.lang()), "dropping non-English comment");
                return None;
            }
        }

        Some(text.trim().to_lowercase())
    }
}

/// Replace each emoji glyph with `:name:`, underscores joining the name
/// words (😀 → `:grinning_face:`). The colon delimiters are non-word
/// characters and fall out in the following pass, leaving ordinary word
/// tokens. Multi-scalar sequences resolve per scalar; unrecognized
/// scalars pass through unchanged.
fn demojize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        match emojis::get(ch.encode_utf8(&mut buf)) {
            Some(emoji) => {
                out.push(':');
                for word in emoji.name().split_whitespace() {
                    if !out.ends_with(':') {
                        out.push('_');
                    }
                    out.push_str(word);
                }
                out.push(':');
            }
            None => out.push(ch),
        }
    }
    out
}
