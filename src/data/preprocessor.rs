// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans raw social-media posts before tokenisation.
//
// Posts are full of things that carry no signal for either
// task but eat into the 128-token budget:
//   - links (http://…, https://…, www.…)
//   - @mentions and #hashtags
//   - punctuation, emoji and digits
//   - function words ("the", "is", "and", …)
//
// Cleaning steps (applied in order):
//   1. Lowercase
//   2. Remove URLs
//   3. Remove @mentions
//   4. Remove #hashtags
//   5. Remove every character that is not a word char or whitespace
//   6. Remove digit runs
//   7. Split fused words (cannot, gonna, gotta, wanna, gimme,
//      lemme) into their two halves, then split on whitespace
//   8. Drop English stopwords
//   9. Join the survivors with single spaces
//
// Steps 3-4 must run before step 5, otherwise the '@' and '#'
// markers disappear and the handle text survives as a word.
//
// Step 7 follows the Penn Treebank word tokenizer. After step 5
// only word chars and whitespace remain, so a trailing `\b` is
// the same as "followed by whitespace or the end of the text".

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::data::stopwords;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("url regex"));

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\w+").expect("mention regex"));

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("hashtag regex"));

static PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("punctuation regex"));

static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digits regex"));

static CONTRACTIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(can)(not)\b|\b(gim)(me)\b|\b(gon)(na)\b|\b(got)(ta)\b|\b(lem)(me)\b|\b(wan)(na)\b",
    )
    .expect("contractions regex")
});

pub struct Preprocessor {
    stopwords: HashSet<String>,
}

impl Preprocessor {
    /// Preprocessor with the standard English stopword list
    pub fn new() -> Self {
        Self {
            stopwords: stopwords::ENGLISH.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Add corpus-specific stopwords on top of the English list.
    /// Words are lowercased so they match the cleaned text.
    pub fn with_extra_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    /// Clean one post. `None` (a missing CSV cell) yields an empty string.
    pub fn clean_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.clean(t)).unwrap_or_default()
    }

    /// Clean a raw post and return the space-joined surviving words.
    pub fn clean(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }

    /// Run steps 1-8 and return the surviving words in order.
    pub fn tokens(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        let text = URL_RE.replace_all(&text, "");
        let text = MENTION_RE.replace_all(&text, "");
        let text = HASHTAG_RE.replace_all(&text, "");
        let text = PUNCT_RE.replace_all(&text, "");
        let text = DIGITS_RE.replace_all(&text, "");
        let text = CONTRACTIONS_RE.replace_all(&text, |caps: &Captures| {
            caps.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        });

        text.split_whitespace()
            .filter(|w| !self.stopwords.contains(*w))
            .map(str::to_string)
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_drops_stopwords() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("The Government IS lying"), "government lying");
    }

    #[test]
    fn test_removes_urls() {
        let p = Preprocessor::new();
        assert_eq!(
            p.clean("read https://t.co/abc123 and www.fake.example now"),
            "read"
        );
        assert_eq!(p.clean("see http://x.y/z?q=1"), "see");
    }

    #[test]
    fn test_removes_mentions_and_hashtags_entirely() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("@user_1 shame on #BadPeople today"), "shame today");
    }

    #[test]
    fn test_strips_punctuation_and_digits() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Riots!!! 2024... 100s injured?!"), "riots injured");
    }

    #[test]
    fn test_contractions_lose_apostrophe_and_survive() {
        // "don't" becomes "dont", which is not in the stopword list
        let p = Preprocessor::new();
        assert_eq!(p.clean("Don't trust them"), "dont trust");
    }

    #[test]
    fn test_cannot_splits_into_two_stopwords() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("I cannot believe this"), "believe");
        assert_eq!(p.clean("Cannot!"), "");
    }

    #[test]
    fn test_fused_words_split_in_two() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("we gonna win"), "gon na win");
        assert_eq!(p.clean("gotta go"), "got ta go");
        assert_eq!(p.clean("gimme lemme"), "gim lem");
        assert_eq!(p.clean("wanna"), "wan na");
    }

    #[test]
    fn test_fused_words_only_match_whole_words() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("cannoteers gonnabe wanna_x"), "cannoteers gonnabe wanna_x");
    }

    #[test]
    fn test_keeps_unicode_letters() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Naïve café visitors"), "naïve café visitors");
    }

    #[test]
    fn test_underscore_is_a_word_char() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("snake_case stays"), "snake_case stays");
    }

    #[test]
    fn test_only_noise_becomes_empty() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("@a #b http://c 123 the and"), "");
    }

    #[test]
    fn test_collapses_whitespace() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  fake \n\n news\t spreads "), "fake news spreads");
    }

    #[test]
    fn test_missing_text_is_empty() {
        let p = Preprocessor::new();
        assert_eq!(p.clean_opt(None), "");
        assert_eq!(p.clean_opt(Some("Hello World")), "hello world");
    }

    #[test]
    fn test_extra_stopwords() {
        let p = Preprocessor::new().with_extra_stopwords(["RT", "amp"]);
        assert_eq!(p.clean("RT this is amp news"), "news");
    }

    #[test]
    fn test_tokens_preserve_order() {
        let p = Preprocessor::new();
        assert_eq!(p.tokens("zebra apple mango"), vec!["zebra", "apple", "mango"]);
    }
}
