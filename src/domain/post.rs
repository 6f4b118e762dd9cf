// ============================================================
// Layer 3 — Post Domain Type
// ============================================================
// One row of the Faux-Hate corpus: a short post together with
// its two binary annotations.
//
//   hate — the post is hateful towards a person or group
//   fake — the post carries fabricated or misleading claims
//
// The two labels are independent; a post can be both, either
// or neither.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post text. Raw when loaded, cleaned after preprocessing.
    pub text: String,

    /// Hate-speech annotation
    pub hate: bool,

    /// Fake-news annotation
    pub fake: bool,
}

impl Post {
    pub fn new(text: impl Into<String>, hate: bool, fake: bool) -> Self {
        Self { text: text.into(), hate, fake }
    }

    /// Same labels, different text. Used after cleaning.
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self { text: text.into(), hate: self.hate, fake: self.fake }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_text_keeps_labels() {
        let p = Post::new("Raw TEXT!!", false, true).with_text("raw text");
        assert_eq!(p.text, "raw text");
        assert!(!p.hate);
        assert!(p.fake);
    }
}
