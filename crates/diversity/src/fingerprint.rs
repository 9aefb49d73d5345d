//! Coarse content fingerprints for near-duplicate detection.
//!
//! Two texts share a fingerprint when their first few content keywords are
//! the same set, regardless of order, punctuation, casing or filler words.

const MIN_TOKEN_CHARS: usize = 3;
const MAX_KEYWORDS: usize = 15;

/// Function words and intensifiers longer than three characters.
const FILLER_WORDS: &[&str] = &[
    "about", "also", "been", "beautifully", "each", "every", "from", "have", "into", "just",
    "more", "most", "onto", "over", "perfectly", "quite", "really", "simply", "some", "than",
    "that", "their", "them", "then", "there", "these", "they", "this", "those", "truly", "very",
    "were", "what", "when", "where", "which", "while", "will", "with", "your",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Sorted content keywords that feed the fingerprint.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        let mut keywords: Vec<String> = cleaned
            .split_whitespace()
            .filter(|w| w.chars().count() > MIN_TOKEN_CHARS && !FILLER_WORDS.contains(w))
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect();
        keywords.sort();
        keywords
    }

    pub fn fingerprint(&self, text: &str) -> u32 {
        let joined = self.keywords(text).concat();
        let mut hash: i32 = 0;
        for unit in joined.encode_utf16() {
            hash = hash
                .wrapping_shl(5)
                .wrapping_sub(hash)
                .wrapping_add(i32::from(unit));
        }
        hash.unsigned_abs()
    }
}
