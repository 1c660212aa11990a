//! Data types shared by the preparation services.

use std::collections::BTreeSet;

use unicode_normalization::UnicodeNormalization;

/// One (image path, transcription) pair from the labels CSV.
///
/// Both fields are trimmed and NFC-normalized on construction so every
/// downstream artifact agrees on a single canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRecord {
    /// Image path relative to the extracted dataset root.
    pub path: String,
    /// Transcription text.
    pub text: String,
}

impl LabelRecord {
    /// Build a record from raw CSV fields.
    pub fn new(path: &str, text: &str) -> Self {
        Self {
            path: path.trim().nfc().collect(),
            text: text.trim().nfc().collect(),
        }
    }

    /// Serialize as a label-file line (tab-separated, no trailing newline).
    pub fn to_line(&self) -> String {
        format!("{}\t{}", self.path, self.text)
    }

    /// Parse a label-file line back into a record.
    ///
    /// Returns `None` when the line has no tab separator. The label may
    /// itself contain tabs; only the first one splits the fields.
    pub fn parse_line(line: &str) -> Option<Self> {
        let (path, text) = line.split_once('\t')?;
        Some(Self {
            path: path.to_string(),
            text: text.to_string(),
        })
    }
}

/// Accumulates the distinct characters seen across label texts.
///
/// Backed by a `BTreeSet` so the dictionary is emitted in Unicode code-point
/// order, stable run-to-run.
#[derive(Debug, Default)]
pub struct CharDictionary {
    chars: BTreeSet<char>,
}

impl CharDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every character of `text`.
    pub fn observe(&mut self, text: &str) {
        for ch in text.chars() {
            self.chars.insert(ch);
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    /// Dictionary file contents: one character per line.
    pub fn to_contents(&self) -> String {
        let mut out = String::with_capacity(self.chars.len() * 2);
        for ch in &self.chars {
            out.push(*ch);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_record_normalizes_to_nfc() {
        // "e" + combining acute (NFD) composes to U+00E9
        let record = LabelRecord::new(" imgs/se\u{301}ance.jpg ", "se\u{301}ance");
        assert_eq!(record.path, "imgs/s\u{e9}ance.jpg");
        assert_eq!(record.text, "s\u{e9}ance");
    }

    #[test]
    fn test_label_record_line_round_trip() {
        let record = LabelRecord::new("imgs/0001.jpg", "Hello");
        let line = record.to_line();
        assert_eq!(line, "imgs/0001.jpg\tHello");
        assert_eq!(LabelRecord::parse_line(&line).unwrap(), record);
    }

    #[test]
    fn test_parse_line_splits_on_first_tab() {
        let record = LabelRecord::parse_line("a.jpg\tleft\tright").unwrap();
        assert_eq!(record.path, "a.jpg");
        assert_eq!(record.text, "left\tright");
    }

    #[test]
    fn test_parse_line_rejects_untabbed() {
        assert!(LabelRecord::parse_line("no separator here").is_none());
    }

    #[test]
    fn test_dictionary_is_sorted_and_unique() {
        let mut dict = CharDictionary::new();
        dict.observe("Hello");
        dict.observe("World");
        assert_eq!(dict.len(), 7);
        assert_eq!(dict.to_contents(), "H\nW\nd\ne\nl\no\nr\n");
        assert!(dict.contains('H'));
        assert!(!dict.contains('h'));
    }

    #[test]
    fn test_dictionary_empty_label_adds_nothing() {
        let mut dict = CharDictionary::new();
        dict.observe("");
        assert!(dict.is_empty());
        assert_eq!(dict.to_contents(), "");
    }
}
