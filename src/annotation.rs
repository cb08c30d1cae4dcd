//! Per-field annotation strings.
//!
//! A field carries one raw tag such as `"text, hello"`. Tokens are split on
//! commas and trimmed of spaces and tabs. Case is kept, so `Text` is not `text`.
use indexmap::IndexSet;

// ------------------------------- Policy ---------------------------------- //

/// Drop the field from the mapping.
pub const EXCLUDE_TOKEN: &str = "-";
/// Map a string (or the string elements of an array) as full-text `text`.
pub const TEXT_TOKEN: &str = "text";

const TOKEN_SEPARATOR: char = ',';
const TRIM_CHARS: [char; 2] = [' ', '\t'];

/// What to do with empty tokens, e.g. the one produced by an empty tag.
///
/// Splitting `""` yields one empty segment. `Keep` stores it as the token
/// `""`; `Drop` discards every empty token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EmptyTokens {
    #[default]
    Keep,
    Drop,
}

// ------------------------------- Types ----------------------------------- //

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    tokens: IndexSet<String>,
}

impl AnnotationSet {
    pub fn parse(raw: &str) -> Self {
        Self::parse_with(raw, EmptyTokens::Keep)
    }

    pub fn parse_with(raw: &str, empty: EmptyTokens) -> Self {
        let tokens = raw
            .split(TOKEN_SEPARATOR)
            .map(|token| token.trim_matches(&TRIM_CHARS[..]))
            .filter(|token| empty == EmptyTokens::Keep || !token.is_empty())
            .map(str::to_owned)
            .collect();
        Self { tokens }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn is_excluded(&self) -> bool {
        self.contains(EXCLUDE_TOKEN)
    }

    pub fn renders_as_text(&self) -> bool {
        self.contains(TEXT_TOKEN)
    }

    /// Tokens in first-seen order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_spaces_and_tabs() {
        let set = AnnotationSet::parse("hello,     world,\ttext\t");
        assert_eq!(set.tokens().collect::<Vec<_>>(), ["hello", "world", "text"]);
        assert!(set.renders_as_text());
        assert!(!set.is_excluded());
    }

    #[test]
    fn exclusion_token() {
        assert!(AnnotationSet::parse("-").is_excluded());
        assert!(AnnotationSet::parse("text, -").is_excluded());
        assert!(!AnnotationSet::parse("--").is_excluded());
    }

    #[test]
    fn tokens_are_case_sensitive() {
        let set = AnnotationSet::parse("Text");
        assert!(!set.renders_as_text());
        assert!(set.contains("Text"));
    }

    #[test]
    fn empty_tag_keeps_one_empty_token_by_default() {
        let set = AnnotationSet::parse("");
        assert_eq!(set.len(), 1);
        assert!(set.contains(""));
    }

    #[test]
    fn empty_tokens_can_be_dropped() {
        assert!(AnnotationSet::parse_with("", EmptyTokens::Drop).is_empty());
        let set = AnnotationSet::parse_with(" , text,,", EmptyTokens::Drop);
        assert_eq!(set.tokens().collect::<Vec<_>>(), ["text"]);
    }

    #[test]
    fn unknown_tokens_are_kept_and_duplicates_collapse() {
        let set = AnnotationSet::parse("idonothing, hello, hello");
        assert_eq!(set.len(), 2);
        assert!(set.contains("idonothing"));
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = " world ,hello,\t-";
        assert_eq!(AnnotationSet::parse(raw), AnnotationSet::parse(raw));
    }
}
