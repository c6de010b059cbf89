use std::borrow::Cow;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Prefix,
    Postfix,
    Infix,
    Equals,
}

/// A predicate over a candidate line.
///
/// Case-insensitive unless built with `case_sensitive(true)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMatchRule {
    kind: MatchKind,
    text: String,
    case_sensitive: bool,
}

impl StringMatchRule {
    pub fn new(kind: MatchKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            case_sensitive: false,
        }
    }

    pub fn prefix(text: impl Into<String>) -> Self {
        Self::new(MatchKind::Prefix, text)
    }

    pub fn postfix(text: impl Into<String>) -> Self {
        Self::new(MatchKind::Postfix, text)
    }

    pub fn infix(text: impl Into<String>) -> Self {
        Self::new(MatchKind::Infix, text)
    }

    pub fn equals(text: impl Into<String>) -> Self {
        Self::new(MatchKind::Equals, text)
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        let (candidate, text) = if self.case_sensitive {
            (Cow::Borrowed(candidate), Cow::Borrowed(self.text.as_str()))
        } else {
            (
                Cow::Owned(candidate.to_lowercase()),
                Cow::Owned(self.text.to_lowercase()),
            )
        };

        match self.kind {
            MatchKind::Prefix => candidate.starts_with(text.as_ref()),
            MatchKind::Postfix => candidate.ends_with(text.as_ref()),
            MatchKind::Infix => candidate.contains(text.as_ref()),
            MatchKind::Equals => candidate == text,
        }
    }
}
