//! Verse and token input types.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GleanerError;
use crate::span::Span;

/// One token as produced by the external loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface form as it should appear in the verse text.
    pub surface: String,
    /// Lexical code, e.g. a Strong's number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    /// Part of speech. Carried through, not used for labeling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
}

impl Token {
    /// Create a token with only a surface form.
    pub fn new(surface: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            ..Self::default()
        }
    }

    /// Set the lexical code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the lemma.
    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    /// Set the part of speech.
    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }
}

/// Book, chapter and verse number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseId {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
}

impl VerseId {
    /// Create a verse identifier.
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
        }
    }

    /// Stable identifier used in output records, e.g. `1_Samuel.3.4`.
    pub fn example_id(&self) -> String {
        format!("{}.{}.{}", self.book.replace(' ', "_"), self.chapter, self.verse)
    }
}

impl fmt::Display for VerseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.book, self.chapter, self.verse)
    }
}

// Book names may contain spaces and digits ("1 Samuel", "Song of Songs").
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\S.*?)\s+(\d+)\s*:\s*(\d+)\s*$").unwrap());

impl FromStr for VerseId {
    type Err = GleanerError;

    /// Parse a reference such as `Genesis 1:1` or `1 Samuel 3:4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GleanerError::InvalidOverride {
            reference: s.to_string(),
            message: "expected '<book> <chapter>:<verse>'".to_string(),
        };

        let caps = REFERENCE.captures(s).ok_or_else(invalid)?;
        Ok(Self {
            book: caps[1].to_string(),
            chapter: caps[2].parse().map_err(|_| invalid())?,
            verse: caps[3].parse().map_err(|_| invalid())?,
        })
    }
}

/// A verse awaiting annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verse {
    #[serde(flatten)]
    pub id: VerseId,
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Spans computed upstream by another method, resolved against the
    /// rule-derived spans by priority.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Span>,
}

impl Verse {
    /// Create a verse with no tokens.
    pub fn new(id: VerseId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            tokens: Vec::new(),
            candidates: Vec::new(),
        }
    }

    /// Set the tokens.
    pub fn with_tokens(mut self, tokens: Vec<Token>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Set tokens from bare surface strings.
    pub fn with_surfaces<S: AsRef<str>>(mut self, surfaces: &[S]) -> Self {
        self.tokens = surfaces.iter().map(|s| Token::new(s.as_ref())).collect();
        self
    }

    /// Add externally computed candidate spans.
    pub fn with_candidates(mut self, candidates: Vec<Span>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Length of the text in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
