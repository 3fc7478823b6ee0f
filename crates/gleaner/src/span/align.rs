//! Greedy left-to-right alignment of token surfaces onto verse text.
//!
//! The aligner keeps a single cursor and never backtracks, so repeated
//! tokens land on successive occurrences in order. Surfaces are always
//! matched literally; no unicode or diacritic folding is applied.

use regex::Regex;
use tracing::debug;

use super::types::CharOffsets;

/// How far past the cursor the whitespace-tolerant retry may look, in bytes.
pub const DEFAULT_SEARCH_WINDOW: usize = 256;

/// Result of aligning one verse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// One entry per token; `None` when the token could not be placed.
    pub spans: Vec<Option<(usize, usize)>>,
    /// Number of tokens that could not be placed.
    pub misses: usize,
}

impl Alignment {
    /// Number of tokens that were placed.
    pub fn aligned(&self) -> usize {
        self.spans.len() - self.misses
    }

    /// Fraction of tokens placed (1.0 for an empty verse).
    pub fn coverage(&self) -> f64 {
        if self.spans.is_empty() {
            return 1.0;
        }
        self.aligned() as f64 / self.spans.len() as f64
    }

    /// Legacy `(-1, -1)` sentinel form, as consumed by older tooling.
    pub fn as_signed(&self) -> Vec<(i64, i64)> {
        self.spans
            .iter()
            .map(|s| match s {
                Some((start, end)) => (*start as i64, *end as i64),
                None => (-1, -1),
            })
            .collect()
    }
}

/// Greedy token aligner.
#[derive(Debug, Clone)]
pub struct Aligner {
    window: usize,
}

impl Aligner {
    /// Create an aligner with the default retry window.
    pub fn new() -> Self {
        Self {
            window: DEFAULT_SEARCH_WINDOW,
        }
    }

    /// Set the retry window in bytes.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Align `surfaces` onto `text`, returning char offsets.
    pub fn align<S: AsRef<str>>(&self, text: &str, surfaces: &[S]) -> Alignment {
        let offsets = CharOffsets::new(text);
        let mut cursor = 0usize;
        let mut misses = 0usize;
        let mut spans = Vec::with_capacity(surfaces.len());

        for surface in surfaces {
            let surface = surface.as_ref();
            if surface.is_empty() {
                spans.push(None);
                misses += 1;
                continue;
            }

            let found = find_literal(text, surface, cursor)
                .or_else(|| self.find_whitespace_tolerant(text, surface, cursor));

            match found {
                Some((start, end)) => {
                    spans.push(Some((offsets.to_char(start), offsets.to_char(end))));
                    cursor = end;
                }
                None => {
                    spans.push(None);
                    misses += 1;
                }
            }
        }

        Alignment { spans, misses }
    }

    /// Retry with every whitespace run in the surface matching any
    /// whitespace run in the text, bounded to the window past the cursor.
    fn find_whitespace_tolerant(
        &self,
        text: &str,
        surface: &str,
        cursor: usize,
    ) -> Option<(usize, usize)> {
        let parts: Vec<&str> = surface.split_whitespace().collect();
        if parts.is_empty() {
            return None;
        }

        let pattern = parts
            .iter()
            .map(|p| regex::escape(p))
            .collect::<Vec<_>>()
            .join(r"\s+");
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                debug!("no whitespace-tolerant retry for {:?}: {}", surface, e);
                return None;
            }
        };

        let limit = snap_to_boundary(text, cursor.saturating_add(self.window));
        let haystack = &text[cursor..limit];
        re.find(haystack)
            .map(|m| (cursor + m.start(), cursor + m.end()))
    }
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new()
    }
}

/// Align with the default window.
pub fn align_tokens<S: AsRef<str>>(text: &str, surfaces: &[S]) -> Alignment {
    Aligner::new().align(text, surfaces)
}

fn find_literal(text: &str, surface: &str, cursor: usize) -> Option<(usize, usize)> {
    text[cursor..]
        .find(surface)
        .map(|pos| (cursor + pos, cursor + pos + surface.len()))
}

/// Largest char boundary not past `index`.
fn snap_to_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut idx = index;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
