//! Head-indexed multi-token phrase matching.

use std::collections::HashMap;

use super::ruleset::LabelId;

/// A multi-token gazetteer entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Phrase {
    pub label: LabelId,
    /// Tokens of the phrase, lowercased when not case-sensitive.
    pub parts: Vec<String>,
    pub case_sensitive: bool,
}

impl Phrase {
    /// Check for a contiguous match starting at `start`.
    fn matches_at(&self, exact: &[&str], folded: &[String], start: usize) -> bool {
        let end = start + self.parts.len();
        if end > exact.len() {
            return false;
        }
        if self.case_sensitive {
            self.parts.iter().zip(&exact[start..end]).all(|(p, t)| p.as_str() == *t)
        } else {
            self.parts.iter().zip(&folded[start..end]).all(|(p, t)| p == t)
        }
    }
}

/// Phrases keyed by their first token.
#[derive(Debug, Clone, Default)]
pub struct PhraseIndex {
    exact: HashMap<String, Vec<Phrase>>,
    folded: HashMap<String, Vec<Phrase>>,
    len: usize,
}

impl PhraseIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phrase. Returns false if the same phrase and label already exist.
    pub fn insert(&mut self, label: LabelId, parts: &[&str], case_sensitive: bool) -> bool {
        if parts.is_empty() {
            return false;
        }

        let parts: Vec<String> = if case_sensitive {
            parts.iter().map(|p| p.to_string()).collect()
        } else {
            parts.iter().map(|p| p.to_lowercase()).collect()
        };

        let bucket = if case_sensitive {
            self.exact.entry(parts[0].clone()).or_default()
        } else {
            self.folded.entry(parts[0].clone()).or_default()
        };

        let phrase = Phrase {
            label,
            parts,
            case_sensitive,
        };
        if bucket.contains(&phrase) {
            return false;
        }
        bucket.push(phrase);
        self.len += 1;
        true
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no phrases are indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Phrases that could start at a token with this surface.
    fn headed_by<'a>(&'a self, exact: &str, folded: &str) -> impl Iterator<Item = &'a Phrase> {
        self.exact
            .get(exact)
            .into_iter()
            .flatten()
            .chain(self.folded.get(folded).into_iter().flatten())
    }
}

/// Per-position phrase labels for one token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatches {
    /// Best phrase label covering each position.
    pub labels: Vec<Option<LabelId>>,
    /// Best override-label phrase covering each position.
    pub sticky: Vec<Option<LabelId>>,
}

/// Match every indexed phrase against `surfaces`.
///
/// Matches may overlap; on a shared position the lower-rank label wins.
/// Positions covered by a phrase of an override label are also recorded in
/// the sticky mask.
pub fn match_phrases<S, F>(index: &PhraseIndex, surfaces: &[S], is_override: F) -> PhraseMatches
where
    S: AsRef<str>,
    F: Fn(LabelId) -> bool,
{
    let n = surfaces.len();
    let mut labels: Vec<Option<LabelId>> = vec![None; n];
    let mut sticky: Vec<Option<LabelId>> = vec![None; n];

    if index.is_empty() {
        return PhraseMatches { labels, sticky };
    }

    let exact: Vec<&str> = surfaces.iter().map(|s| s.as_ref()).collect();
    let folded: Vec<String> = exact.iter().map(|s| s.to_lowercase()).collect();

    for i in 0..n {
        for phrase in index.headed_by(exact[i], &folded[i]) {
            if !phrase.matches_at(&exact, &folded, i) {
                continue;
            }
            let window = i..i + phrase.parts.len();
            keep_best(&mut labels[window.clone()], phrase.label);
            if is_override(phrase.label) {
                keep_best(&mut sticky[window], phrase.label);
            }
        }
    }

    PhraseMatches { labels, sticky }
}

fn keep_best(slots: &mut [Option<LabelId>], label: LabelId) {
    for slot in slots {
        *slot = Some(match *slot {
            Some(existing) if existing <= label => existing,
            _ => label,
        });
    }
}
