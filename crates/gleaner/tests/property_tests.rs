//! Property-based tests for alignment, span resolution and splitting.
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p gleaner --test property_tests
//!
//! # More cases
//! PROPTEST_CASES=10000 cargo test -p gleaner --test property_tests
//! ```

use proptest::prelude::*;

use gleaner::curation::{Override, apply_overrides};
use gleaner::dataset::{SplitConfig, SplitRatios, partition};
use gleaner::span::{Aligner, MergeMode, merge_contiguous, resolve_overlaps};
use gleaner::rules::LabelRule;
use gleaner::{Annotator, RuleConfig, RuleSet, Span, SpanSource, Verse, VerseId};

// =============================================================================
// Test Strategies
// =============================================================================

/// Words mixing ASCII and Greek so char and byte offsets differ.
fn word() -> impl Strategy<Value = String> {
    prop_oneof!["[a-zA-Z]{1,8}", "[\u{03b1}-\u{03c9}]{1,6}"]
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 0..20)
}

fn label() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PERSON".to_string()),
        Just("PLACE".to_string()),
        Just("DEITY".to_string()),
        Just("GROUP".to_string()),
    ]
}

/// Candidate spans inside a text of `len` chars.
fn spans_within(len: usize) -> impl Strategy<Value = Vec<Span>> {
    prop::collection::vec(
        (0..len, 1..=8usize, label()).prop_map(move |(start, width, label)| {
            Span::new(start, (start + width).min(len), label, SpanSource::External)
        }),
        0..12,
    )
}

fn rank(label: &str) -> usize {
    ["PLACE", "PERSON", "DEITY"]
        .iter()
        .position(|l| *l == label)
        .unwrap_or(3)
}

fn sorted_disjoint(spans: &[Span]) -> bool {
    spans.windows(2).all(|w| w[0].end <= w[1].start)
}

/// No two neighbours share a label across a whitespace-only gap.
fn fully_merged(text: &str, spans: &[Span]) -> bool {
    let chars: Vec<char> = text.chars().collect();
    spans.windows(2).all(|w| {
        w[0].label != w[1].label || !chars[w[0].end..w[1].start].iter().all(|c| c.is_whitespace())
    })
}

/// A verse drawn from a small vocabulary, with external candidates.
fn verse_with_candidates() -> impl Strategy<Value = Verse> {
    let vocab = prop::sample::select(vec!["Abram", "Sarai", "Egypt", "Bethel", "went", "to", "and"]);
    (prop::collection::vec(vocab, 1..16), prop_oneof![Just(" "), Just("  "), Just(", ")]).prop_flat_map(
        |(tokens, sep)| {
            let text = tokens.join(sep);
            let len = text.chars().count();
            spans_within(len).prop_map(move |candidates| {
                Verse::new(VerseId::new("Genesis", 12, 5), text.clone())
                    .with_surfaces(&tokens)
                    .with_candidates(candidates)
            })
        },
    )
}

fn vocab_rules() -> RuleSet {
    let config = RuleConfig::new()
        .with_rule("PERSON", LabelRule::new().with_surface("Abram").with_surface("Sarai"))
        .with_rule("PLACE", LabelRule::new().with_surface("Egypt").with_surface("Bethel"))
        .with_priority(["PLACE", "PERSON"]);
    RuleSet::compile(&config).unwrap()
}

// =============================================================================
// Alignment
// =============================================================================

proptest! {
    /// Every aligned range lies in the text and matches the token.
    #[test]
    fn aligned_ranges_match_tokens(tokens in words(), sep in prop_oneof![Just(" "), Just("  "), Just(" , ")]) {
        let text = tokens.join(sep);
        let alignment = Aligner::new().align(&text, &tokens);
        let chars: Vec<char> = text.chars().collect();

        prop_assert_eq!(alignment.misses, 0);
        let mut cursor = 0;
        for (token, range) in tokens.iter().zip(&alignment.spans) {
            let (start, end) = range.expect("token present in text");
            prop_assert!(start >= cursor && end <= chars.len());
            let found: String = chars[start..end].iter().collect();
            prop_assert_eq!(&found, token);
            cursor = end;
        }
    }

    /// Aligning twice gives the same result.
    #[test]
    fn alignment_is_deterministic(tokens in words(), extra in words()) {
        let text = tokens.join(" ");
        let mut surfaces = tokens.clone();
        surfaces.extend(extra);

        let a = Aligner::new().align(&text, &surfaces);
        let b = Aligner::new().align(&text, &surfaces);
        prop_assert_eq!(a, b);
    }
}

// =============================================================================
// Span resolution
// =============================================================================

proptest! {
    /// Resolved spans are disjoint, drawn from the input, and independent
    /// of input order.
    #[test]
    fn overlap_resolution_is_order_independent(spans in spans_within(40), seed in any::<u64>()) {
        let resolved = resolve_overlaps(spans.clone(), rank);

        prop_assert!(sorted_disjoint(&resolved));
        for span in &resolved {
            prop_assert!(spans.contains(span));
        }

        let mut shuffled = spans;
        fastrand::Rng::with_seed(seed).shuffle(&mut shuffled);
        prop_assert_eq!(resolve_overlaps(shuffled, rank), resolved);
    }

    /// Merging is idempotent in every mode.
    #[test]
    fn merge_is_idempotent(tokens in words(), labels in prop::collection::vec(label(), 20)) {
        let text = tokens.join(" ");
        let alignment = Aligner::new().align(&text, &tokens);
        let spans: Vec<Span> = alignment
            .spans
            .iter()
            .zip(&labels)
            .filter_map(|(r, l)| r.map(|(s, e)| Span::new(s, e, l.clone(), SpanSource::Rule)))
            .collect();

        for mode in [MergeMode::Off, MergeMode::Whitespace, MergeMode::Strict] {
            let once = merge_contiguous(&text, spans.clone(), mode);
            let twice = merge_contiguous(&text, once.clone(), mode);
            prop_assert!(sorted_disjoint(&once));
            prop_assert_eq!(once, twice);
        }
    }

    /// Merging leaves no same-label neighbours joined only by whitespace.
    #[test]
    fn merge_is_exhaustive(tokens in words(), labels in prop::collection::vec(label(), 20)) {
        let text = tokens.join("  ");
        let alignment = Aligner::new().align(&text, &tokens);
        let spans: Vec<Span> = alignment
            .spans
            .iter()
            .zip(&labels)
            .filter_map(|(r, l)| r.map(|(s, e)| Span::new(s, e, l.clone(), SpanSource::Rule)))
            .collect();

        let merged = merge_contiguous(&text, spans, MergeMode::Whitespace);
        prop_assert!(fully_merged(&text, &merged));
    }

    /// Annotated spans stay disjoint and fully merged with external candidates.
    #[test]
    fn annotated_spans_are_fully_merged(verse in verse_with_candidates()) {
        let rules = vocab_rules();
        let example = Annotator::new(&rules).annotate(&verse, &[]).unwrap();

        prop_assert!(sorted_disjoint(&example.spans));
        prop_assert!(fully_merged(&verse.text, &example.spans));
    }

    /// Applied overrides are present exactly and nothing overlaps them.
    #[test]
    fn overrides_always_win(
        spans in spans_within(60),
        raw in prop::collection::vec((0..60usize, 1..10usize), 1..4),
    ) {
        let mut current = resolve_overlaps(spans, rank);
        let overrides: Vec<Override> = raw
            .iter()
            .map(|(start, width)| Override::new(*start, (*start + *width).min(60), "MANUAL"))
            .filter(|o| o.start < o.end)
            .collect();

        apply_overrides(&mut current, &overrides, 60, "Test 1:1");

        prop_assert!(sorted_disjoint(&current));
        if let Some(last) = overrides.last() {
            prop_assert!(current.contains(&Span::new(last.start, last.end, "MANUAL", SpanSource::Manual)));
        }
        for span in current.iter().filter(|s| s.source != SpanSource::Manual) {
            for o in &overrides {
                prop_assert!(span.end <= o.start || o.end <= span.start);
            }
        }
    }
}

// =============================================================================
// Partitioning
// =============================================================================

proptest! {
    /// Every item lands in exactly one split and reruns agree.
    #[test]
    fn partition_is_complete_and_deterministic(
        sizes in prop::collection::vec(0..40usize, 1..5),
        train in 0.0..1.0f64,
        dev in 0.0..1.0f64,
        test in 0.01..1.0f64,
        seed in any::<u64>(),
    ) {
        let books = ["Genesis", "Exodus", "Ruth", "Psalms", "Mark"];
        let items: Vec<(String, usize)> = sizes
            .iter()
            .enumerate()
            .flat_map(|(b, n)| (0..*n).map(move |i| (books[b].to_string(), i)))
            .collect();

        let config = SplitConfig::new()
            .with_ratios(SplitRatios::new(train, dev, test).unwrap())
            .with_seed(seed)
            .with_holdout_book("Psalms");

        let a = partition(items.clone(), &config, |i| i.0.as_str());
        let b = partition(items.clone(), &config, |i| i.0.as_str());
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), items.len());
        prop_assert!(a.holdout.iter().all(|i| i.0 == "Psalms"));
        prop_assert!(a.train.iter().chain(&a.dev).chain(&a.test).all(|i| i.0 != "Psalms"));

        let mut seen: Vec<_> = a.train.into_iter().chain(a.dev).chain(a.test).chain(a.holdout).collect();
        seen.sort();
        let mut expected = items;
        expected.sort();
        prop_assert_eq!(seen, expected);
    }
}
