//! End-to-end tests: rule files and verse files in, dataset directory out.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use gleaner::curation::{LabelPolicy, OverrideLoader};
use gleaner::dataset::{DatasetWriter, MANIFEST_FILE, Manifest, SplitConfig, partition, read_jsonl};
use gleaner::input::load_verses;
use gleaner::span::resolve_overlaps;
use gleaner::{Annotator, GleanerError, OverrideTable, RuleSet, Span, SpanSource, Token, Verse, VerseId};

/// Write `content` to `name` inside `dir`.
fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Rule config with a sticky title phrase from a gazetteer file.
fn create_rules(dir: &Path) -> RuleSet {
    write_file(dir, "titles.txt", "# messianic titles\nSon of God\nSon of Man\n");
    let rules = write_file(
        dir,
        "rules.json",
        r#"{
            "rules": {
                "MESSIANIC_TITLE": { "gazetteer_files": ["titles.txt"] },
                "DEITY": { "lemmas": ["god"] },
                "PERSON": { "codes": ["H85", "H8283"], "surfaces": ["Naomi"] },
                "PLACE": { "surfaces": ["Bethlehem", "Moab"] }
            },
            "priority": ["MESSIANIC_TITLE", "PLACE", "PERSON"],
            "override_labels": ["MESSIANIC_TITLE"]
        }"#,
    );
    RuleSet::load(rules).expect("Failed to load rules")
}

fn tokens(surfaces: &[&str]) -> Vec<Token> {
    surfaces.iter().map(|s| Token::new(*s)).collect()
}

// =============================================================================
// Annotation scenarios
// =============================================================================

#[test]
fn test_lemma_rule_labels_single_token() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());

    let mut toks = tokens(&["In", "the", "beginning"]);
    toks.push(Token::new("God").with_lemma("God"));
    toks.push(Token::new("created"));
    let verse = Verse::new(VerseId::new("Genesis", 1, 1), "In the beginning God created").with_tokens(toks);

    let example = Annotator::new(&rules).annotate(&verse, &[]).unwrap();

    assert_eq!(example.spans.len(), 1);
    assert_eq!((example.spans[0].start, example.spans[0].end), (17, 20));
    assert_eq!(example.spans[0].label, "DEITY");
}

#[test]
fn test_sticky_phrase_beats_token_rule() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());

    let mut toks = tokens(&["the", "Son", "of"]);
    toks.push(Token::new("God").with_lemma("god"));
    toks.push(Token::new("said"));
    let verse = Verse::new(VerseId::new("Matthew", 4, 3), "the Son of God said").with_tokens(toks);

    let example = Annotator::new(&rules).annotate(&verse, &[]).unwrap();

    assert_eq!(
        example.spans,
        vec![Span::new(4, 14, "MESSIANIC_TITLE", SpanSource::Sticky)]
    );
}

#[test]
fn test_priority_resolves_overlapping_candidates() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());

    let kept = resolve_overlaps(
        vec![
            Span::new(10, 14, "PERSON", SpanSource::External),
            Span::new(10, 20, "PLACE", SpanSource::External),
        ],
        |label| rules.rank_of(label),
    );

    assert_eq!(kept, vec![Span::new(10, 20, "PLACE", SpanSource::External)]);
}

#[test]
fn test_override_removes_intersecting_span() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());
    let overrides = write_file(
        dir.path(),
        "overrides.json",
        r#"{ "Ruth 1:1": [ { "start": 5, "end": 9, "label": "PLACE", "note": "checked" } ] }"#,
    );

    let (table, report) = OverrideLoader::new()
        .with_rules(&rules)
        .load(&overrides)
        .unwrap();
    assert_eq!(report.accepted, 1);

    let verse = Verse::new(VerseId::new("Ruth", 1, 1), "then Naomi rose").with_surfaces(&["then", "Naomi", "rose"]);
    let batch = Annotator::new(&rules).annotate_batch(&[verse], &table, false).unwrap();

    assert_eq!(
        batch.examples[0].spans,
        vec![Span::new(5, 9, "PLACE", SpanSource::Manual)]
    );
    assert_eq!(batch.summary.overrides_applied, 1);
}

#[test]
fn test_unaligned_token_counts_as_miss() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());

    let verse = Verse::new(VerseId::new("Psalms", 3, 2), "Naomi Selah went to Moab")
        .with_surfaces(&["Naomi", "Amen", "went", "to", "Moab"]);

    let example = Annotator::new(&rules).annotate(&verse, &[]).unwrap();

    assert_eq!(example.meta.misses, 1);
    assert_eq!(example.meta.aligned, 4);
    assert_eq!(
        example.spans,
        vec![
            Span::new(0, 5, "PERSON", SpanSource::Rule),
            Span::new(20, 24, "PLACE", SpanSource::Rule),
        ]
    );
}

#[test]
fn test_strict_labels_rejects_unknown_override_label() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());
    let overrides = write_file(
        dir.path(),
        "overrides.csv",
        "reference,start,end,label\nRuth 1:1,0,4,ANGEL\n",
    );

    let lenient = OverrideLoader::new().with_rules(&rules).load(&overrides).unwrap();
    assert_eq!(lenient.1.accepted, 0);

    let strict = OverrideLoader::new()
        .with_rules(&rules)
        .with_policy(LabelPolicy::Strict)
        .load(&overrides);
    assert!(matches!(strict, Err(GleanerError::UnknownLabel { .. })));
}

// =============================================================================
// Full build
// =============================================================================

fn verse_line(book: &str, verse: u32) -> String {
    format!(
        r#"{{"book":"{}","chapter":1,"verse":{},"text":"Naomi went to Bethlehem","tokens":[{{"surface":"Naomi"}},{{"surface":"went"}},{{"surface":"to"}},{{"surface":"Bethlehem"}}]}}"#,
        book, verse
    )
}

#[test]
fn test_build_writes_reproducible_splits() {
    let dir = TempDir::new().unwrap();
    let rules = create_rules(dir.path());

    let mut lines: Vec<String> = (1..=17).map(|v| verse_line("Genesis", v)).collect();
    lines.extend((1..=5).map(|v| verse_line("Ruth", v)));
    let input = write_file(dir.path(), "verses.jsonl", &(lines.join("\n") + "\n\n"));

    let verses = load_verses(&input).unwrap();
    assert_eq!(verses.len(), 22);

    let config = SplitConfig::new().with_seed(13).with_holdout_book("Ruth");
    let build = |out: &Path| {
        let batch = Annotator::new(&rules)
            .annotate_batch(&verses, &OverrideTable::new(), true)
            .unwrap();
        let split = partition(batch.examples, &config, |e| e.book());
        DatasetWriter::new(out)
            .write(&split, &config, &batch.summary)
            .unwrap()
    };

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let manifest = build(&first);
    build(&second);

    assert_eq!(manifest.books["Genesis"].train, 14);
    assert_eq!(manifest.books["Genesis"].dev, 2);
    assert_eq!(manifest.books["Genesis"].test, 1);
    assert_eq!(manifest.counts.holdout, 5);
    assert_eq!(manifest.summary.spans_by_label["PLACE"], 22);

    for name in ["train.jsonl", "dev.jsonl", "test.jsonl", "holdout.jsonl"] {
        let a = fs::read(first.join(name)).unwrap();
        let b = fs::read(second.join(name)).unwrap();
        assert_eq!(a, b, "{} differs between runs", name);
    }

    let train = read_jsonl(first.join("train.jsonl")).unwrap();
    assert_eq!(train.len(), 14);
    assert!(train.iter().all(|e| e.id.book == "Genesis"));
    assert_eq!(train[0].spans[0], Span::new(0, 5, "PERSON", SpanSource::Rule));

    let loaded = Manifest::load(first.join(MANIFEST_FILE)).unwrap();
    assert_eq!(loaded.seed, 13);
    assert_eq!(loaded.holdout_books, vec!["Ruth".to_string()]);
}

#[test]
fn test_malformed_input_line_reports_line_number() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "verses.jsonl",
        &format!("{}\n{{not json}}\n", verse_line("Genesis", 1)),
    );

    match load_verses(&input) {
        Err(GleanerError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
}
