//! Newline-delimited JSON verse loader and file digests.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{GleanerError, Result};

use super::verse::Verse;

/// Load verses from a JSONL file, one verse object per line.
///
/// Blank lines are skipped. A malformed line fails the load with its line
/// number.
pub fn load_verses(path: impl AsRef<Path>) -> Result<Vec<Verse>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| GleanerError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut verses = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| GleanerError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }

        let verse: Verse = serde_json::from_str(&line).map_err(|e| GleanerError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message: e.to_string(),
        })?;
        verses.push(verse);
    }

    tracing::info!("loaded {} verses from {}", verses.len(), path.display());
    Ok(verses)
}

/// SHA-256 of a file's contents, formatted `sha256:<hex>`.
pub fn file_digest(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| GleanerError::io(path, e))?;

    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| GleanerError::io(path, e))?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_verses_skips_blank_lines() {
        let content = concat!(
            r#"{"book":"Genesis","chapter":1,"verse":1,"text":"In the beginning","tokens":[{"surface":"In"}]}"#,
            "\n\n",
            r#"{"book":"Genesis","chapter":1,"verse":2,"text":"And the earth"}"#,
            "\n"
        );
        let file = create_test_file(content);

        let verses = load_verses(file.path()).unwrap();
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[1].id.verse, 2);
        assert!(verses[1].tokens.is_empty());
    }

    #[test]
    fn test_load_verses_reports_line() {
        let content = "{\"book\":\"Genesis\",\"chapter\":1,\"verse\":1,\"text\":\"x\"}\nnot json\n";
        let file = create_test_file(content);

        match load_verses(file.path()) {
            Err(GleanerError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_verses("/nonexistent/verses.jsonl").unwrap_err();
        assert!(matches!(err, GleanerError::Io { .. }));
    }

    #[test]
    fn test_file_digest_is_stable() {
        let file = create_test_file("abc");
        let digest = file_digest(file.path()).unwrap();
        assert_eq!(
            digest,
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
