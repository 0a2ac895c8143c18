use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::extract::PageWords;

/// Append-only delimited text log of raw scraped rows. One writer, no
/// rewrites: re-running a crawl keeps extending the same file.
pub struct AppendLog {
    path: PathBuf,
    delimiter: String,
}

impl AppendLog {
    pub fn new(path: impl Into<PathBuf>, delimiter: &str) -> Self {
        Self {
            path: path.into(),
            delimiter: delimiter.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per extracted word, tagged with the page number.
    /// The page is serialized into one buffer and written with a single call
    /// so an interrupted run never leaves a partial line behind.
    pub fn append(&self, page: u32, words: &PageWords) -> Result<usize> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let d = &self.delimiter;
        let mut buf = String::new();
        for i in 0..words.len() {
            buf.push_str(&format!(
                "{}{}{}{}{}{}{}\n",
                page, d, words.words[i], d, words.snippets[i], d, words.parts_of_speech[i]
            ));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        file.write_all(buf.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        Ok(words.len())
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn page(words: &[(&str, &str, &str)]) -> PageWords {
        PageWords {
            words: words.iter().map(|w| w.0.to_string()).collect(),
            snippets: words.iter().map(|w| w.1.to_string()).collect(),
            parts_of_speech: words.iter().map(|w| w.2.to_string()).collect(),
        }
    }

    #[test]
    fn appends_one_line_per_word() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("words.txt"), "~~");

        let n = log.append(3, &page(&[("run", "\"a run\"", "verb"), ("rut", "\"\"", "")])).unwrap();
        assert_eq!(n, 2);

        let contents = fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents, "3~~run~~\"a run\"~~verb\n3~~rut~~\"\"~~\n");
    }

    #[test]
    fn later_pages_extend_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("words.txt"), ",");

        log.append(1, &page(&[("a", "\"x\"", "noun")])).unwrap();
        log.append(2, &page(&[("b", "\"y\"", "verb")])).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["1,a,\"x\",noun", "2,b,\"y\",verb"]);
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("output/deep/words.txt"), ",");
        log.append(1, &page(&[("a", "\"x\"", "noun")])).unwrap();
        assert!(log.path().exists());
    }

    #[test]
    fn empty_page_touches_nothing_but_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("words.txt"), ",");
        let n = log.append(1, &page(&[])).unwrap();
        assert_eq!(n, 0);
        assert_eq!(fs::read_to_string(log.path()).unwrap(), "");
    }
}
