use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

// "comb. form." is the only two-word part-of-speech tag, so it is matched
// ahead of the plain alphabetic runs.
static POS_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"comb\. form\.|[A-Za-z]+").unwrap());
static SUPERSCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[⁰¹²³⁴⁵⁶⁷⁸⁹]").unwrap());

/// One dictionary headword, merged across every page it appeared on.
#[derive(Debug, Clone, PartialEq)]
pub struct WordRecord {
    pub text: String,
    pub snippet: String,
    pub parts_of_speech: String,
}

/// Deduplicated words, iterable in first-seen (crawl) order.
pub struct WordMap {
    index: HashMap<String, usize>,
    records: Vec<WordRecord>,
}

impl WordMap {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, text: &str) -> Option<&WordRecord> {
        self.index.get(text).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordRecord> {
        self.records.iter()
    }

    /// Merge policy: snippets always concatenate with `|` in arrival order;
    /// parts of speech do the same, except that empty incoming values add
    /// nothing.
    fn insert_or_merge(&mut self, text: &str, snippet: &str, raw_parts: &str) {
        if let Some(&i) = self.index.get(text) {
            let existing = &mut self.records[i];
            existing.snippet.push('|');
            existing.snippet.push_str(snippet);

            let parts = normalize_parts_of_speech(raw_parts);
            if !parts.is_empty() {
                if !existing.parts_of_speech.is_empty() {
                    existing.parts_of_speech.push('|');
                }
                existing.parts_of_speech.push_str(&parts);
            }
            return;
        }

        self.index.insert(text.to_string(), self.records.len());
        self.records.push(WordRecord {
            text: text.to_string(),
            snippet: snippet.to_string(),
            parts_of_speech: normalize_parts_of_speech(raw_parts),
        });
    }
}

/// Data-quality counts over a loaded log.
pub struct LoadReport {
    pub total: usize,
    pub no_snippet: usize,
    pub no_parts_of_speech: usize,
    pub malformed: usize,
}

impl LoadReport {
    pub fn print(&self) {
        println!(
            "Found {} words, {} without snippets, {} without parts of speech",
            self.total, self.no_snippet, self.no_parts_of_speech
        );
        if self.malformed > 0 {
            println!("Skipped {} malformed rows", self.malformed);
        }
    }
}

/// Read the whole append log and fold it into one record per headword.
///
/// Rows without exactly four fields are dropped and counted. The report's
/// three counts are computed from the finished map, so they always agree
/// with what the exporters will see.
pub fn load_words(path: &Path, delimiter: &str) -> Result<(WordMap, LoadReport)> {
    anyhow::ensure!(!delimiter.is_empty(), "Delimiter must not be empty");
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    let mut map = WordMap::new();
    let mut malformed = 0usize;

    for line in contents.lines() {
        if line.is_empty() {
            continue;
        }
        let fields = split_fields(line, delimiter);
        if fields.len() != 4 {
            malformed += 1;
            continue;
        }
        // fields[0] is the page number the row was scraped from; the merge
        // key is the word text alone.
        map.insert_or_merge(&fields[1], &fields[2], &fields[3]);
    }

    let report = LoadReport {
        total: map.len(),
        no_snippet: map.iter().filter(|w| w.snippet.is_empty()).count(),
        no_parts_of_speech: map.iter().filter(|w| w.parts_of_speech.is_empty()).count(),
        malformed,
    };

    Ok((map, report))
}

/// Split one log line on the delimiter, honoring the quote wrapping applied
/// to snippets at extraction time: a field that opens with `"` runs to its
/// closing quote and is unwrapped. Inner quotes were normalized to `'`
/// before writing, so no escaping exists inside a quoted field.
fn split_fields(line: &str, delimiter: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = line;

    loop {
        if let Some(inner) = rest.strip_prefix('"') {
            if let Some(end) = inner.find('"') {
                fields.push(inner[..end].to_string());
                rest = &inner[end + 1..];
                if rest.is_empty() {
                    return fields;
                }
                match rest.strip_prefix(delimiter) {
                    Some(r) => {
                        rest = r;
                        continue;
                    }
                    None => {
                        // Garbage after a closing quote; surface the row as
                        // malformed by keeping the leftover as its own field.
                        fields.push(rest.to_string());
                        return fields;
                    }
                }
            }
            // Unterminated quote: fall through and split it like plain text.
        }

        match rest.find(delimiter) {
            Some(i) => {
                fields.push(rest[..i].to_string());
                rest = &rest[i + delimiter.len()..];
            }
            None => {
                fields.push(rest.to_string());
                return fields;
            }
        }
    }
}

/// Tokenize a raw part-of-speech string into clean `|`-joined tags, dropping
/// superscript digit decorations.
pub fn normalize_parts_of_speech(raw: &str) -> String {
    let cleaned = SUPERSCRIPT_RE.replace_all(raw, "");
    POS_TAG_RE
        .find_iter(&cleaned)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn loads_and_unwraps_quoted_snippets() {
        let file = write_log(&["1,run,\"a quick run\",verb"]);
        let (map, report) = load_words(file.path(), ",").unwrap();
        assert_eq!(report.total, 1);
        let run = map.get("run").unwrap();
        assert_eq!(run.snippet, "a quick run");
        assert_eq!(run.parts_of_speech, "verb");
    }

    #[test]
    fn comma_inside_quoted_snippet_stays_one_field() {
        let file = write_log(&["1,tea,\"a drink, hot or cold\",noun"]);
        let (map, report) = load_words(file.path(), ",").unwrap();
        assert_eq!(report.malformed, 0);
        assert_eq!(map.get("tea").unwrap().snippet, "a drink, hot or cold");
    }

    #[test]
    fn legacy_delimiter_round_trips() {
        let file = write_log(&["12~~set~~\"to place, put\"~~noun"]);
        let (map, report) = load_words(file.path(), "~~").unwrap();
        assert_eq!(report.malformed, 0);
        assert_eq!(map.get("set").unwrap().snippet, "to place, put");
    }

    #[test]
    fn duplicate_words_merge_into_one_record() {
        let file = write_log(&[
            "1,run,\"first sense\",verb",
            "2,run,\"second sense\",noun",
        ]);
        let (map, report) = load_words(file.path(), ",").unwrap();
        assert_eq!(report.total, 1);
        let run = map.get("run").unwrap();
        assert_eq!(run.snippet, "first sense|second sense");
        assert_eq!(run.parts_of_speech, "verb|noun");
    }

    #[test]
    fn malformed_rows_are_counted_and_dropped() {
        let file = write_log(&[
            "1,ok,\"fine\",noun",
            "not a row",
            "1,too,many,fields,here",
        ]);
        let (map, report) = load_words(file.path(), ",").unwrap();
        assert_eq!(report.total, 1);
        assert_eq!(report.malformed, 2);
        assert!(map.get("ok").is_some());
    }

    #[test]
    fn report_counts_match_the_map() {
        let file = write_log(&[
            "1,alpha,\"\",noun",
            "1,beta,\"has snippet\",",
            "2,gamma,\"\",",
        ]);
        let (map, report) = load_words(file.path(), ",").unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.no_snippet, map.iter().filter(|w| w.snippet.is_empty()).count());
        assert_eq!(report.no_snippet, 2);
        assert_eq!(report.no_parts_of_speech, 2);
    }

    #[test]
    fn iteration_preserves_first_seen_order() {
        let file = write_log(&[
            "1,zebra,\"z\",noun",
            "1,apple,\"a\",noun",
            "2,zebra,\"again\",noun",
        ]);
        let (map, _) = load_words(file.path(), ",").unwrap();
        let order: Vec<&str> = map.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(order, vec!["zebra", "apple"]);
    }

    #[test]
    fn append_then_load_round_trips() {
        use crate::extract::PageWords;
        use crate::store::AppendLog;

        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::new(dir.path().join("words.txt"), ",");
        log.append(
            1,
            &PageWords {
                words: vec!["run".into()],
                // As written by extraction: inner quotes normalized, wrapped.
                snippets: vec!["\"say 'go', then run\"".into()],
                parts_of_speech: vec!["verb, noun".into()],
            },
        )
        .unwrap();

        let (map, report) = load_words(log.path(), ",").unwrap();
        assert_eq!(report.malformed, 0);
        let run = map.get("run").unwrap();
        assert_eq!(run.snippet, "say 'go', then run");
        assert_eq!(run.parts_of_speech, "verb|noun");
    }

    #[test]
    fn parts_of_speech_are_tokenized_and_cleaned() {
        assert_eq!(normalize_parts_of_speech("verb, noun"), "verb|noun");
        assert_eq!(normalize_parts_of_speech("comb. form."), "comb. form.");
        assert_eq!(normalize_parts_of_speech("n.¹"), "n");
        assert_eq!(normalize_parts_of_speech(""), "");
        assert_eq!(
            normalize_parts_of_speech("adj. & comb. form."),
            "adj|comb. form."
        );
    }
}
