use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::words::WordMap;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Txt,
    Json,
}

/// The JSON export keeps only the headword; snippet and parts of speech are
/// dropped from this format on purpose.
#[derive(Serialize)]
struct JsonWord<'a> {
    text: &'a str,
}

pub fn write_output(
    path: &Path,
    format: ExportFormat,
    minified: bool,
    words: &WordMap,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(path, words),
        ExportFormat::Txt => write_txt(path, words),
        ExportFormat::Json => write_json(path, minified, words),
    }
}

fn write_csv(path: &Path, words: &WordMap) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to open {}", path.display()))?;
    for w in words.iter() {
        writer.write_record([&w.text, &w.snippet, &w.parts_of_speech])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_txt(path: &Path, words: &WordMap) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for w in words.iter() {
        writeln!(writer, "{}", w.text)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, minified: bool, words: &WordMap) -> Result<()> {
    let list: Vec<JsonWord> = words.iter().map(|w| JsonWord { text: &w.text }).collect();
    let file =
        File::create(path).with_context(|| format!("Failed to open {}", path.display()))?;
    if minified {
        serde_json::to_writer(file, &list)?;
    } else {
        serde_json::to_writer_pretty(file, &list)?;
    }
    Ok(())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;

    fn sample_map() -> WordMap {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,run,\"a quick, short run\",verb").unwrap();
        writeln!(file, "1,walk,\"\",noun").unwrap();
        let (map, _) = crate::words::load_words(file.path(), ",").unwrap();
        map
    }

    #[test]
    fn csv_export_quotes_embedded_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&path, &sample_map()).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "run,\"a quick, short run\",verb");
        assert_eq!(lines[1], "walk,,noun");
    }

    #[test]
    fn txt_export_is_one_headword_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_txt(&path, &sample_map()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "run\nwalk\n");
    }

    #[test]
    fn json_export_keeps_only_the_text_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, true, &sample_map()).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"[{"text":"run"},{"text":"walk"}]"#
        );
    }

    #[test]
    fn pretty_json_is_indented() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, false, &sample_map()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\n  "));
    }
}
