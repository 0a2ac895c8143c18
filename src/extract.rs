use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::info;

static RESULT_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.resultsSetItemBody").unwrap());
static HEADWORD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.hw").unwrap());
static SNIPPET: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div.snippet").unwrap());
static PART_OF_SPEECH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span.ps").unwrap());

/// Parallel word/snippet/part-of-speech lists extracted from one results page.
pub struct PageWords {
    pub words: Vec<String>,
    pub snippets: Vec<String>,
    pub parts_of_speech: Vec<String>,
}

impl PageWords {
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Extract all result items from a search page.
///
/// A result item missing one of its three fields shortens that field's list;
/// when the lists end up with different lengths the whole page is treated as
/// malformed and `None` is returned so the caller can skip it.
pub fn extract_words(html: &str) -> Option<PageWords> {
    let document = Html::parse_document(html);

    let mut words = Vec::new();
    let mut snippets = Vec::new();
    let mut parts_of_speech = Vec::new();

    for item in document.select(&RESULT_ITEM) {
        if let Some(hw) = item.select(&HEADWORD).next() {
            words.push(element_text(hw));
        }
        if let Some(snippet) = item.select(&SNIPPET).next() {
            snippets.push(quote_wrap(&element_text(snippet)));
        }
        if let Some(ps) = item.select(&PART_OF_SPEECH).next() {
            parts_of_speech.push(element_text(ps));
        }
    }

    info!(
        "Words: {}\tSnippets: {}\tParts of Speech: {}",
        words.len(),
        snippets.len(),
        parts_of_speech.len()
    );

    if words.len() != snippets.len() || snippets.len() != parts_of_speech.len() {
        return None;
    }

    Some(PageWords {
        words,
        snippets,
        parts_of_speech,
    })
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Normalize inner double quotes to single quotes and wrap the snippet, so it
/// stays a single field no matter which delimiter the log uses.
fn quote_wrap(snippet: &str) -> String {
    format!("\"{}\"", snippet.replace('"', "'"))
}

// ── Tests ──
