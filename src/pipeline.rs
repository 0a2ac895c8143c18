use std::time::Duration;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::extract;
use crate::fetch::PageSource;
use crate::store::AppendLog;

pub struct CrawlOptions {
    pub starting_page: u32,
    /// Pages to crawl, counted from the starting page. `None` keeps going
    /// until a fetch comes back empty.
    pub max_pages: Option<u32>,
    pub request_delay: u64,
}

pub struct CrawlSummary {
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    pub words_appended: usize,
}

impl CrawlSummary {
    pub fn print(&self) {
        println!(
            "Crawled {} pages ({} skipped), appended {} words.",
            self.pages_fetched, self.pages_skipped, self.words_appended
        );
    }
}

/// Drive the crawl: fetch a page, extract its words, append them to the log,
/// advance the cursor, sleep, repeat.
///
/// Failing to fetch the starting page is fatal; a failed fetch on any later
/// page just means the end of the crawl.
pub async fn run<S: PageSource>(
    source: &mut S,
    log: &AppendLog,
    opts: &CrawlOptions,
) -> Result<CrawlSummary> {
    let mut summary = CrawlSummary {
        pages_fetched: 0,
        pages_skipped: 0,
        words_appended: 0,
    };
    let mut page = opts.starting_page;

    let Some(mut content) = source.fetch(page).await else {
        bail!("Could not fetch starting page {}", page);
    };

    loop {
        summary.pages_fetched += 1;

        match extract::extract_words(&content) {
            Some(words) => {
                summary.words_appended += log.append(page, &words)?;
            }
            None => {
                warn!("List length mismatch on page {}, skipping", page);
                summary.pages_skipped += 1;
            }
        }

        if let Some(max) = opts.max_pages {
            if summary.pages_fetched >= max {
                break;
            }
        }

        page += 1;
        tokio::time::sleep(Duration::from_secs(opts.request_delay)).await;

        match source.fetch(page).await {
            Some(next) => content = next,
            None => {
                info!("No content for page {}, ending crawl", page);
                break;
            }
        }
    }

    Ok(summary)
}

// ── Tests ──
