use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

const SEARCH_URL: &str = "https://www.oed.com/search/advanced/Entries";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36 Edg/127.0.0.0";
const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
    image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";

/// Why a single fetch attempt produced no content.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("status {0}")]
    Status(StatusCode),
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        FetchFailure::Transport(err.to_string())
    }
}

/// Anything the pipeline driver can pull pages from.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// One logical fetch for a page: all failure handling happens inside and
    /// `None` means the page is unavailable for good.
    async fn fetch(&mut self, page: u32) -> Option<String>;
}

/// HTTP fetcher for the advanced-search result pages. One `Client` is reused
/// across the whole crawl so the connection to the server stays open.
pub struct Fetcher {
    client: Client,
    error_delay: Duration,
    max_retries: u32,
}

impl Fetcher {
    pub fn new(error_delay_secs: u64, max_retries: u32) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            error_delay: Duration::from_secs(error_delay_secs),
            max_retries,
        })
    }
}

/// One GET against the search endpoint.
pub(crate) trait Attempt {
    async fn attempt(&mut self, page: u32) -> Result<String, FetchFailure>;
}

impl Attempt for Fetcher {
    async fn attempt(&mut self, page: u32) -> Result<String, FetchFailure> {
        let page_param = page.to_string();
        let params = [
            ("textTermOpt0", "WordPhrase"),
            ("dateOfUseFirstUse", "false"),
            ("sortOption", "AZ"),
            ("page", page_param.as_str()),
            ("obsolescence", "inCurrentUse"),
        ];

        let start = Instant::now();
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&params)
            .send()
            .await?;
        info!(
            "Received content for page {} in {:.3} seconds",
            page,
            start.elapsed().as_secs_f64()
        );

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status));
        }

        Ok(response.text().await?)
    }
}

impl PageSource for Fetcher {
    async fn fetch(&mut self, page: u32) -> Option<String> {
        let (delay, retries) = (self.error_delay, self.max_retries);
        fetch_with_retry(self, page, delay, retries).await
    }
}

/// Retry policy for one logical fetch: a bad status sleeps `error_delay` and
/// tries again, with one attempt counter that persists until `max_retries` is
/// spent. Transport errors give up immediately.
async fn fetch_with_retry<A: Attempt>(
    source: &mut A,
    page: u32,
    error_delay: Duration,
    max_retries: u32,
) -> Option<String> {
    let mut retries = 0u32;
    loop {
        match source.attempt(page).await {
            Ok(content) => return Some(content),
            Err(FetchFailure::Transport(err)) => {
                warn!("Error occurred fetching page {}: {}", page, err);
                return None;
            }
            Err(FetchFailure::Status(status)) => {
                if retries >= max_retries {
                    warn!(
                        "Giving up on page {} after {} retries (last status {})",
                        page, retries, status
                    );
                    return None;
                }
                retries += 1;
                warn!(
                    "Status {} for page {}, retry {}/{} in {}s",
                    status,
                    page,
                    retries,
                    max_retries,
                    error_delay.as_secs()
                );
                tokio::time::sleep(error_delay).await;
            }
        }
    }
}

// ── Tests ──
