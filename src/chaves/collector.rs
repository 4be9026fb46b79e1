use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::{
    chaves::{client::PageFetcher, extract::extract_listings},
    logger::LogSink,
    models::{listing::Listing, page::PageMetadata},
    storage,
};

/// Hard ceiling on how deep a single category is crawled.
pub const MAX_PAGES: u32 = 100;

pub struct Collector<F: PageFetcher> {
    fetcher: F,
    log: Arc<dyn LogSink>,
    base_url: String,
    base_path: String,
    error_dir: PathBuf,
    page_delay: Duration,
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(
        fetcher: F,
        log: Arc<dyn LogSink>,
        base_url: impl Into<String>,
        base_path: impl Into<String>,
        error_dir: impl Into<PathBuf>,
        page_delay: Duration,
    ) -> Collector<F> {
        Collector {
            fetcher,
            log,
            base_url: base_url.into(),
            base_path: base_path.into(),
            error_dir: error_dir.into(),
            page_delay,
        }
    }

    pub fn first_page_url(&self, level1: &str, level2: &str, first: u32) -> String {
        format!(
            "{}{}?level1={}&level2={}&pg={}",
            self.base_url, self.base_path, level1, level2, first
        )
    }

    /// Walks the pages of one `level1`/`level2` category starting at `first`.
    ///
    /// A `last` of zero, below zero or above [`MAX_PAGES`] means "as many as the
    /// API reports", capped at [`MAX_PAGES`]. Only a failure on the first page
    /// is returned as an error, later pages are logged, dumped and skipped.
    pub async fn collect(
        &self,
        level1: &str,
        level2: &str,
        first: u32,
        last: i64,
    ) -> Result<Vec<Listing>> {
        let mut listings: Vec<Listing> = Vec::new();

        let url = self.first_page_url(level1, level2, first);
        self.log.info(&format!("Collecting page {first}..."));

        let mut payload: Value = self.fetcher.fetch(&url).await?;
        listings.extend(extract_listings(&payload)?);

        let metadata = PageMetadata::from_payload(&payload);
        let last = self.last_page(&metadata, last);
        let mut next_url = self.next_url(&metadata);

        for page in (first + 1)..=last {
            self.log.info(&format!("Collecting page {page}..."));

            let fetched = if next_url.is_empty() {
                Err(anyhow!("no link to page {page}"))
            } else {
                self.fetcher.fetch(&next_url).await
            };

            // next_url is only advanced on success, a failed page is retried
            // by the following iteration.
            match fetched {
                Ok(fetched) => {
                    payload = fetched;
                    match extract_listings(&payload) {
                        Ok(page_listings) => {
                            listings.extend(page_listings);
                            next_url = self.next_url(&PageMetadata::from_payload(&payload));
                        }
                        Err(e) => self.page_failed(&payload, level2, page, &e),
                    }
                }
                Err(e) => self.page_failed(&payload, level2, page, &e),
            }

            tokio::time::sleep(self.page_delay).await;
        }

        Ok(listings)
    }

    fn last_page(&self, metadata: &PageMetadata, requested: i64) -> u32 {
        if requested > 0 && requested <= MAX_PAGES as i64 {
            return requested as u32;
        }

        let total = metadata.total_pages;
        self.log.info(&format!("Total number of pages: {total}"));

        if total > MAX_PAGES as u64 {
            self.log.warn(&format!("Only up to page {MAX_PAGES} is collected"));
            return MAX_PAGES;
        }

        total as u32
    }

    fn next_url(&self, metadata: &PageMetadata) -> String {
        let params = &metadata.links.next_api_params;
        if params.is_empty() {
            return String::new();
        }

        format!("{}{}{}", self.base_url, self.base_path, params)
    }

    fn page_failed(&self, payload: &Value, level2: &str, page: u32, err: &anyhow::Error) {
        self.log.error(&format!("Error while collecting page {page}: {err:#}"));

        let path = storage::error_dump_path(&self.error_dir, level2, page);
        if let Err(e) = storage::save_payload_json(payload, &path) {
            self.log.error(&format!(
                "Failed to save payload to {}: {e:#}",
                path.display()
            ));
        }
    }
}
