use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::{Context, Result};
use log::info;

use crate::{
    chaves::{client::PageFetcher, collector::Collector},
    config::Config,
    storage,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CrawlSummary {
    pub collected: usize,
    pub skipped: usize,
    pub empty: usize,
    pub listings: usize,
}

pub struct CrawlProducer;

impl CrawlProducer {
    /// Collects every configured category that has no output file yet.
    pub async fn run<F: PageFetcher>(
        config: &Arc<Config>,
        collector: &Collector<F>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<CrawlSummary> {
        let start = Instant::now();
        let mut summary = CrawlSummary::default();

        for level2 in categories(config)? {
            if shutdown.load(Ordering::Acquire) {
                info!("Shutdown requested, stopping before {}", level2);
                break;
            }

            let output = storage::listings_path(&config.output_dir, &level2);
            if output.exists() {
                info!("File {} already exists, skipping", output.display());
                summary.skipped += 1;
                continue;
            }

            info!("Collecting listings for {} / {}...", config.level1, level2);
            let listings = collector
                .collect(&config.level1, &level2, config.first_page, config.last_page)
                .await
                .with_context(|| {
                    format!("Failed to collect first page of {} / {}", config.level1, level2)
                })?;

            if listings.is_empty() {
                info!("No listings found for {} / {}", config.level1, level2);
                summary.empty += 1;
                continue;
            }

            info!("Saving {} listings to {}...", listings.len(), output.display());
            storage::write_listings_jsonl(&listings, &output)?;
            summary.collected += 1;
            summary.listings += listings.len();
        }

        info!("Finished crawl run in {:?}", start.elapsed());
        Ok(summary)
    }
}

/// A single configured `level2` wins over the categories file.
fn categories(config: &Config) -> Result<Vec<String>> {
    if let Some(level2) = &config.level2 {
        return Ok(vec![level2.clone()]);
    }

    read_categories(&config.categories_path)
}

pub fn read_categories(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read categories from {}", path.display()))?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}
