use std::sync::{atomic::AtomicBool, Arc};

use anyhow::Result;
use chaves::{
    chaves::{client::HttpFetcher, collector::Collector},
    config::{self, Config},
    logger::{setup_logger, FacadeSink},
    producer::crawl_producer::CrawlProducer,
};
use log::{error, info};
use signal_hook::consts::SIGINT;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    setup_logger()?;

    let config: Arc<Config> = Arc::new(config::read_config());

    let shutdown = Arc::new(AtomicBool::new(false));
    // First Ctrl-C finishes the current category, a second one exits.
    signal_hook::flag::register_conditional_shutdown(SIGINT, 1, Arc::clone(&shutdown))?;
    signal_hook::flag::register(SIGINT, Arc::clone(&shutdown))?;

    let fetcher = HttpFetcher::new(config.request_timeout())?;
    let collector = Collector::new(
        fetcher,
        Arc::new(FacadeSink),
        config.base_url.clone(),
        config.base_path.clone(),
        config.error_dir.clone(),
        config.page_delay(),
    );

    match CrawlProducer::run(&config, &collector, shutdown).await {
        Ok(summary) => {
            info!(
                "Saved {} listings for {} categories ({} skipped, {} empty)",
                summary.listings, summary.collected, summary.skipped, summary.empty
            );
            Ok(())
        }
        Err(err) => {
            error!("Error: {:?}", err);
            Err(err)
        }
    }
}
