mod common;

#[cfg(test)]
mod producer_tests {
    use std::{
        fs,
        sync::{atomic::AtomicBool, Arc},
        time::Duration,
    };

    use chaves::{
        chaves::collector::Collector,
        config::{self, Config},
        logger::MemorySink,
        models::listing::Listing,
        producer::crawl_producer::{read_categories, CrawlProducer, CrawlSummary},
        storage::listings_path,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::common::{page_url, ScriptedFetcher, BASE_PATH, BASE_URL};

    fn test_config(dir: &TempDir, categories: &str) -> Arc<Config> {
        let categories_path = dir.path().join("level2.txt");
        fs::write(&categories_path, categories).unwrap();

        Arc::new(Config {
            level1: "x".to_string(),
            categories_path: categories_path.display().to_string(),
            output_dir: dir.path().join("out").display().to_string(),
            error_dir: dir.path().display().to_string(),
            first_page: 1,
            last_page: 3,
            ..config::create_test_config()
        })
    }

    fn collector(
        fetcher: Arc<ScriptedFetcher>,
        config: &Config,
    ) -> Collector<Arc<ScriptedFetcher>> {
        Collector::new(
            fetcher,
            Arc::new(MemorySink::new()),
            BASE_URL,
            BASE_PATH,
            config.error_dir.clone(),
            Duration::ZERO,
        )
    }

    fn read_jsonl(path: &std::path::Path) -> Vec<Listing> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn categories_skip_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("level2.txt");
        fs::write(&path, "go-goiania\n\n  sp-sao-paulo \n").unwrap();

        assert_eq!(
            read_categories(&path).unwrap(),
            vec!["go-goiania".to_string(), "sp-sao-paulo".to_string()]
        );
    }

    #[tokio::test]
    async fn collects_each_category_into_its_own_file() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, "a\nb\n");
        let fetcher = Arc::new(ScriptedFetcher::new().pages("a", 3).pages("b", 2));
        let collector = collector(fetcher.clone(), &config);

        let summary = CrawlProducer::run(&config, &collector, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();

        assert_eq!(
            summary,
            CrawlSummary {
                collected: 2,
                skipped: 0,
                empty: 0,
                listings: 10,
            }
        );

        let a = read_jsonl(&listings_path(&config.output_dir, "a"));
        assert_eq!(a.iter().map(|l| l.id).collect::<Vec<_>>(), vec![10, 11, 20, 21, 30, 31]);
        assert_eq!(a[0].title, "listing 10");
        assert_eq!(read_jsonl(&listings_path(&config.output_dir, "b")).len(), 4);
    }

    #[tokio::test]
    async fn existing_output_is_skipped() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, "a\nb\n");
        let existing = listings_path(&config.output_dir, "a");
        fs::create_dir_all(existing.parent().unwrap()).unwrap();
        fs::write(&existing, "kept\n").unwrap();

        let fetcher = Arc::new(ScriptedFetcher::new().pages("b", 1));
        let collector = collector(fetcher.clone(), &config);

        let summary = CrawlProducer::run(&config, &collector, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.collected, 1);
        assert_eq!(fs::read_to_string(&existing).unwrap(), "kept\n");
        assert!(fetcher.calls().iter().all(|url| url.contains("level2=b")));
    }

    #[tokio::test]
    async fn empty_category_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, "a\n");
        let fetcher = Arc::new(ScriptedFetcher::new().ok(
            page_url("a", 1),
            json!({"items": [], "metadata": {"totalPages": 1}}),
        ));
        let collector = collector(fetcher, &config);

        let summary = CrawlProducer::run(&config, &collector, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();

        assert_eq!(summary.empty, 1);
        assert!(!listings_path(&config.output_dir, "a").exists());
    }

    #[tokio::test]
    async fn single_level2_overrides_categories_file() {
        let dir = TempDir::new().unwrap();
        let mut config = (*test_config(&dir, "a\nb\n")).clone();
        config.level2 = Some("go-goiania".to_string());
        let config = Arc::new(config);

        let fetcher = Arc::new(ScriptedFetcher::new().pages("go-goiania", 1));
        let collector = collector(fetcher.clone(), &config);

        let summary = CrawlProducer::run(&config, &collector, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap();

        assert_eq!(summary.collected, 1);
        assert_eq!(fetcher.calls(), vec![page_url("go-goiania", 1)]);
    }

    #[tokio::test]
    async fn first_page_failure_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, "a\nb\n");
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .fail(page_url("a", 1), "bad gateway")
                .pages("b", 1),
        );
        let collector = collector(fetcher.clone(), &config);

        let err = CrawlProducer::run(&config, &collector, Arc::new(AtomicBool::new(false)))
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("x / a"));
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_flag_stops_before_next_category() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, "a\n");
        let fetcher = Arc::new(ScriptedFetcher::new().pages("a", 1));
        let collector = collector(fetcher.clone(), &config);

        let summary = CrawlProducer::run(&config, &collector, Arc::new(AtomicBool::new(true)))
            .await
            .unwrap();

        assert_eq!(summary, CrawlSummary::default());
        assert!(fetcher.calls().is_empty());
    }
}
