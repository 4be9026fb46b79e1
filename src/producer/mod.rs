pub mod crawl_producer;
