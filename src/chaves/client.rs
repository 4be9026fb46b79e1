use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use serde_json::Value;

/// Fetches one page payload from a fully built URL.
pub trait PageFetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>>;
}

impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>> {
        (**self).fetch(url)
    }
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<HttpFetcher> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .with_context(|| format!("Failed to reach {url}"))?
                .error_for_status()?;

            let payload: Value = response
                .json()
                .await
                .with_context(|| format!("Failed to decode page payload from {url}"))?;

            Ok(payload)
        })
    }
}
