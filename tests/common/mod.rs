#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use chaves::chaves::client::PageFetcher;
use futures::future::BoxFuture;
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://api.test";
pub const BASE_PATH: &str = "/items/";

pub fn page_params(level2: &str, page: u32) -> String {
    format!("?level1=x&level2={level2}&pg={page}")
}

pub fn page_url(level2: &str, page: u32) -> String {
    format!("{BASE_URL}{BASE_PATH}{}", page_params(level2, page))
}

/// Page `page` of `total`, with two listings whose ids are `page * 10` and
/// `page * 10 + 1`.
pub fn page_payload(level2: &str, page: u32, total: u32) -> Value {
    let next = if page < total {
        page_params(level2, page + 1)
    } else {
        String::new()
    };

    json!({
        "items": [
            {"id": page * 10, "title": format!("listing {}", page * 10)},
            {"id": page * 10 + 1, "title": format!("listing {}", page * 10 + 1)}
        ],
        "metadata": {"totalPages": total, "links": {"nextApiParams": next}}
    })
}

/// Answers each URL from a queue of canned responses and records every call.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, String>>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> ScriptedFetcher {
        ScriptedFetcher::default()
    }

    pub fn ok(self, url: String, payload: Value) -> ScriptedFetcher {
        self.push(url, Ok(payload))
    }

    pub fn fail(self, url: String, reason: &str) -> ScriptedFetcher {
        self.push(url, Err(reason.to_string()))
    }

    /// Serves `level2` pages `1..=total` in order.
    pub fn pages(mut self, level2: &str, total: u32) -> ScriptedFetcher {
        for page in 1..=total {
            self = self.ok(page_url(level2, page), page_payload(level2, page, total));
        }
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(self, url: String, response: Result<Value, String>) -> ScriptedFetcher {
        self.responses
            .lock()
            .unwrap()
            .entry(url)
            .or_default()
            .push_back(response);
        self
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(url.to_string());
            let response = self
                .responses
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(VecDeque::pop_front);

            match response {
                Some(Ok(payload)) => Ok(payload),
                Some(Err(reason)) => Err(anyhow!(reason)),
                None => Err(anyhow!("no response scripted for {url}")),
            }
        })
    }
}
