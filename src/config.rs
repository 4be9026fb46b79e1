use anyhow::{Context, Result};
use dotenvy::dotenv;
use log::error;
use serde::Deserialize;
use std::{env, path::Path, time::Duration};

const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub base_path: String,
    pub level1: String,
    pub level2: Option<String>,
    pub categories_path: String,
    pub output_dir: String,
    pub error_dir: String,
    pub first_page: u32,
    pub last_page: i64,
    pub request_timeout_seconds: u64,
    pub page_delay_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: String::from("https://www.chavesnamao.com.br"),
            base_path: String::from("/api/realestate/listing/items/"),
            level1: String::from("casas-a-venda"),
            level2: None,
            categories_path: String::from("dados/chavesnamao_level2.txt"),
            output_dir: String::from("dados/anuncios"),
            error_dir: String::from("dados"),
            first_page: 1,
            last_page: -1,
            request_timeout_seconds: 15,
            page_delay_millis: 100,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_millis)
    }
}

pub fn create_test_config() -> Config {
    Config {
        base_url: "http://127.0.0.1:0".to_string(),
        level1: "imoveis-a-venda".to_string(),
        categories_path: "xxx".to_string(),
        output_dir: "xxx".to_string(),
        error_dir: "xxx".to_string(),
        request_timeout_seconds: 5,
        page_delay_millis: 0,
        ..Config::default()
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Reads the config from the file named by `CONFIG_PATH`, falling back to
/// the defaults when the variable is unset. Exits on a broken config file.
pub fn read_config() -> Config {
    dotenv().ok();
    match env::var(CONFIG_PATH_ENV) {
        Ok(config_path) => load_config(&config_path).unwrap_or_else(|err| {
            error!("failed to read config: {err:#}");
            std::process::exit(1);
        }),
        Err(_) => Config::default(),
    }
}
