pub mod chaves;
pub mod config;
pub mod logger;
pub mod models;
pub mod producer;
pub mod replay;
pub mod storage;
