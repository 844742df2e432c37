use env_logger::Builder;
use lazy_static::lazy_static;
use log::{info, LevelFilter};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Maximum page size for `search.list` and id count for `videos.list`.
pub const API_PAGE_SIZE: usize = 50;

/// Hard duration cap for short-form videos, in seconds.
pub const SHORTS_MAX_SECONDS: i64 = 60;

pub const DEFAULT_KEYWORDS: &[&str] = &["CAT", "CUTE"];

fn env_or<T: FromStr>(name: &str, fallback: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(fallback)
}

lazy_static! {
    pub static ref API_KEYS_FILE: PathBuf =
        PathBuf::from(env::var("API_KEYS_FILE").unwrap_or_else(|_| "api_keys.json".to_string()));
    pub static ref YOUTUBE_API_BASE_URL: String = env::var("YOUTUBE_API_BASE_URL")
        .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string());
    /// Keys supplied through the environment instead of the key file.
    pub static ref YOUTUBE_API_KEYS: Option<String> = env::var("YOUTUBE_API_KEYS")
        .ok()
        .filter(|v| !v.trim().is_empty());
    pub static ref DEFAULT_DAYS: i64 = env_or("SHORTS_DAYS", 30);
    pub static ref DEFAULT_MAX_PAGES: u32 = env_or("SHORTS_MAX_PAGES", 5);
    pub static ref DEFAULT_LIMIT_PER_KEYWORD: usize = env_or("SHORTS_LIMIT", 50);
    pub static ref DEFAULT_MIN_VIEWS: i64 = env_or("SHORTS_MIN_VIEWS", 100_000);
    pub static ref DEFAULT_MAX_DURATION: i64 = env_or("SHORTS_MAX_DURATION", SHORTS_MAX_SECONDS);
}

pub fn init_logger() {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
    info!("Starting shorts finder...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}
