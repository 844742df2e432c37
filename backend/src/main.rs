use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};

use shorts_finder::config::{
    init_logger, load_environment, API_KEYS_FILE, DEFAULT_KEYWORDS, YOUTUBE_API_BASE_URL,
    YOUTUBE_API_KEYS,
};
use shorts_finder::models::{EnrichedVideo, FetchSettings, SortKey, SortOrder};
use shorts_finder::services::key_manager::{parse_key_input, validate_key};
use shorts_finder::services::{
    crawl_keywords, has_viral_hit, rank_videos, CredentialStore, QuotaAwareClient,
    ReqwestTransport,
};
use shorts_finder::utils::{parse_keywords, video_url};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Total,
    Daily,
}

#[derive(Parser, Debug)]
#[command(name = "shorts-finder", about = "Find trending YouTube Shorts by keyword")]
struct Args {
    /// Comma separated search keywords
    #[arg(short, long)]
    keywords: Option<String>,

    /// Only videos published within this many days
    #[arg(long)]
    days: Option<i64>,

    /// Search result pages per keyword (50 results each)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum accepted videos per keyword
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    min_views: Option<i64>,

    /// Maximum duration in seconds
    #[arg(long)]
    max_duration: Option<i64>,

    /// Do not enforce the 60 second Shorts cap
    #[arg(long)]
    allow_long: bool,

    /// API keys, comma or newline separated. Used for this run only unless
    /// --save-keys is given.
    #[arg(long)]
    keys: Option<String>,

    /// Write the keys passed with --keys to the key file
    #[arg(long, requires = "keys")]
    save_keys: bool,

    #[arg(long, value_enum, default_value = "total")]
    sort: SortArg,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

fn build_store(args: &Args) -> CredentialStore {
    match (&args.keys, &*YOUTUBE_API_KEYS) {
        (Some(keys), _) if args.save_keys => {
            let mut store = CredentialStore::from_file(API_KEYS_FILE.as_path());
            store.replace_all(parse_key_input(keys));
            info!("Saved {} API keys to {}", store.len(), API_KEYS_FILE.display());
            store
        }
        (Some(keys), _) => CredentialStore::from_env_value(keys),
        (None, Some(env_keys)) => CredentialStore::from_env_value(env_keys),
        (None, None) => CredentialStore::from_file(API_KEYS_FILE.as_path()),
    }
}

fn build_settings(args: &Args) -> FetchSettings {
    let defaults = FetchSettings::default();
    FetchSettings {
        days: args.days.unwrap_or(defaults.days),
        max_pages: args.max_pages.unwrap_or(defaults.max_pages),
        min_views: args.min_views.unwrap_or(defaults.min_views),
        max_duration_seconds: args.max_duration.unwrap_or(defaults.max_duration_seconds),
        limit_per_keyword: args.limit.unwrap_or(defaults.limit_per_keyword),
        only_shorts: !args.allow_long,
    }
}

fn print_table(results: &[EnrichedVideo]) {
    for video in results {
        println!(
            "{:>12} {:<4} {:>10}/day {:>8}  {} | {}  {}",
            video.video.view_count(),
            video.rating.marker(),
            video.daily_views as i64,
            video.formatted_duration,
            video.video.title(),
            video.video.channel_title(),
            video_url(&video.video.id),
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    load_environment();
    init_logger();

    let args = Args::parse();

    let mut store = build_store(&args);
    if store.is_empty() {
        error!(
            "No API keys configured. Pass --keys, set YOUTUBE_API_KEYS or create {}",
            API_KEYS_FILE.display()
        );
    }
    for (index, key) in store.keys().iter().enumerate() {
        if !validate_key(key) {
            warn!("API key at index {index} looks malformed");
        }
    }

    let keywords = match &args.keywords {
        Some(input) => parse_keywords(input),
        None => DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
    };
    let settings = build_settings(&args);
    info!("Searching {keywords:?} with {settings:?}");

    let transport = ReqwestTransport::new(&YOUTUBE_API_BASE_URL)
        .context("YOUTUBE_API_BASE_URL is not a valid URL")?;
    let mut client = QuotaAwareClient::new(&mut store, transport);

    let progress = |percent: u8, message: &str| info!("[{percent:>3}%] {message}");
    let mut results = crawl_keywords(&mut client, &keywords, &settings, &progress).await;

    let key = match args.sort {
        SortArg::Total => SortKey::TotalViews,
        SortArg::Daily => SortKey::DailyViews,
    };
    rank_videos(&mut results, key, SortOrder::Desc);

    if has_viral_hit(&results) {
        info!("Found a video with over ten million views!");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&results);
    }
    info!("Found {} videos", results.len());

    Ok(())
}
