pub mod crawler;
pub mod data_processor;
pub mod key_manager;
pub mod search_service;
pub mod video_service;
pub mod youtube_client;

pub use crawler::{
    crawl_keywords, fetch_and_filter, has_viral_hit, rank_videos, NoProgress, ProgressObserver,
};
pub use key_manager::{CredentialStore, FileKeyPersistence, KeyPersistence, MemoryKeyPersistence};
pub use youtube_client::{QuotaAwareClient, ReqwestTransport, YouTubeTransport};
