pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{ApiError, FailureClass, FetchError, KeyStoreError};
pub use models::{EnrichedVideo, FetchSettings, Rating, SortKey, SortOrder, VideoItem};
