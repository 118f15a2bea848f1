//! Cache-aside layer for the post feed.
//!
//! One coarse key, [`ALL_POSTS_KEY`], holds the JSON snapshot of the whole
//! feed. It is filled on a miss and deleted after every post write, so there
//! is never partial invalidation to reason about.

pub mod feed;
pub mod local;
pub mod redis;

pub use feed::FeedCache;
pub use local::LocalStore;
pub use self::redis::RedisStore;

use axum::async_trait;

pub const ALL_POSTS_KEY: &str = "posts:all";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache pool: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
    #[error("redis: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("cache call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Minimal key-value surface the feed cache needs. Values never expire.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;
    async fn del(&self, key: &str) -> Result<(), CacheError>;
}
