use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::models::post::Post;
use crate::services::posts::PostService;

use super::{CacheError, CacheStore, ALL_POSTS_KEY};

/// Cache-aside wrapper around [`PostService::fetch_all_posts`].
///
/// Cache failures never fail a request: reads fall back to the repository
/// and a failed invalidation is only logged. Every store call is bounded by
/// `timeout`. After a failed invalidation the stored snapshot is not trusted
/// until a fresh feed has been written over it.
#[derive(Clone)]
pub struct FeedCache {
    store: Arc<dyn CacheStore>,
    posts: Arc<dyn PostService>,
    timeout: Duration,
    stale: Arc<AtomicBool>,
}

impl FeedCache {
    pub fn new(store: Arc<dyn CacheStore>, posts: Arc<dyn PostService>, timeout: Duration) -> Self {
        Self {
            store,
            posts,
            timeout,
            stale: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| Err(CacheError::Timeout(self.timeout)))
    }

    #[tracing::instrument(skip_all)]
    pub async fn get_all_posts_cached(&self) -> ApiResult<Vec<Post>> {
        if self.stale.load(Ordering::Acquire) {
            debug!(key = ALL_POSTS_KEY, "cached feed pending invalidation, skipping read");
        } else {
            match self.bounded(self.store.get(ALL_POSTS_KEY)).await {
                Ok(Some(raw)) => match serde_json::from_str::<Vec<Post>>(&raw) {
                    Ok(posts) => {
                        debug!(key = ALL_POSTS_KEY, count = posts.len(), "cache hit");
                        return Ok(posts);
                    }
                    Err(e) => {
                        warn!(key = ALL_POSTS_KEY, error = %e, "discarding undecodable cache entry")
                    }
                },
                Ok(None) => debug!(key = ALL_POSTS_KEY, "cache miss"),
                Err(e) => {
                    warn!(key = ALL_POSTS_KEY, error = %e, "cache read failed, using repository")
                }
            }
        }

        let posts = self.posts.fetch_all_posts().await?;

        match serde_json::to_string(&posts) {
            Ok(raw) => match self.bounded(self.store.set(ALL_POSTS_KEY, raw)).await {
                Ok(()) => self.stale.store(false, Ordering::Release),
                Err(e) => warn!(key = ALL_POSTS_KEY, error = %e, "cache populate failed"),
            },
            Err(e) => warn!(key = ALL_POSTS_KEY, error = %e, "feed not serializable"),
        }

        Ok(posts)
    }

    /// Drop the cached feed. Must run before a post write returns.
    #[tracing::instrument(skip_all)]
    pub async fn invalidate_all_posts(&self) {
        match self.bounded(self.store.del(ALL_POSTS_KEY)).await {
            Ok(()) => {
                self.stale.store(false, Ordering::Release);
                debug!(key = ALL_POSTS_KEY, "cache invalidated");
            }
            Err(e) => {
                self.stale.store(true, Ordering::Release);
                warn!(key = ALL_POSTS_KEY, error = %e, "cache invalidation failed");
            }
        }
    }
}
