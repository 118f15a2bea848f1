pub mod follows;
#[cfg(test)]
pub mod memory;
pub mod posts;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use diesel_async::pooled_connection::deadpool;
use diesel_async::AsyncPgConnection;

use crate::auth::TokenKeys;
use crate::cache::{CacheStore, FeedCache};

use follows::{FollowService, FollowServiceDb};
use posts::{PostService, PostServiceDb};
use users::{UserService, UserServiceDb};

pub type Pool = deadpool::Pool<AsyncPgConnection>;

/// Repository handle shared across request tasks.
pub trait Svc: Send + Sync + 'static {}

pub trait DbService {
    fn new(db: Pool) -> Self;
}

/// Everything a resolver needs, injected into the schema once at start-up.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserService>,
    pub posts: Arc<dyn PostService>,
    pub follows: Arc<dyn FollowService>,
    pub feed: FeedCache,
    pub tokens: Arc<TokenKeys>,
}

impl Services {
    pub fn new(
        users: Arc<dyn UserService>,
        posts: Arc<dyn PostService>,
        follows: Arc<dyn FollowService>,
        cache: Arc<dyn CacheStore>,
        cache_timeout: Duration,
        tokens: TokenKeys,
    ) -> Self {
        let feed = FeedCache::new(cache, posts.clone(), cache_timeout);
        Self {
            users,
            posts,
            follows,
            feed,
            tokens: Arc::new(tokens),
        }
    }

    pub fn postgres(
        db: Pool,
        cache: Arc<dyn CacheStore>,
        cache_timeout: Duration,
        tokens: TokenKeys,
    ) -> Self {
        Self::new(
            Arc::new(UserServiceDb::new(db.clone())),
            Arc::new(PostServiceDb::new(db.clone())),
            Arc::new(FollowServiceDb::new(db)),
            cache,
            cache_timeout,
            tokens,
        )
    }
}
