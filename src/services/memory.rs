//! In-process repositories backed by `DashMap`, used by tests in place of
//! Postgres. They follow the same contracts as the `*Db` services, including
//! atomic like uniqueness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::{self, TokenKeys};
use crate::cache::LocalStore;
use crate::error::{ApiError, ApiResult};
use crate::models::follow::{Follow, FollowRow, NewFollow};
use crate::models::post::*;
use crate::models::user::*;

use super::follows::{reject_self_follow, FollowService};
use super::posts::PostService;
use super::users::UserService;
use super::{Services, Svc};

struct StoredPost {
    row: PostRow,
    comments: Vec<CommentRow>,
    likes: Vec<LikeRow>,
}

#[derive(Default)]
pub struct MemoryDb {
    users: DashMap<Uuid, Credentials>,
    posts: DashMap<Uuid, StoredPost>,
    follows: DashMap<Uuid, FollowRow>,
    post_reads: AtomicUsize,
}

impl Svc for MemoryDb {}

impl MemoryDb {
    /// Number of `fetch_all_posts` calls served so far.
    pub fn post_reads(&self) -> usize {
        self.post_reads.load(Ordering::SeqCst)
    }

    pub fn like_count(&self, post_id: Uuid) -> usize {
        self.posts.get(&post_id).map(|p| p.likes.len()).unwrap_or(0)
    }

    pub fn password_hash(&self, id: Uuid) -> Option<String> {
        self.users.get(&id).map(|c| c.password_hash.clone())
    }

    fn user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|c| c.user.clone())
    }

    fn find_user(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        let mut found: Vec<User> = self
            .users
            .iter()
            .filter(|c| pred(&c.user))
            .map(|c| c.user.clone())
            .collect();
        found.sort_by_key(|u| u.id);
        found.into_iter().next()
    }

    fn assemble(&self, stored: &StoredPost) -> Option<Post> {
        let author = self.user(stored.row.author_id)?;
        Some(Post::assemble(
            stored.row.clone(),
            Some(author),
            stored.comments.clone(),
            stored.likes.clone(),
        ))
    }

    fn ensure_unique(&self, input: &UserInput, except: Option<Uuid>) -> ApiResult<()> {
        let taken = self.users.iter().any(|c| {
            Some(c.user.id) != except
                && (c.user.username == input.username || c.user.email == input.email)
        });
        if taken {
            return Err(ApiError::Conflict("Username or email already exists".into()));
        }
        Ok(())
    }

    fn edges<F>(&self, matches: F) -> Vec<User>
    where
        F: Fn(&FollowRow) -> Option<Uuid>,
    {
        let mut rows: Vec<(Uuid, Uuid)> = self
            .follows
            .iter()
            .filter_map(|f| matches(f.value()).map(|other| (f.id, other)))
            .collect();
        rows.sort_by_key(|(id, _)| *id);
        rows.into_iter()
            .filter_map(|(_, other)| self.user(other))
            .collect()
    }
}

#[async_trait]
impl UserService for MemoryDb {
    async fn find_all_users(&self) -> ApiResult<Vec<User>> {
        let mut all: Vec<User> = self.users.iter().map(|c| c.user.clone()).collect();
        all.sort_by_key(|u| u.id);
        Ok(all)
    }

    async fn find_user_by_id(&self, id: Uuid) -> ApiResult<UserDetail> {
        let user = self
            .user(id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        let followers = self.edges(|f| (f.following_id == id).then_some(f.follower_id));
        let followings = self.edges(|f| (f.follower_id == id).then_some(f.following_id));
        Ok(UserDetail {
            user,
            followers,
            followings,
        })
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<User> {
        self.find_user(|u| u.username == username)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    }

    async fn find_user_by_name(&self, name: &str) -> ApiResult<User> {
        self.find_user(|u| u.name.as_deref() == Some(name))
            .ok_or_else(|| ApiError::NotFound("User not found".into()))
    }

    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.find_user(|u| u.email == email))
    }

    async fn find_credentials(&self, username: &str) -> ApiResult<Option<Credentials>> {
        Ok(self
            .users
            .iter()
            .find(|c| c.user.username == username)
            .map(|c| c.value().clone()))
    }

    async fn create_user(&self, input: &UserInput) -> ApiResult<User> {
        self.ensure_unique(input, None)?;
        let row = NewUser::from_input(input, auth::hash_password(&input.password)?);
        let user = User {
            id: row.id,
            name: row.name,
            username: row.username,
            email: row.email,
        };
        self.users.insert(
            user.id,
            Credentials {
                user: user.clone(),
                password_hash: row.password,
            },
        );
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, input: &UserInput) -> ApiResult<User> {
        self.ensure_unique(input, Some(id))?;
        let changes = UserChanges::from_input(input, auth::hash_password(&input.password)?);
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        entry.user = User {
            id,
            name: changes.name,
            username: changes.username,
            email: changes.email,
        };
        entry.password_hash = changes.password;
        Ok(entry.user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> ApiResult<()> {
        self.users.remove(&id);
        self.posts.retain(|_, p| p.row.author_id != id);
        self.follows
            .retain(|_, f| f.follower_id != id && f.following_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostService for MemoryDb {
    async fn fetch_all_posts(&self) -> ApiResult<Vec<Post>> {
        self.post_reads.fetch_add(1, Ordering::SeqCst);
        let mut all: Vec<Post> = self
            .posts
            .iter()
            .filter_map(|p| self.assemble(p.value()))
            .collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(all)
    }

    async fn find_post_by_id(&self, id: Uuid) -> ApiResult<Post> {
        self.posts
            .get(&id)
            .and_then(|p| self.assemble(p.value()))
            .ok_or_else(|| ApiError::NotFound("Post not found".into()))
    }

    async fn create_post(&self, author: &User, input: &PostInput) -> ApiResult<Post> {
        let new = NewPost::from_input(author.id, input);
        let row = PostRow {
            id: new.id,
            content: new.content,
            tags: new.tags,
            img_url: new.img_url,
            author_id: new.author_id,
            created_at: new.created_at,
            updated_at: new.updated_at,
        };
        self.posts.insert(
            row.id,
            StoredPost {
                row: row.clone(),
                comments: vec![],
                likes: vec![],
            },
        );
        Ok(Post::assemble(row, Some(author.clone()), vec![], vec![]))
    }

    async fn add_comment(
        &self,
        post_id: Uuid,
        content: &str,
        username: &str,
    ) -> ApiResult<Comment> {
        let mut post = self
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
        let now = Utc::now();
        let row = CommentRow {
            id: Uuid::now_v7(),
            post_id,
            content: content.to_string(),
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        post.comments.push(row.clone());
        Ok(row.into())
    }

    async fn add_like(&self, post_id: Uuid, username: &str) -> ApiResult<Like> {
        if username.trim().is_empty() {
            return Err(ApiError::invalid("Username required"));
        }
        // the shard write lock covers both the check and the push
        let mut post = self
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| ApiError::NotFound("Post not found".into()))?;
        if post.likes.iter().any(|l| l.username == username) {
            return Err(ApiError::Conflict("Post already liked".into()));
        }
        let now = Utc::now();
        let row = LikeRow {
            id: Uuid::now_v7(),
            post_id,
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        post.likes.push(row.clone());
        Ok(row.into())
    }
}

#[async_trait]
impl FollowService for MemoryDb {
    async fn follow_user(&self, follower: &User, following_id: Uuid) -> ApiResult<Follow> {
        reject_self_follow(follower, following_id)?;
        let followed = self
            .user(following_id)
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        let duplicate = self
            .follows
            .iter()
            .any(|f| f.follower_id == follower.id && f.following_id == following_id);
        if duplicate {
            return Err(ApiError::Conflict("Already following".into()));
        }
        let row = FollowRow::from(NewFollow::snapshot(follower.id, &followed));
        self.follows.insert(row.id, row.clone());
        Ok(row.into())
    }
}

/// `Services` over a shared `MemoryDb` and `LocalStore`.
pub fn memory_services(db: Arc<MemoryDb>, cache: Arc<LocalStore>) -> Services {
    Services::new(
        db.clone(),
        db.clone(),
        db,
        cache,
        Duration::from_millis(200),
        TokenKeys::new("test-secret", 3600),
    )
}
