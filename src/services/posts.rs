use axum::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::error::{db_err, ApiError, ApiResult};
use crate::models::post::*;
use crate::models::user::User;
use crate::schema::{comments, likes, posts, users};

use super::{DbService, Pool, Svc};

#[async_trait]
pub trait PostService: Svc {
    /// Every post with its author, newest first. Unbounded.
    async fn fetch_all_posts(&self) -> ApiResult<Vec<Post>>;
    async fn find_post_by_id(&self, id: Uuid) -> ApiResult<Post>;
    async fn create_post(&self, author: &User, input: &PostInput) -> ApiResult<Post>;
    async fn add_comment(&self, post_id: Uuid, content: &str, username: &str) -> ApiResult<Comment>;
    /// Fails with `Conflict` if `username` already liked the post.
    async fn add_like(&self, post_id: Uuid, username: &str) -> ApiResult<Like>;
}

#[derive(Clone)]
pub struct PostServiceDb {
    db: Pool,
}

impl Svc for PostServiceDb {}

impl DbService for PostServiceDb {
    fn new(db: Pool) -> Self {
        Self { db }
    }
}

/// Load comments and likes for `rows` and assemble the output posts, keeping
/// the order of `rows`.
async fn with_children(
    conn: &mut AsyncPgConnection,
    rows: Vec<(PostRow, User)>,
) -> ApiResult<Vec<Post>> {
    let (post_rows, authors): (Vec<PostRow>, Vec<User>) = rows.into_iter().unzip();

    let comment_rows = CommentRow::belonging_to(&post_rows)
        .select(CommentRow::as_select())
        .order(comments::id.asc())
        .load(&mut *conn)
        .await
        .map_err(db_err("Comment"))?;
    let like_rows = LikeRow::belonging_to(&post_rows)
        .select(LikeRow::as_select())
        .order(likes::id.asc())
        .load(&mut *conn)
        .await
        .map_err(db_err("Like"))?;

    let comments = comment_rows.grouped_by(&post_rows);
    let likes = like_rows.grouped_by(&post_rows);

    Ok(post_rows
        .into_iter()
        .zip(authors)
        .zip(comments.into_iter().zip(likes))
        .map(|((row, author), (comments, likes))| {
            Post::assemble(row, Some(author), comments, likes)
        })
        .collect())
}

#[async_trait]
impl PostService for PostServiceDb {
    #[tracing::instrument(skip(self))]
    async fn fetch_all_posts(&self) -> ApiResult<Vec<Post>> {
        let mut conn = self.db.get().await?;
        let rows: Vec<(PostRow, User)> = posts::table
            .inner_join(users::table)
            .order(posts::id.desc())
            .select((PostRow::as_select(), User::as_select()))
            .load(&mut conn)
            .await
            .map_err(db_err("Post"))?;
        with_children(&mut conn, rows).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_post_by_id(&self, id: Uuid) -> ApiResult<Post> {
        let mut conn = self.db.get().await?;
        let row: (PostRow, User) = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(id))
            .select((PostRow::as_select(), User::as_select()))
            .first(&mut conn)
            .await
            .map_err(db_err("Post"))?;
        with_children(&mut conn, vec![row])
            .await?
            .pop()
            .ok_or_else(|| ApiError::NotFound("Post not found".into()))
    }

    #[tracing::instrument(skip(self, author, input), fields(author_id = %author.id))]
    async fn create_post(&self, author: &User, input: &PostInput) -> ApiResult<Post> {
        let mut conn = self.db.get().await?;
        let row = diesel::insert_into(posts::table)
            .values(&NewPost::from_input(author.id, input))
            .returning(PostRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(db_err("User"))?;

        tracing::info!(post_id = %row.id, "created post");
        Ok(Post::assemble(row, Some(author.clone()), vec![], vec![]))
    }

    #[tracing::instrument(skip(self, content))]
    async fn add_comment(
        &self,
        post_id: Uuid,
        content: &str,
        username: &str,
    ) -> ApiResult<Comment> {
        let now = Utc::now();
        let mut conn = self.db.get().await?;
        let row = diesel::insert_into(comments::table)
            .values(&NewComment {
                id: Uuid::now_v7(),
                post_id,
                content,
                username,
                created_at: now,
                updated_at: now,
            })
            .returning(CommentRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(db_err("Post"))?;
        Ok(row.into())
    }

    #[tracing::instrument(skip(self))]
    async fn add_like(&self, post_id: Uuid, username: &str) -> ApiResult<Like> {
        if username.trim().is_empty() {
            return Err(ApiError::invalid("Username required"));
        }
        let now = Utc::now();
        let mut conn = self.db.get().await?;
        // the unique (post_id, username) index makes check-and-append one statement
        let row: Option<LikeRow> = diesel::insert_into(likes::table)
            .values(&NewLike {
                id: Uuid::now_v7(),
                post_id,
                username,
                created_at: now,
                updated_at: now,
            })
            .on_conflict((likes::post_id, likes::username))
            .do_nothing()
            .returning(LikeRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(db_err("Post"))?;

        row.map(Like::from)
            .ok_or_else(|| ApiError::Conflict("Post already liked".into()))
    }
}
