use async_graphql::{Context, Object, Result};

use crate::error::ApiResult;
use crate::helpers::{parse_id, required, MapErrGql};
use crate::models::post::{Comment, Like, Post, PostForm};

use super::{services, viewer};

#[derive(Default)]
pub struct PostQuery;

#[Object]
impl PostQuery {
    /// All posts with their authors, newest first. Served from the feed cache
    /// when warm.
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        list_posts(ctx).await.map_err_gql()
    }

    async fn post_by_id(&self, ctx: &Context<'_>, id: String) -> Result<Post> {
        post_by_id(ctx, &id).await.map_err_gql()
    }
}

#[derive(Default)]
pub struct PostMutation;

#[Object]
impl PostMutation {
    async fn add_post(&self, ctx: &Context<'_>, form: Option<PostForm>) -> Result<Post> {
        add_post(ctx, form).await.map_err_gql()
    }

    async fn comment_post(
        &self,
        ctx: &Context<'_>,
        content: Option<String>,
        post_id: Option<String>,
    ) -> Result<Comment> {
        comment_post(ctx, content.as_deref(), post_id.as_deref())
            .await
            .map_err_gql()
    }

    async fn like_post(&self, ctx: &Context<'_>, post_id: String) -> Result<Like> {
        like_post(ctx, &post_id).await.map_err_gql()
    }
}

#[tracing::instrument(skip_all)]
async fn list_posts(ctx: &Context<'_>) -> ApiResult<Vec<Post>> {
    viewer(ctx).await?;
    services(ctx)?.feed.get_all_posts_cached().await
}

#[tracing::instrument(skip(ctx))]
async fn post_by_id(ctx: &Context<'_>, id: &str) -> ApiResult<Post> {
    viewer(ctx).await?;
    let id = parse_id(Some(id), "Post id")?;
    services(ctx)?.posts.find_post_by_id(id).await
}

#[tracing::instrument(skip_all)]
async fn add_post(ctx: &Context<'_>, form: Option<PostForm>) -> ApiResult<Post> {
    let me = viewer(ctx).await?;
    let input = form.unwrap_or_default().validate()?;
    let svc = services(ctx)?;
    let post = svc.posts.create_post(&me.user, &input).await?;
    svc.feed.invalidate_all_posts().await;
    Ok(post)
}

#[tracing::instrument(skip(ctx, content))]
async fn comment_post(
    ctx: &Context<'_>,
    content: Option<&str>,
    post_id: Option<&str>,
) -> ApiResult<Comment> {
    let me = viewer(ctx).await?;
    let content = required(content, "Content required")?;
    let post_id = parse_id(post_id, "Post id")?;
    let svc = services(ctx)?;
    let comment = svc
        .posts
        .add_comment(post_id, content, &me.user.username)
        .await?;
    svc.feed.invalidate_all_posts().await;
    Ok(comment)
}

#[tracing::instrument(skip(ctx))]
async fn like_post(ctx: &Context<'_>, post_id: &str) -> ApiResult<Like> {
    let me = viewer(ctx).await?;
    let post_id = parse_id(Some(post_id), "Post id")?;
    let svc = services(ctx)?;
    let like = svc.posts.add_like(post_id, &me.user.username).await?;
    svc.feed.invalidate_all_posts().await;
    Ok(like)
}
