use async_graphql::{InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

use super::user::User;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostRow {
    pub id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    pub img_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPost {
    pub id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    pub img_url: Option<String>,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(PostRow, foreign_key = post_id))]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewComment<'a> {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: &'a str,
    pub username: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(PostRow, foreign_key = post_id))]
#[diesel(table_name = crate::schema::likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LikeRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::likes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewLike<'a> {
    pub id: Uuid,
    pub post_id: Uuid,
    pub username: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment on a post. `username` is a snapshot taken when the comment was
/// written and is not updated if the author renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(name = "Comments")]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub content: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Like on a post, keyed by the liker's username snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(name = "Likes")]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject)]
#[graphql(name = "Post")]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[graphql(name = "_id")]
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub content: String,
    pub tags: Vec<String>,
    pub img_url: Option<String>,
    pub author_id: Uuid,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
    pub author: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            content: row.content,
            username: row.username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<LikeRow> for Like {
    fn from(row: LikeRow) -> Self {
        Self {
            username: row.username,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Post {
    pub fn assemble(
        row: PostRow,
        author: Option<User>,
        comments: Vec<CommentRow>,
        likes: Vec<LikeRow>,
    ) -> Self {
        Self {
            id: row.id,
            content: row.content,
            tags: row.tags,
            img_url: row.img_url,
            author_id: row.author_id,
            comments: comments.into_iter().map(Comment::from).collect(),
            likes: likes.into_iter().map(Like::from).collect(),
            author,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, InputObject)]
#[graphql(name = "postForm")]
pub struct PostForm {
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub img_url: Option<String>,
}

/// A `PostForm` that passed field validation.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub content: String,
    pub tags: Vec<String>,
    pub img_url: Option<String>,
}

impl PostForm {
    pub fn validate(self) -> ApiResult<PostInput> {
        let content = self
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ApiError::invalid("Content required"))?;
        Ok(PostInput {
            content,
            tags: self.tags.unwrap_or_default(),
            img_url: self.img_url.filter(|u| !u.trim().is_empty()),
        })
    }
}

impl NewPost {
    pub fn from_input(author_id: Uuid, input: &PostInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            content: input.content.clone(),
            tags: input.tags.clone(),
            img_url: input.img_url.clone(),
            author_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_form_requires_content() {
        let err = PostForm {
            content: Some("   ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, ApiError::invalid("Content required"));
    }

    #[test]
    fn post_form_defaults_tags_and_drops_blank_image() {
        let input = PostForm {
            content: Some("hello".into()),
            tags: None,
            img_url: Some("".into()),
        }
        .validate()
        .unwrap();
        assert!(input.tags.is_empty());
        assert_eq!(input.img_url, None);
    }
}
