use async_graphql::{Context, Object, Result};

use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::helpers::{parse_id, required, MapErrGql};
use crate::models::user::{LoginResponse, User, UserDetail, UserForm};

use super::{services, viewer};

#[derive(Default)]
pub struct UserQuery;

#[Object]
impl UserQuery {
    /// Every registered user.
    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        list_users(ctx).await.map_err_gql()
    }

    /// The caller's own profile.
    async fn login_user(&self, ctx: &Context<'_>) -> Result<User> {
        viewer(ctx).await.map(|v| v.user).map_err_gql()
    }

    /// The caller with their followers and followings.
    async fn users_by_id(&self, ctx: &Context<'_>) -> Result<UserDetail> {
        viewer(ctx).await.map_err_gql()
    }

    async fn users_by_username(&self, ctx: &Context<'_>, username: String) -> Result<User> {
        user_by_username(ctx, &username).await.map_err_gql()
    }

    async fn users_by_name(&self, ctx: &Context<'_>, name: String) -> Result<User> {
        user_by_name(ctx, &name).await.map_err_gql()
    }
}

#[derive(Default)]
pub struct UserMutation;

#[Object]
impl UserMutation {
    async fn register(&self, ctx: &Context<'_>, form: Option<UserForm>) -> Result<User> {
        register(ctx, form).await.map_err_gql()
    }

    async fn login(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
    ) -> Result<LoginResponse> {
        login(ctx, &username, &password).await.map_err_gql()
    }

    async fn update_user(
        &self,
        ctx: &Context<'_>,
        id: String,
        form: Option<UserForm>,
    ) -> Result<User> {
        update_user(ctx, &id, form).await.map_err_gql()
    }

    async fn delete_user(&self, ctx: &Context<'_>, id: String) -> Result<String> {
        delete_user(ctx, &id).await.map_err_gql()
    }
}

#[tracing::instrument(skip_all)]
async fn list_users(ctx: &Context<'_>) -> ApiResult<Vec<User>> {
    viewer(ctx).await?;
    services(ctx)?.users.find_all_users().await
}

#[tracing::instrument(skip(ctx))]
async fn user_by_username(ctx: &Context<'_>, username: &str) -> ApiResult<User> {
    viewer(ctx).await?;
    let username = required(Some(username), "Username required")?;
    services(ctx)?.users.find_user_by_username(username).await
}

#[tracing::instrument(skip(ctx))]
async fn user_by_name(ctx: &Context<'_>, name: &str) -> ApiResult<User> {
    viewer(ctx).await?;
    let name = required(Some(name), "Name required")?;
    services(ctx)?.users.find_user_by_name(name).await
}

#[tracing::instrument(skip_all)]
async fn register(ctx: &Context<'_>, form: Option<UserForm>) -> ApiResult<User> {
    let input = form.unwrap_or_default().validate()?;
    let svc = services(ctx)?;
    if svc.users.find_user_by_email(&input.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".into()));
    }
    svc.users.create_user(&input).await
}

#[tracing::instrument(skip(ctx, password))]
async fn login(ctx: &Context<'_>, username: &str, password: &str) -> ApiResult<LoginResponse> {
    let invalid = || ApiError::invalid("Invalid username/password");
    let username = required(Some(username), "Invalid username/password")?;
    if password.is_empty() {
        return Err(invalid());
    }

    let svc = services(ctx)?;
    let creds = svc
        .users
        .find_credentials(username)
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(password, &creds.password_hash) {
        tracing::info!("login rejected");
        return Err(invalid());
    }

    Ok(LoginResponse {
        access_token: svc.tokens.sign(creds.user.id)?,
        id: creds.user.id,
        username: creds.user.username,
    })
}

#[tracing::instrument(skip(ctx, form))]
async fn update_user(ctx: &Context<'_>, id: &str, form: Option<UserForm>) -> ApiResult<User> {
    viewer(ctx).await?;
    let id = parse_id(Some(id), "User id")?;
    let input = form.unwrap_or_default().validate()?;
    let svc = services(ctx)?;
    let user = svc.users.update_user(id, &input).await?;
    // cached posts embed the author profile
    svc.feed.invalidate_all_posts().await;
    Ok(user)
}

#[tracing::instrument(skip(ctx))]
async fn delete_user(ctx: &Context<'_>, id: &str) -> ApiResult<String> {
    viewer(ctx).await?;
    let id = parse_id(Some(id), "User id")?;
    let svc = services(ctx)?;
    svc.users.delete_user(id).await?;
    // the user's posts go with them
    svc.feed.invalidate_all_posts().await;
    Ok("User successfully Deleted".to_string())
}
