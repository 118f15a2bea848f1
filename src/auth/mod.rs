//! Bearer-token authentication.
//!
//! Every authenticated resolver calls [`authenticate`] with the raw
//! `Authorization` header. Nothing is cached between operations, so a deleted
//! user is rejected on the next request even while their token is unexpired.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::TokenKeys;

use crate::error::{ApiError, ApiResult};
use crate::models::user::UserDetail;
use crate::services::users::UserService;

/// Token part of a `Bearer <token>` header value.
pub fn parse_bearer(header: Option<&str>) -> ApiResult<&str> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(ApiError::invalid_token)?;
    let (scheme, token) = header.split_once(' ').ok_or_else(ApiError::invalid_token)?;
    let token = token.trim();
    if scheme != "Bearer" || token.is_empty() || token.contains(char::is_whitespace) {
        return Err(ApiError::invalid_token());
    }
    Ok(token)
}

/// Resolve the caller behind a bearer header to their user record, including
/// followers and followings.
#[tracing::instrument(skip_all)]
pub async fn authenticate(
    header: Option<&str>,
    tokens: &TokenKeys,
    users: &dyn UserService,
) -> ApiResult<UserDetail> {
    let token = parse_bearer(header)?;
    let user_id = tokens.verify(token)?;
    users.find_user_by_id(user_id).await
}
