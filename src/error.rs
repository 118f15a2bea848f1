use async_graphql::ErrorExtensions;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced to API callers. Every variant maps to a stable
/// `extensions.code` in the GraphQL response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Operation timed out")]
    Timeout,
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_token() -> Self {
        Self::Unauthorized("Invalid Token".into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Timeout => "TIMEOUT",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Map a diesel error, naming the entity for `NotFound`.
    pub fn from_db(entity: &str, err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound(format!("{entity} not found")),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::Conflict(info.message().to_string())
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                Self::NotFound(format!("{entity} not found"))
            }
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                Self::Unavailable(info.message().to_string())
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

/// `map_err` adapter for diesel results on `entity`.
pub fn db_err(entity: &'static str) -> impl FnOnce(DieselError) -> ApiError {
    move |e| ApiError::from_db(entity, e)
}

impl From<PoolError> for ApiError {
    fn from(err: PoolError) -> Self {
        tracing::error!(error = %err, "database pool error");
        Self::Unavailable(err.to_string())
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        let code = self.code();
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| e.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_error_carries_code() {
        let err = ApiError::Conflict("Post already liked".into()).extend();
        assert_eq!(err.message, "Post already liked");
        let ext = err.extensions.expect("extensions set");
        assert_eq!(
            ext.get("code"),
            Some(&async_graphql::Value::from("CONFLICT"))
        );
    }

    #[test]
    fn diesel_not_found_names_entity() {
        let err = ApiError::from_db("Post", DieselError::NotFound);
        assert_eq!(err, ApiError::NotFound("Post not found".into()));
        assert_eq!(err.code(), "NOT_FOUND");
    }
}
