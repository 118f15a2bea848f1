use async_graphql::ErrorExtensions;

use crate::error::ApiError;

pub trait MapErrGql<T> {
    fn map_err_gql(self) -> async_graphql::Result<T>;
}

impl<T> MapErrGql<T> for Result<T, ApiError> {
    fn map_err_gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.extend())
    }
}

/// Parse an id argument, rejecting missing or malformed values.
pub fn parse_id(raw: Option<&str>, what: &str) -> Result<uuid::Uuid, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::invalid(format!("{what} required")))?;
    uuid::Uuid::parse_str(raw).map_err(|_| ApiError::invalid(format!("Invalid {what}")))
}

/// Trimmed value of a required text field, or `InvalidArgument`.
pub fn required<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str, ApiError> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::invalid(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_blank_and_garbage() {
        assert_eq!(
            parse_id(None, "Post id"),
            Err(ApiError::invalid("Post id required"))
        );
        assert_eq!(
            parse_id(Some("  "), "Post id"),
            Err(ApiError::invalid("Post id required"))
        );
        assert_eq!(
            parse_id(Some("nope"), "Post id"),
            Err(ApiError::invalid("Invalid Post id"))
        );
        let id = uuid::Uuid::now_v7();
        assert_eq!(parse_id(Some(&id.to_string()), "Post id"), Ok(id));
    }
}
