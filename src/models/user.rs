use async_graphql::{InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Public profile of a user. The password hash is never selected into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, SimpleObject, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[graphql(name = "User")]
pub struct User {
    #[graphql(name = "_id")]
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
}

// the input to `register` and `updateUser`
#[derive(Debug, Clone, Default, InputObject)]
#[graphql(name = "userForm")]
pub struct UserForm {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A `UserForm` that passed field validation.
#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub password: String,
}

pub const MIN_PASSWORD_LEN: usize = 5;

impl UserForm {
    pub fn validate(self) -> ApiResult<UserInput> {
        let username =
            non_blank(self.username).ok_or_else(|| ApiError::invalid("Username required"))?;
        let email = non_blank(self.email).ok_or_else(|| ApiError::invalid("Email required"))?;
        if !is_valid_email(&email) {
            return Err(ApiError::invalid("Invalid email format"));
        }
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::invalid("Password required"))?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        Ok(UserInput {
            name: non_blank(self.name),
            username,
            email,
            password,
        })
    }
}

/// RFC 5322 address whose domain is dotted and ends in an alphabetic TLD of
/// two or more letters.
fn is_valid_email(email: &str) -> bool {
    let Ok(addr) = email.parse::<email_address::EmailAddress>() else {
        return false;
    };
    match addr.domain().rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// full replacement, so a missing name clears the column
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct UserChanges {
    pub name: Option<String>,
    pub username: String,
    pub email: String,
    pub password: String,
    pub updated_at: DateTime<Utc>,
}

impl NewUser {
    pub fn from_input(input: &UserInput, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name.clone(),
            username: input.username.clone(),
            email: input.email.clone(),
            password: password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UserChanges {
    pub fn from_input(input: &UserInput, password_hash: String) -> Self {
        Self {
            name: input.name.clone(),
            username: input.username.clone(),
            email: input.email.clone(),
            password: password_hash,
            updated_at: Utc::now(),
        }
    }
}

/// Stored credentials looked up at login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "detailResponse")]
pub struct UserDetail {
    pub user: User,
    pub followers: Vec<User>,
    pub followings: Vec<User>,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "loginResponse")]
pub struct LoginResponse {
    pub access_token: String,
    #[graphql(name = "_id")]
    pub id: Uuid,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str) -> UserForm {
        UserForm {
            name: None,
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn validate_checks_fields_in_order() {
        let err = |f: UserForm| f.validate().unwrap_err();
        let bad_email = ApiError::invalid("Invalid email format");
        assert_eq!(err(form(" ", "a@x.com", "pass1")), ApiError::invalid("Username required"));
        assert_eq!(err(form("alice", "", "pass1")), ApiError::invalid("Email required"));
        assert_eq!(err(form("alice", "not-an-email", "pass1")), bad_email);
        assert_eq!(err(form("alice", "a@x.com", "")), ApiError::invalid("Password required"));
        assert!(matches!(err(form("alice", "a@x.com", "1234")), ApiError::InvalidArgument(_)));
    }

    #[test]
    fn email_domain_needs_a_dotted_tld() {
        for bad in ["a@localhost", "a@x.c", "a@x.c0m", "a@.com", "a@@x.com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
        for good in ["a@x.com", "first.last@mail.example.org", "a+tag@x.io"] {
            assert!(is_valid_email(good), "{good}");
        }
        assert_eq!(
            form("alice", "a@localhost", "pass1").validate().unwrap_err(),
            ApiError::invalid("Invalid email format")
        );
    }

    #[test]
    fn validate_trims_identity_fields() {
        let input = UserForm {
            name: Some("  ".into()),
            ..form(" alice ", "a@x.com", "pass1")
        }
        .validate()
        .unwrap();
        assert_eq!(input.username, "alice");
        assert_eq!(input.name, None);
        assert_eq!(input.password, "pass1");
    }
}
