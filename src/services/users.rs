use axum::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::auth;
use crate::error::{db_err, ApiError, ApiResult};
use crate::models::user::*;
use crate::schema::{follows, users};

use super::{DbService, Pool, Svc};

#[async_trait]
pub trait UserService: Svc {
    async fn find_all_users(&self) -> ApiResult<Vec<User>>;
    /// The user plus everyone following them and everyone they follow.
    async fn find_user_by_id(&self, id: Uuid) -> ApiResult<UserDetail>;
    async fn find_user_by_username(&self, username: &str) -> ApiResult<User>;
    async fn find_user_by_name(&self, name: &str) -> ApiResult<User>;
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;
    async fn find_credentials(&self, username: &str) -> ApiResult<Option<Credentials>>;
    /// Hashes the password before storing; the result never carries it.
    async fn create_user(&self, input: &UserInput) -> ApiResult<User>;
    async fn update_user(&self, id: Uuid, input: &UserInput) -> ApiResult<User>;
    async fn delete_user(&self, id: Uuid) -> ApiResult<()>;
}

#[derive(Clone)]
pub struct UserServiceDb {
    db: Pool,
}

impl Svc for UserServiceDb {}

impl DbService for UserServiceDb {
    fn new(db: Pool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserService for UserServiceDb {
    #[tracing::instrument(skip(self))]
    async fn find_all_users(&self) -> ApiResult<Vec<User>> {
        let mut conn = self.db.get().await?;
        users::table
            .order(users::id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(db_err("User"))
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_by_id(&self, id: Uuid) -> ApiResult<UserDetail> {
        let mut conn = self.db.get().await?;

        let user = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .map_err(db_err("User"))?;

        let followers = follows::table
            .inner_join(users::table.on(users::id.eq(follows::follower_id)))
            .filter(follows::following_id.eq(id))
            .order(follows::id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(db_err("User"))?;

        let followings = follows::table
            .inner_join(users::table.on(users::id.eq(follows::following_id)))
            .filter(follows::follower_id.eq(id))
            .order(follows::id.asc())
            .select(User::as_select())
            .load(&mut conn)
            .await
            .map_err(db_err("User"))?;

        Ok(UserDetail {
            user,
            followers,
            followings,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_by_username(&self, username: &str) -> ApiResult<User> {
        let mut conn = self.db.get().await?;
        users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .map_err(db_err("User"))
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_by_name(&self, name: &str) -> ApiResult<User> {
        let mut conn = self.db.get().await?;
        users::table
            .filter(users::name.eq(name))
            .order(users::id.asc())
            .select(User::as_select())
            .first(&mut conn)
            .await
            .map_err(db_err("User"))
    }

    #[tracing::instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let mut conn = self.db.get().await?;
        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err("User"))
    }

    #[tracing::instrument(skip(self))]
    async fn find_credentials(&self, username: &str) -> ApiResult<Option<Credentials>> {
        let mut conn = self.db.get().await?;
        let row: Option<(User, String)> = users::table
            .filter(users::username.eq(username))
            .select((User::as_select(), users::password))
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err("User"))?;
        Ok(row.map(|(user, password_hash)| Credentials {
            user,
            password_hash,
        }))
    }

    #[tracing::instrument(skip_all, fields(username = %input.username))]
    async fn create_user(&self, input: &UserInput) -> ApiResult<User> {
        let row = NewUser::from_input(input, auth::hash_password(&input.password)?);

        let mut conn = self.db.get().await?;
        let user = diesel::insert_into(users::table)
            .values(&row)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(unique_conflict)?;

        tracing::info!(user_id = %user.id, "registered user");
        Ok(user)
    }

    #[tracing::instrument(skip(self, input))]
    async fn update_user(&self, id: Uuid, input: &UserInput) -> ApiResult<User> {
        let changes = UserChanges::from_input(input, auth::hash_password(&input.password)?);

        let mut conn = self.db.get().await?;
        diesel::update(users::table.find(id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(unique_conflict)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_user(&self, id: Uuid) -> ApiResult<()> {
        let mut conn = self.db.get().await?;
        let deleted = diesel::delete(users::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(db_err("User"))?;
        tracing::info!(deleted, "deleted user");
        Ok(())
    }
}

fn unique_conflict(err: diesel::result::Error) -> ApiError {
    match ApiError::from_db("User", err) {
        ApiError::Conflict(_) => ApiError::Conflict("Username or email already exists".into()),
        other => other,
    }
}
