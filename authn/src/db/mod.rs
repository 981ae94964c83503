// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Persistence of users and sessions.
//!
//! PostgreSQL stores timestamps natively.  SQLite splits each timestamp into a seconds and a
//! nanoseconds column, both null or both set.

use crate::model::{AccessToken, HashedPassword, Session, User, UserId, UserName};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::{PgRow, Postgres};
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::{Sqlite, SqliteRow};
use time::OffsetDateTime;
#[cfg(feature = "postgres")]
use vidly_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use vidly_core::db::sqlite::{
    self, build_optional_timestamp, build_timestamp, build_uuid, unpack_optional_timestamp,
    unpack_timestamp,
};
use vidly_core::db::{DbError, DbResult, Executor, expect_one_row};
use vidly_core::model::EmailAddress;


/// Creates the tables for users and sessions if they do not exist yet.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Reads the `column` of a PostgreSQL `row`.
#[cfg(feature = "postgres")]
fn pg_get<'r, T>(row: &'r PgRow, column: &str) -> DbResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column).map_err(postgres::map_sqlx_error)
}

/// Reads the `column` of an SQLite `row`.
#[cfg(any(feature = "sqlite", test))]
fn sqlite_get<'r, T>(row: &'r SqliteRow, column: &str) -> DbResult<T>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column).map_err(sqlite::map_sqlx_error)
}

/// Assembles a user from the values stored in its row.
fn build_user(
    id: UserId,
    name: String,
    email: String,
    password: String,
    is_admin: bool,
    last_login: Option<OffsetDateTime>,
) -> DbResult<User> {
    let name = UserName::new(name)?;
    let email = EmailAddress::new(email)?;
    let user = User::new(id, name, email, HashedPassword::new(password)).with_admin(is_admin);
    Ok(match last_login {
        Some(last_login) => user.with_last_login(last_login),
        None => user,
    })
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for User {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        build_user(
            UserId::from(pg_get::<uuid::Uuid>(&row, "id")?),
            pg_get(&row, "name")?,
            pg_get(&row, "email")?,
            pg_get(&row, "password")?,
            pg_get(&row, "is_admin")?,
            pg_get(&row, "last_login")?,
        )
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = sqlite_get(&row, "id")?;
        let last_login = build_optional_timestamp(
            sqlite_get(&row, "last_login_secs")?,
            sqlite_get(&row, "last_login_nsecs")?,
        )?;
        build_user(
            UserId::from(build_uuid(&id)?),
            sqlite_get(&row, "name")?,
            sqlite_get(&row, "email")?,
            sqlite_get(&row, "password")?,
            sqlite_get(&row, "is_admin")?,
            last_login,
        )
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Session {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let access_token = AccessToken::new(pg_get::<String>(&row, "access_token")?)?;
        let user_id = UserId::from(pg_get::<uuid::Uuid>(&row, "user_id")?);
        Ok(Session::new(access_token, user_id, pg_get(&row, "login_time")?))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Session {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let access_token = AccessToken::new(sqlite_get::<String>(&row, "access_token")?)?;
        let user_id = UserId::from(build_uuid(&sqlite_get::<String>(&row, "user_id")?)?);
        let login_time = build_timestamp(
            sqlite_get(&row, "login_time_secs")?,
            sqlite_get(&row, "login_time_nsecs")?,
        )?;
        Ok(Session::new(access_token, user_id, login_time))
    }
}

/// Stores a new `user`.
///
/// Fails with `AlreadyExists` if the identifier or the email address are taken.
pub async fn create_user(ex: &mut Executor, user: &User) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO users (id, name, email, password, is_admin, last_login)
                VALUES ($1, $2, $3, $4, $5, $6)";
            sqlx::query(query_str)
                .bind(user.id().as_uuid())
                .bind(user.name().as_str())
                .bind(user.email().as_str())
                .bind(user.password().as_str())
                .bind(user.is_admin())
                .bind(user.last_login())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (last_login_secs, last_login_nsecs) = unpack_optional_timestamp(user.last_login());
            let query_str = "
                INSERT INTO users
                    (id, name, email, password, is_admin, last_login_secs, last_login_nsecs)
                VALUES (?, ?, ?, ?, ?, ?, ?)";
            sqlx::query(query_str)
                .bind(user.id().to_string())
                .bind(user.name().as_str())
                .bind(user.email().as_str())
                .bind(user.password().as_str())
                .bind(user.is_admin())
                .bind(last_login_secs)
                .bind(last_login_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Loads the user whose address is `email`.
pub async fn get_user_by_email(ex: &mut Executor, email: &EmailAddress) -> DbResult<User> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, name, email, password, is_admin, last_login
                FROM users WHERE email = $1";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, name, email, password, is_admin, last_login_secs, last_login_nsecs
                FROM users WHERE email = ?";
            let row = sqlx::query(query_str)
                .bind(email.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Loads the user identified by `id`.
pub async fn get_user_by_id(ex: &mut Executor, id: UserId) -> DbResult<User> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, name, email, password, is_admin, last_login
                FROM users WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            User::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, name, email, password, is_admin, last_login_secs, last_login_nsecs
                FROM users WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Records that user `id` logged in at `last_login`.
pub async fn update_user_last_login(
    ex: &mut Executor,
    id: UserId,
    last_login: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
                .bind(last_login)
                .bind(id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (last_login_secs, last_login_nsecs) = unpack_timestamp(last_login);
            sqlx::query("UPDATE users SET last_login_secs = ?, last_login_nsecs = ? WHERE id = ?")
                .bind(last_login_secs)
                .bind(last_login_nsecs)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Loads the open session identified by `access_token`.  Logged-out sessions are `NotFound`.
pub async fn get_session(ex: &mut Executor, access_token: &AccessToken) -> DbResult<Session> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT access_token, user_id, login_time
                FROM sessions
                WHERE access_token = $1 AND logout_time IS NULL";
            let row = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Session::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT access_token, user_id, login_time_secs, login_time_nsecs
                FROM sessions
                WHERE access_token = ? AND logout_time_secs IS NULL";
            let row = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Session::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Stores a new `session`.  Fails with `NotFound` if its user does not exist.
pub async fn put_session(ex: &mut Executor, session: &Session) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO sessions (access_token, user_id, login_time) VALUES ($1, $2, $3)";
            sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.user_id().as_uuid())
                .bind(session.login_time())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (login_time_secs, login_time_nsecs) = unpack_timestamp(session.login_time());
            let query_str = "
                INSERT INTO sessions (access_token, user_id, login_time_secs, login_time_nsecs)
                VALUES (?, ?, ?, ?)";
            sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.user_id().to_string())
                .bind(login_time_secs)
                .bind(login_time_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Closes the session identified by `access_token` at time `now`.
///
/// Closed sessions are kept for auditing.  Fails with `NotFound` if the session does not exist
/// or is already closed.
pub async fn delete_session(
    ex: &mut Executor,
    access_token: &AccessToken,
    now: OffsetDateTime,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE sessions SET logout_time = $1
                WHERE access_token = $2 AND logout_time IS NULL";
            sqlx::query(query_str)
                .bind(now)
                .bind(access_token.as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?
                .rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (now_secs, now_nsecs) = unpack_timestamp(now);
            let query_str = "
                UPDATE sessions SET logout_time_secs = ?, logout_time_nsecs = ?
                WHERE access_token = ? AND logout_time_secs IS NULL";
            sqlx::query(query_str)
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(access_token.as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?
                .rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}
