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

//! SQLite backend, used by tests.
//!
//! SQLite lacks native timestamp and UUID types, so this module also provides the conversions
//! that queries need to store those values as integers and text.

use crate::db::{Db, DbError, DbResult, Executor, TxExecutor};
use async_trait::async_trait;
use log::warn;
use sqlx::Transaction;
use sqlx::error::ErrorKind;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Nanoseconds in one second.
const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Converts a sqlx error `e` raised by SQLite into a `DbError`.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        sqlx::Error::Database(e) => match e.kind() {
            ErrorKind::ForeignKeyViolation => DbError::NotFound,
            ErrorKind::UniqueViolation => DbError::AlreadyExists,
            _ => {
                let message = e.to_string();
                if message.contains("FOREIGN KEY constraint failed") {
                    DbError::NotFound
                } else if message.contains("UNIQUE constraint failed") {
                    DbError::AlreadyExists
                } else {
                    DbError::BackendError(message)
                }
            }
        },
        e => DbError::BackendError(e.to_string()),
    }
}

/// Opens a pool for the database at `conn_str`, which can be `:memory:`.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    let pool = SqlitePool::connect(conn_str).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// Executor for SQLite queries.
#[derive(Debug)]
pub enum SqliteExecutor {
    /// A pooled connection in autocommit mode.
    PoolExec(PoolConnection<Sqlite>),

    /// An open transaction.
    TxExec(Transaction<'static, Sqlite>),
}

impl SqliteExecutor {
    /// Commits the wrapped transaction.  Panics if this is not a transaction.
    pub(super) async fn commit(self) -> DbResult<()> {
        let SqliteExecutor::TxExec(tx) = self else {
            unreachable!("Only transactions can be committed");
        };
        tx.commit().await.map_err(map_sqlx_error)
    }

    /// Gets the connection to run queries on.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            SqliteExecutor::PoolExec(conn) => conn,
            SqliteExecutor::TxExec(tx) => tx,
        }
    }
}

/// Pool of connections to an SQLite database.
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Gets an autocommit executor of the concrete SQLite type.
    pub async fn typed_ex(&self) -> DbResult<SqliteExecutor> {
        self.pool.acquire().await.map(SqliteExecutor::PoolExec).map_err(map_sqlx_error)
    }
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("SQLite pool dropped without calling close()");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        self.typed_ex().await.map(Executor::Sqlite)
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(SqliteExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Applies `schema`, which can hold several semicolon-separated statements.
pub async fn run_schema(e: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    sqlx::raw_sql(schema).execute(e.conn()).await.map_err(map_sqlx_error)?;
    Ok(())
}

/// Reassembles a timestamp stored as a pair of seconds and nanoseconds since the epoch.
///
/// Both parts are signed only because SQLite has no unsigned integers.  Negative values are
/// rejected: allowing them would break comparisons of timestamps within queries.
pub fn build_timestamp(timestamp_sec: i64, timestamp_nsec: i64) -> DbResult<OffsetDateTime> {
    if timestamp_sec < 0 || timestamp_nsec < 0 {
        return Err(DbError::DataIntegrityError(format!(
            "Timestamp cannot have negative quantities: sec={}, nsec={}",
            timestamp_sec, timestamp_nsec
        )));
    }

    let nanos = i128::from(timestamp_sec) * NANOS_PER_SEC + i128::from(timestamp_nsec);
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid timestamp: {}", e)))
}

/// Same as `build_timestamp` for nullable columns, where both parts must be null together.
pub fn build_optional_timestamp(
    timestamp_sec: Option<i64>,
    timestamp_nsec: Option<i64>,
) -> DbResult<Option<OffsetDateTime>> {
    match (timestamp_sec, timestamp_nsec) {
        (None, None) => Ok(None),
        (Some(sec), Some(nsec)) => build_timestamp(sec, nsec).map(Some),
        (sec, nsec) => Err(DbError::DataIntegrityError(format!(
            "Inconsistent timestamp parts: sec={:?}, nsec={:?}",
            sec, nsec
        ))),
    }
}

/// Splits `ts` into the seconds and nanoseconds that `build_timestamp` takes back.
///
/// Panics if `ts` is before the epoch.  All timestamps come from our clocks so that never happens.
pub fn unpack_timestamp(ts: OffsetDateTime) -> (i64, i64) {
    let nanos = ts.unix_timestamp_nanos();
    assert!(nanos >= 0, "Cannot store a negative timestamp into the database");
    let sec = i64::try_from(nanos / NANOS_PER_SEC).expect("Seconds of a valid date fit in i64");
    let nsec = (nanos % NANOS_PER_SEC) as i64;
    (sec, nsec)
}

/// Same as `unpack_timestamp` for nullable columns.
pub fn unpack_optional_timestamp(ts: Option<OffsetDateTime>) -> (Option<i64>, Option<i64>) {
    match ts {
        Some(ts) => {
            let (sec, nsec) = unpack_timestamp(ts);
            (Some(sec), Some(nsec))
        }
        None => (None, None),
    }
}

/// Parses an identifier stored in its hyphenated text form.
pub fn build_uuid(raw: &str) -> DbResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid identifier '{}': {}", raw, e)))
}

/// Test utilities for the SQLite backend.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Opens a fresh in-memory database.  Panics on errors.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}
