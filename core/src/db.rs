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

//! Database access shared by all services.
//!
//! Production deployments run against PostgreSQL.  SQLite exists so that unit tests can spin up
//! throwaway in-memory databases, and every query in the services is written for both.

use crate::model::ModelError;
use async_trait::async_trait;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Errors raised by the persistence layer.
///
/// Conditions the callers can act upon get their own variant.  Everything else from the backend
/// is reported as `BackendError`.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// An insertion clashed with an existing unique key.
    #[error("Already exists")]
    AlreadyExists,

    /// The backend failed in a way we did not anticipate.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Data read from the database does not satisfy the invariants of our types.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// The targeted row does not exist or was not in the required state.
    #[error("Entity not found")]
    NotFound,

    /// No connection could be obtained, possibly because the pool is exhausted.
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// Checks that a statement meant to touch a single row did so.  Zero rows means `NotFound`.
pub fn expect_one_row(rows_affected: u64) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        n => Err(DbError::BackendError(format!("Statement affected {} rows instead of 1", n))),
    }
}

/// Handle to issue queries against any of the supported databases.
///
/// sqlx needs to know the concrete database type to bind parameters and decode rows, so query
/// functions match on this enum and write one query per backend.  The wrapped executor may be a
/// plain pooled connection or an open transaction.
pub enum Executor {
    /// Handle for PostgreSQL.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// Handle for SQLite.
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite::SqliteExecutor),
}

/// An `Executor` known to be backed by an open transaction.
///
/// Dropping this without calling `commit` rolls back all changes made through it.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Gets the executor to pass to query functions.  Short name because it is used everywhere.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Makes all changes done within the transaction durable.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => ex.commit().await,

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => ex.commit().await,
        }
    }
}

/// A connection pool to one of the supported databases.
#[async_trait]
pub trait Db {
    /// Gets an executor outside of any explicit transaction.  Each statement commits on its own.
    async fn ex(&self) -> DbResult<Executor>;

    /// Starts a new transaction.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Shuts down the pool.  Must be called exactly once, when the service terminates.
    async fn close(&self);
}

/// Macros to run the same test suite against every database backend.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    pub use paste::paste;

    /// Defines the `name` test, which calls `module::name` with the value of `setup`.
    ///
    /// Any attribute given in `extra`, like `#[ignore]`, is attached to the generated test.
    #[macro_export]
    macro_rules! generate_one_test [
        ( $name:ident, $setup:expr, $module:path $(, #[$extra:meta] )? ) => {
            $(#[$extra])?
            #[tokio::test]
            async fn $name() {
                $crate::db::testutils::paste! {
                    $module :: [< $name >]($setup).await;
                }
            }
        }
    ];

    pub use generate_one_test;

    /// Defines one test for every `name` in `module`, feeding each of them the value of `setup`.
    ///
    /// `setup` is evaluated once per test and is where the backend under test gets chosen.
    #[macro_export]
    macro_rules! generate_tests [
        ( #[$extra:meta], $setup:expr, $module:path $(, $name:ident)+ ) => {
            $( $crate::db::testutils::generate_one_test!($name, $setup, $module, #[$extra]); )+
        };

        ( $setup:expr, $module:path $(, $name:ident)+ ) => {
            $( $crate::db::testutils::generate_one_test!($name, $setup, $module); )+
        };
    ];

    pub use generate_tests;
}


#[cfg(all(test, any(feature = "postgres", feature = "sqlite")))]
mod tests {
    use super::*;
    use sqlx::Row;
    use std::sync::Arc;

    /// Runs `sql`, which must be portable across backends, ignoring its results.
    async fn run(ex: &mut Executor, sql: &str) {
        match ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                sqlx::query(sql).execute(ex.conn()).await.unwrap();
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                sqlx::query(sql).execute(ex.conn()).await.unwrap();
            }
        }
    }

    /// Sums the values stored in the `ledger` table.
    async fn ledger_total(db: &dyn Db) -> i64 {
        let sql = "SELECT CAST(COALESCE(SUM(amount), 0) AS BIGINT) AS total FROM ledger";
        match &mut db.ex().await.unwrap() {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                let row = sqlx::query(sql).fetch_one(ex.conn()).await.unwrap();
                row.try_get::<i64, _>("total").unwrap()
            }

            #[cfg(feature = "sqlite")]
            Executor::Sqlite(ex) => {
                let row = sqlx::query(sql).fetch_one(ex.conn()).await.unwrap();
                row.try_get::<i64, _>("total").unwrap()
            }
        }
    }

    /// Creates the `ledger` table used by these tests.
    async fn create_ledger(db: &dyn Db) {
        run(&mut db.ex().await.unwrap(), "CREATE TABLE ledger (amount BIGINT NOT NULL)").await;
    }

    pub(super) async fn test_autocommit(db: Arc<dyn Db + Send + Sync>) {
        create_ledger(db.as_ref()).await;
        run(&mut db.ex().await.unwrap(), "INSERT INTO ledger (amount) VALUES (7)").await;
        run(&mut db.ex().await.unwrap(), "INSERT INTO ledger (amount) VALUES (5)").await;
        assert_eq!(12, ledger_total(db.as_ref()).await);
        db.close().await;
    }

    pub(super) async fn test_tx_commit(db: Arc<dyn Db + Send + Sync>) {
        create_ledger(db.as_ref()).await;

        let mut tx = db.begin().await.unwrap();
        run(tx.ex(), "INSERT INTO ledger (amount) VALUES (10)").await;
        run(tx.ex(), "INSERT INTO ledger (amount) VALUES (-4)").await;
        tx.commit().await.unwrap();

        assert_eq!(6, ledger_total(db.as_ref()).await);
        db.close().await;
    }

    pub(super) async fn test_tx_rollback_on_drop(db: Arc<dyn Db + Send + Sync>) {
        create_ledger(db.as_ref()).await;
        run(&mut db.ex().await.unwrap(), "INSERT INTO ledger (amount) VALUES (1)").await;

        let mut tx = db.begin().await.unwrap();
        run(tx.ex(), "INSERT INTO ledger (amount) VALUES (100)").await;
        drop(tx);

        assert_eq!(1, ledger_total(db.as_ref()).await);
        db.close().await;
    }

    pub(super) async fn test_concurrent_read_txs(db: Arc<dyn Db + Send + Sync>) {
        let first = db.begin().await.unwrap();
        let second = db.begin().await.unwrap();
        second.commit().await.unwrap();
        first.commit().await.unwrap();
        db.close().await;
    }

    /// Instantiates the tests that keep several transactions open at once.  These never write.
    macro_rules! generate_db_ro_concurrent_tests [
        ( $setup:expr $(, #[$extra:meta])? ) => {
            $crate::db::testutils::generate_tests!(
                $( #[$extra], )?
                $setup,
                $crate::db::tests,
                test_concurrent_read_txs
            );
        }
    ];

    pub(super) use generate_db_ro_concurrent_tests;

    /// Instantiates the tests that modify the database.
    macro_rules! generate_db_rw_tests [
        ( $setup:expr $(, #[$extra:meta])? ) => {
            $crate::db::testutils::generate_tests!(
                $( #[$extra], )?
                $setup,
                $crate::db::tests,
                test_autocommit,
                test_tx_commit,
                test_tx_rollback_on_drop
            );
        }
    ];

    pub(super) use generate_db_rw_tests;
}
