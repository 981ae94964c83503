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

//! Business logic for the rental service.

use std::sync::Arc;
use vidly_authn::driver::AuthnDriver;
use vidly_authn::model::{AccessToken, User};
use vidly_core::clocks::Clock;
use vidly_core::db::{Db, DbError, TxExecutor};
use vidly_core::driver::{DriverError, DriverResult};

mod customers;
mod genres;
mod movies;
mod rentals;
mod returns;
#[cfg(test)]
pub(crate) mod testutils;

pub(crate) use customers::CustomerDetails;
pub(crate) use movies::MovieDetails;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock from which to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// The driver used to validate the sessions of the callers.
    authn: AuthnDriver,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        authn: AuthnDriver,
    ) -> Self {
        Self { db, clock, authn }
    }

    /// Gets a copy of the driver that handles users and sessions.
    pub(crate) fn authn(&self) -> AuthnDriver {
        self.authn.clone()
    }

    /// Gets the authentication realm to report to unauthenticated callers.
    pub(crate) fn realm(&self) -> &'static str {
        self.authn.realm()
    }

    /// Validates the session in `token` as part of `tx` and returns its owner.
    async fn authenticate(
        &self,
        tx: &mut TxExecutor,
        token: AccessToken,
    ) -> DriverResult<Arc<User>> {
        self.authn.get_session(tx, self.clock.now_utc(), token).await
    }

    /// Like `authenticate` but also requires the owner of the session to be an administrator.
    async fn authenticate_admin(
        &self,
        tx: &mut TxExecutor,
        token: AccessToken,
    ) -> DriverResult<Arc<User>> {
        let user = self.authenticate(tx, token).await?;
        if !user.is_admin() {
            return Err(DriverError::Unauthorized(
                "Only administrators can perform this operation".to_owned(),
            ));
        }
        Ok(user)
    }
}

/// Converts the `NotFound` condition of a lookup by identifier of a `what` entity into a message
/// that is suitable for the caller.  Other errors are passed through.
fn map_not_found(e: DbError, what: &str) -> DriverError {
    match e {
        DbError::NotFound => {
            DriverError::NotFound(format!("The {} with the given ID was not found.", what))
        }
        e => e.into(),
    }
}

/// Converts the `NotFound` condition of a lookup of an entity referenced by a request into an
/// input error with `message`.  Other errors are passed through.
fn map_invalid_reference(e: DbError, message: &str) -> DriverError {
    match e {
        DbError::NotFound => DriverError::InvalidInput(message.to_owned()),
        e => e.into(),
    }
}
