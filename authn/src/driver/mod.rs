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

//! Business logic for user accounts and sessions.

use crate::db;
use crate::model::{AccessToken, User};
use derivative::Derivative;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use vidly_core::clocks::Clock;
use vidly_core::db::{Db, DbError, TxExecutor};
use vidly_core::driver::{DriverError, DriverResult};
use vidly_core::env::get_optional_var;

mod cache;
mod login;
mod logout;
mod signup;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;
mod whoami;

use cache::SessionsCache;

/// Error message for tokens that do not map to a live session.
const INVALID_SESSION: &str = "Invalid session";

/// Settings of the authentication driver.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct AuthnOptions {
    /// Maximum number of session validations to keep in memory.
    pub sessions_cache_capacity: usize,

    /// How long a session validation stays in memory.  Zero disables caching.
    pub sessions_cache_ttl: Duration,

    /// How long a session lasts after login.
    pub session_max_age: Duration,

    /// How far in the future a login time can be before the session is rejected.  Only relevant
    /// when requests are served by machines whose clocks drift apart.
    pub session_max_skew: Duration,
}

impl Default for AuthnOptions {
    fn default() -> Self {
        Self {
            sessions_cache_capacity: 10 * 1024,
            sessions_cache_ttl: Duration::from_secs(60),
            session_max_age: Duration::from_secs(24 * 60 * 60),
            session_max_skew: Duration::from_secs(60 * 60),
        }
    }
}

impl AuthnOptions {
    /// Reads the options from the environment variables called `<prefix>_<setting>`.  All are
    /// optional and fall back to the defaults.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            sessions_cache_capacity: get_optional_var::<usize>(prefix, "SESSIONS_CACHE_CAPACITY")?
                .unwrap_or(defaults.sessions_cache_capacity),
            sessions_cache_ttl: get_optional_var::<Duration>(prefix, "SESSIONS_CACHE_TTL")?
                .unwrap_or(defaults.sessions_cache_ttl),
            session_max_age: get_optional_var::<Duration>(prefix, "SESSION_MAX_AGE")?
                .unwrap_or(defaults.session_max_age),
            session_max_skew: get_optional_var::<Duration>(prefix, "SESSION_MAX_SKEW")?
                .unwrap_or(defaults.session_max_skew),
        })
    }
}

/// Business logic for user accounts and sessions.
///
/// Public operations run in their own transaction and consume the driver.  `get_session` is the
/// exception: it joins a transaction of the caller so that other services can authenticate a
/// request within the transaction that serves it.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct AuthnDriver {
    /// Persistence of users and sessions.
    db: Arc<dyn Db + Send + Sync>,

    /// Source of the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Realm to report in authentication challenges.
    realm: &'static str,

    /// Settings.
    opts: AuthnOptions,

    /// Recent session validations, shared by all clones.
    sessions_cache: Arc<SessionsCache>,
}

impl AuthnDriver {
    /// Creates a driver that stores its data in `db` and reports `realm` in challenges.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        realm: &'static str,
        opts: AuthnOptions,
    ) -> Self {
        let sessions_cache =
            Arc::from(SessionsCache::new(opts.sessions_cache_ttl, opts.sessions_cache_capacity));
        Self { db, clock, realm, opts, sessions_cache }
    }

    /// Returns the realm to report in authentication challenges.
    pub fn realm(&self) -> &'static str {
        self.realm
    }

    /// Loads the user that owns the session `token` if the session is valid at `now`.
    async fn validate_session(
        &self,
        tx: &mut TxExecutor,
        now: OffsetDateTime,
        token: &AccessToken,
    ) -> DriverResult<User> {
        let invalid = || DriverError::Unauthorized(INVALID_SESSION.to_owned());

        let session = db::get_session(tx.ex(), token).await.map_err(|e| match e {
            DbError::NotFound => invalid(),
            e => e.into(),
        })?;

        if !session.is_valid_at(now, self.opts.session_max_age, self.opts.session_max_skew) {
            let message = "Session expired; please log in again".to_owned();
            return Err(DriverError::Unauthorized(message));
        }

        db::get_user_by_id(tx.ex(), session.user_id()).await.map_err(|e| match e {
            DbError::NotFound => invalid(),
            e => e.into(),
        })
    }

    /// Returns the user that owns the session `token`, failing if the session is not valid at
    /// `now`.
    ///
    /// Results, including failures, are cached for a short period of time.  Queries run within
    /// the caller's `tx`.
    pub async fn get_session(
        &self,
        tx: &mut TxExecutor,
        now: OffsetDateTime,
        token: AccessToken,
    ) -> DriverResult<Arc<User>> {
        if let Some(result) = self.sessions_cache.get(&token).await {
            return result;
        }

        let result = self.validate_session(tx, now, &token).await.map(Arc::from);
        self.sessions_cache.put(token, result.clone()).await;
        result
    }
}
