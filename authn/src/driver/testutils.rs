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

//! Utilities to help testing services that integrate with the `authn` features.

use crate::db;
use crate::driver::{AuthnDriver, AuthnOptions};
use crate::model::{AccessToken, Password, User, UserId, UserName};
use std::sync::Arc;
use time::OffsetDateTime;
use vidly_core::clocks::Clock;
use vidly_core::clocks::testutils::SettableClock;
#[cfg(test)]
use vidly_core::db::Executor;
use vidly_core::db::Db;
use vidly_core::model::EmailAddress;

/// Password assigned to all users created by the helpers in this module.
pub const TEST_PASSWORD: &str = "test0password";

/// State of a running test.
pub struct TestContext {
    /// Clock used by the driver, which tests can tweak at will.
    pub clock: Arc<SettableClock>,

    /// The driver to handle authentication flows.
    driver: AuthnDriver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    #[cfg(test)]
    pub(crate) async fn setup(opts: AuthnOptions) -> Self {
        let db = Arc::from(vidly_core::db::sqlite::testutils::setup().await);
        let clock = Arc::from(SettableClock::new(
            vidly_core::clocks::testutils::utc_datetime(2023, 12, 1, 5, 0, 0),
        ));
        Self::setup_with(opts, db, clock, "the-realm").await
    }

    /// Initializes the test context using the given already-initialized objects.
    pub async fn setup_with(
        opts: AuthnOptions,
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<SettableClock>,
        realm: &'static str,
    ) -> Self {
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();
        let driver = AuthnDriver::new(db, clock.clone(), realm, opts);
        TestContext { clock, driver }
    }

    /// Creates a user identified by `handle` directly in the database.
    ///
    /// The user gets the `<handle>@example.com` email address and the `TEST_PASSWORD` password.
    /// This is the only way to create administrators, as no API grants that privilege.
    pub async fn create_user(&self, handle: &str, is_admin: bool) -> User {
        let user = User::new(
            UserId::generate(),
            UserName::new(format!("Test user {}", handle)).unwrap(),
            EmailAddress::new(format!("{}@example.com", handle)).unwrap(),
            Password::from(TEST_PASSWORD).hash().unwrap(),
        )
        .with_admin(is_admin);
        db::create_user(&mut self.driver.db.ex().await.unwrap(), &user).await.unwrap();
        user
    }

    /// Syntactic sugar to create and log a user in for testing purposes.
    pub async fn do_test_login(&self, handle: &str, is_admin: bool) -> AccessToken {
        let user = self.create_user(handle, is_admin).await;
        let session =
            self.driver.clone().login(user.email().clone(), Password::from(TEST_PASSWORD)).await;
        session.unwrap().take_access_token()
    }

    /// Returns the current time as seen by the driver, shifted by `secs` seconds.
    pub fn now_delta(&self, secs: i64) -> OffsetDateTime {
        self.clock.now_utc() + time::Duration::seconds(secs)
    }

    /// Gets access to the database used by this test context.
    #[cfg(test)]
    pub(crate) fn db(&self) -> &dyn Db {
        self.driver.db.as_ref()
    }

    /// Gets a direct executor against the database.
    #[cfg(test)]
    pub(crate) async fn ex(&self) -> Executor {
        self.driver.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub fn driver(&self) -> AuthnDriver {
        self.driver.clone()
    }
}
