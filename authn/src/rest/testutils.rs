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

//! Utilities to help testing the REST interface of the users and sessions service.

use crate::db;
use crate::driver::AuthnOptions;
use crate::driver::testutils::{TEST_PASSWORD, TestContext as DriverTestContext};
use crate::model::{AccessToken, User};
use crate::rest::app;
use axum::Router;
use vidly_core::db::DbError;
use vidly_core::model::EmailAddress;

/// State of a running test.
pub(crate) struct TestContext {
    /// Driver-level context backing the app.
    inner: DriverTestContext,

    /// The app router serving the APIs under `/api`.
    app: Router,

    /// Handle used to name the test user.
    whoami: String,
}

impl TestContext {
    /// Consumes the context and transforms it into the app router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Gets a clone of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Creates the `whoami` user by directly modifying the backing database.
    pub(crate) async fn create_whoami_user(&self) -> User {
        self.inner.create_user(&self.whoami, false).await
    }

    /// Logs the `whoami` user in and returns its access token.  The user must exist.
    pub(crate) async fn access_token(&self) -> AccessToken {
        let session = self
            .inner
            .driver()
            .login(EmailAddress::new(self.whoami_email()).unwrap(), TEST_PASSWORD.into())
            .await
            .unwrap();
        session.take_access_token()
    }

    /// Returns the email address of the `whoami` user.
    pub(crate) fn whoami_email(&self) -> String {
        format!("{}@example.com", self.whoami)
    }

    /// Returns the password of the `whoami` user.
    pub(crate) fn whoami_password(&self) -> &'static str {
        TEST_PASSWORD
    }

    /// Checks if the user with `email` exists by directly querying the backing database.
    pub(crate) async fn user_exists(&self, email: &'static str) -> bool {
        match db::get_user_by_email(&mut self.inner.ex().await, &EmailAddress::from(email)).await {
            Ok(_) => true,
            Err(DbError::NotFound) => false,
            Err(e) => panic!("{:?}", e),
        }
    }

    /// Checks if the session with `token` exists and is active by directly querying the backing
    /// database.
    pub(crate) async fn session_exists(&self, token: &AccessToken) -> bool {
        match db::get_session(&mut self.inner.ex().await, token).await {
            Ok(_) => true,
            Err(DbError::NotFound) => false,
            Err(e) => panic!("{:?}", e),
        }
    }
}

/// Builder pattern for the test context.
#[must_use]
pub(crate) struct TestContextBuilder {
    /// Handle used to name the test user.
    whoami: String,
}

impl TestContextBuilder {
    /// Initializes a new builder with the default test settings.
    pub(crate) fn new() -> Self {
        Self { whoami: "whoami".to_owned() }
    }

    /// Sets up the test environment with the configured settings.
    pub(crate) async fn build(self) -> TestContext {
        let inner = DriverTestContext::setup(AuthnOptions::default()).await;
        let app = Router::new().nest("/api", app(inner.driver()));
        TestContext { inner, app, whoami: self.whoami }
    }
}
