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

//! Test utilities for the REST API.

use crate::driver::testutils::TestContext as DriverTestContext;
use crate::rest::app;
use axum::Router;
use std::ops::Deref;
use vidly_authn::model::AccessToken;

/// State of a running test.
///
/// Dereferences to the driver-level context to offer direct access to the backing database.
pub(crate) struct TestContext {
    /// Driver-level context backing the app.
    inner: DriverTestContext,

    /// The app router serving all APIs.
    app: Router,
}

impl TestContext {
    /// Sets up the app against an in-memory database.
    pub(crate) async fn setup() -> Self {
        let inner = DriverTestContext::setup().await;
        let app = app(inner.driver());
        Self { inner, app }
    }

    /// Consumes the context and transforms it into the app router.
    pub(crate) fn into_app(self) -> Router {
        self.app
    }

    /// Gets a clone of the app router.
    pub(crate) fn app(&self) -> Router {
        self.app.clone()
    }

    /// Returns an access token for a new regular user.  Can only be called once per test.
    pub(crate) async fn user_token(&self) -> AccessToken {
        self.inner.login("user", false).await
    }

    /// Returns an access token for a new administrator.  Can only be called once per test.
    pub(crate) async fn admin_token(&self) -> AccessToken {
        self.inner.login("admin", true).await
    }
}

impl Deref for TestContext {
    type Target = DriverTestContext;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
