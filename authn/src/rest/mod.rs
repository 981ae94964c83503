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

//! REST interface for the users and sessions service.

use crate::driver::AuthnDriver;
use crate::model::{User, UserId};
use axum::Router;
#[cfg(test)]
use serde::Deserialize;
use serde::Serialize;

mod api_auth_logout_post;
mod api_auth_post;
mod api_users_me_get;
mod api_users_post;
mod httputils;
#[cfg(test)]
mod testutils;

pub use httputils::get_bearer_auth;

/// Name of the header that carries the access token of a freshly-registered user.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Public representation of a user.  Never exposes the password hash.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    /// Identifier of the user.
    pub(crate) id: UserId,

    /// Display name of the user.
    pub(crate) name: String,

    /// Email address of the user.
    pub(crate) email: String,

    /// Whether the user has administrative privileges.
    pub(crate) is_admin: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            name: user.name().as_str().to_owned(),
            email: user.email().as_str().to_owned(),
            is_admin: user.is_admin(),
        }
    }
}

/// Creates the router for the users and sessions endpoints.
///
/// The routes are relative so the caller is expected to nest them under the desired prefix.
pub fn app(driver: AuthnDriver) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/auth", post(api_auth_post::handler))
        .route("/auth/logout", post(api_auth_logout_post::handler))
        .route("/users", post(api_users_post::handler))
        .route("/users/me", get(api_users_me_get::handler))
        .with_state(driver)
}
