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

//! API to create a new session for an existing user.

use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use vidly_core::model::EmailAddress;
use vidly_core::rest::{JsonBody, RestError};
use vidly_core::validation::{ValidationResult, Validator};

/// Message sent to the server to log a user in.
#[derive(Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct LoginRequest {
    /// Email address of the account.
    pub(crate) email: Option<String>,

    /// Password of the account.
    pub(crate) password: Option<String>,
}

/// Validated contents of a `LoginRequest`.
struct ValidLogin {
    /// Email address of the account.
    email: EmailAddress,

    /// Password of the account.
    password: Password,
}

impl LoginRequest {
    /// Checks every field of the request.
    fn validate(self) -> ValidationResult<ValidLogin> {
        let mut v = Validator::default();
        let email = v.parse("email", self.email, EmailAddress::new);
        let password = v.parse("password", self.password, Password::new);
        v.finish(|| Some(ValidLogin { email: email?, password: password? }))
    }
}

/// Message returned by the server after a successful login attempt.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    /// Access token for this session.
    pub(crate) access_token: AccessToken,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, RestError> {
    let request = request.validate()?;

    let session = driver.login(request.email, request.password).await?;
    let response = LoginResponse { access_token: session.take_access_token() };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::testutils::*;
    use axum::http;
    use vidly_core::rest::testutils::OneShotBuilder;
    use vidly_core::test_payload_must_be_json;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/auth".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContextBuilder::new().build().await;
        context.create_whoami_user().await;

        let request = LoginRequest {
            email: Some(context.whoami_email().to_owned()),
            password: Some(context.whoami_password().to_owned()),
        };
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_json::<LoginResponse>()
            .await;

        assert!(context.session_exists(&response.access_token).await);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let context = TestContextBuilder::new().build().await;

        let request = LoginRequest {
            email: Some("unknown@example.com".to_owned()),
            password: Some("password".to_owned()),
        };
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^Invalid email or password.$")
            .await;
    }

    #[tokio::test]
    async fn test_bad_password() {
        let context = TestContextBuilder::new().build().await;
        context.create_whoami_user().await;

        let request = LoginRequest {
            email: Some(context.whoami_email().to_owned()),
            password: Some("wrong password".to_owned()),
        };
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("^Invalid email or password.$")
            .await;
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let context = TestContextBuilder::new().build().await;

        OneShotBuilder::new(context.into_app(), route())
            .send_json(LoginRequest::default())
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("email: is required; password: is required")
            .await;
    }

    test_payload_must_be_json!(TestContextBuilder::new().build().await.into_app(), route());
}
