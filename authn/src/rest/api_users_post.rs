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

//! API to register a new user.

use crate::driver::AuthnDriver;
use crate::model::{Password, UserName};
use crate::rest::{AUTH_TOKEN_HEADER, UserResponse};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;
use vidly_core::model::EmailAddress;
use vidly_core::rest::{JsonBody, RestError};
use vidly_core::validation::{ValidationResult, Validator};

/// Message sent to the server to register a new user.
#[derive(Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct SignupRequest {
    /// Display name of the new user.
    pub(crate) name: Option<String>,

    /// Email address of the new user, which identifies the account.
    pub(crate) email: Option<String>,

    /// Password for the new user.
    pub(crate) password: Option<String>,
}

/// Validated contents of a `SignupRequest`.
struct ValidSignup {
    /// Display name of the new user.
    name: UserName,

    /// Email address of the new user.
    email: EmailAddress,

    /// Password for the new user.
    password: Password,
}

impl SignupRequest {
    /// Checks every field of the request.
    fn validate(self) -> ValidationResult<ValidSignup> {
        let mut v = Validator::default();
        let name = v.parse("name", self.name, UserName::new);
        let email = v.parse("email", self.email, EmailAddress::new);
        let password = v.parse("password", self.password, Password::new);
        v.finish(|| Some(ValidSignup { name: name?, email: email?, password: password? }))
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    JsonBody(request): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, RestError> {
    let request = request.validate()?;

    let (user, token) = driver.signup(request.name, request.email, request.password).await?;

    Ok((
        StatusCode::CREATED,
        [(AUTH_TOKEN_HEADER, token.as_str().to_owned())],
        Json(UserResponse::from(&user)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccessToken;
    use crate::rest::testutils::*;
    use axum::http;
    use vidly_core::rest::testutils::OneShotBuilder;
    use vidly_core::test_payload_must_be_json;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/users".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContextBuilder::new().build().await;

        let request = SignupRequest {
            name: Some("New User".to_owned()),
            email: Some("New@Example.com".to_owned()),
            password: Some("secret".to_owned()),
        };
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .take_response()
            .await;

        let token = response.headers().get(AUTH_TOKEN_HEADER).unwrap().to_str().unwrap();
        let token = AccessToken::new(token).unwrap();
        assert!(context.session_exists(&token).await);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let user: UserResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!("New User", user.name);
        assert_eq!("new@example.com", user.email);
        assert!(!user.is_admin);
        assert!(context.user_exists("new@example.com").await);
    }

    #[tokio::test]
    async fn test_ignores_admin_flag() {
        let context = TestContextBuilder::new().build().await;

        let request = serde_json::json!({
            "name": "New User",
            "email": "new@example.com",
            "password": "secret",
            "isAdmin": true,
        });
        let response = OneShotBuilder::new(context.app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<UserResponse>()
            .await;
        assert!(!response.is_admin);
    }

    #[tokio::test]
    async fn test_already_registered() {
        let context = TestContextBuilder::new().build().await;
        context.create_whoami_user().await;

        let request = SignupRequest {
            name: Some("Another User".to_owned()),
            email: Some(context.whoami_email().to_owned()),
            password: Some("secret".to_owned()),
        };
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("User already registered.")
            .await;
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let context = TestContextBuilder::new().build().await;

        let request = SignupRequest {
            name: Some("abc".to_owned()),
            email: Some("not-an-email".to_owned()),
            password: None,
        };
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("name: .*; email: .*; password: is required")
            .await;
    }

    #[tokio::test]
    async fn test_password_too_long() {
        let context = TestContextBuilder::new().build().await;

        let request = SignupRequest {
            name: Some("New User".to_owned()),
            email: Some("new@example.com".to_owned()),
            password: Some("x".repeat(57)),
        };
        OneShotBuilder::new(context.into_app(), route())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("password: Password must have between 5 and 56 characters")
            .await;
    }

    test_payload_must_be_json!(TestContextBuilder::new().build().await.into_app(), route());
}
