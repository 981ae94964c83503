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

//! Harness to send requests to an app in-process and to check their responses.

use crate::rest::ErrorResponse;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{self, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tower::util::ServiceExt;

/// Upper bound on the size of the response bodies that tests can consume.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Builder for a single request against an app.
#[must_use]
pub struct OneShotBuilder {
    /// App that will serve the request.
    app: Router,

    /// Request being assembled.
    builder: http::request::Builder,
}

impl OneShotBuilder {
    /// Starts a request to `uri` using `method` against `app`.
    pub fn new<U: AsRef<str>>(app: Router, (method, uri): (http::Method, U)) -> Self {
        Self { app, builder: Request::builder().method(method).uri(uri.as_ref()) }
    }

    /// Authenticates the request with a bearer `token`.
    pub fn with_bearer_auth<T: fmt::Display>(self, token: T) -> Self {
        self.with_header(http::header::AUTHORIZATION, format!("Bearer {}", token))
    }

    /// Adds a `name` header with `value` to the request.
    pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sends the request with `body` labeled as `content_type`, if any.
    async fn send(self, content_type: Option<&str>, body: Body) -> ResponseChecker {
        let mut builder = self.builder;
        if let Some(content_type) = content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(body).unwrap();
        let response = self.app.oneshot(request).await.unwrap();
        ResponseChecker { response, exp_status: StatusCode::OK }
    }

    /// Sends the request without a body.
    pub async fn send_empty(self) -> ResponseChecker {
        self.send(None, Body::empty()).await
    }

    /// Sends the request with a plain text body.
    pub async fn send_text<T: Into<String>>(self, text: T) -> ResponseChecker {
        self.send(Some(mime::TEXT_PLAIN.as_ref()), Body::from(text.into())).await
    }

    /// Sends the request with `request` serialized as JSON in the body.
    pub async fn send_json<T: Serialize>(self, request: T) -> ResponseChecker {
        let json = serde_json::to_vec(&request).unwrap();
        self.send(Some(mime::APPLICATION_JSON.as_ref()), Body::from(json)).await
    }
}

/// Checker for the response to a request sent via `OneShotBuilder`.
///
/// The status code is expected to be `200 OK` unless changed with `expect_status`.  Every
/// `expect_*` and `take_*` method verifies the status before looking at the body.
#[must_use]
pub struct ResponseChecker {
    /// Response returned by the app.
    response: Response,

    /// Status code that the response must carry.
    exp_status: StatusCode,
}

impl ResponseChecker {
    /// Changes the status code that the response must carry.
    pub fn expect_status(mut self, status: StatusCode) -> Self {
        self.exp_status = status;
        self
    }

    /// Asserts that the response carries the expected status code.
    pub fn verify(&self) {
        assert_eq!(self.exp_status, self.response.status(), "Unexpected response status");
    }

    /// Verifies the status code and consumes the raw body.
    async fn into_bytes(self) -> Bytes {
        self.verify();
        axum::body::to_bytes(self.response.into_body(), MAX_BODY_SIZE).await.unwrap()
    }

    /// Verifies the status code and consumes the body as UTF-8 text.
    pub async fn take_body_as_text(self) -> String {
        String::from_utf8(self.into_bytes().await.to_vec()).unwrap()
    }

    /// Expects the body to be empty.
    pub async fn expect_empty(self) {
        let body = self.take_body_as_text().await;
        assert!(body.is_empty(), "Body not empty; got {}", body);
    }

    /// Expects the body to be an `ErrorResponse` whose message matches `exp_re`.
    ///
    /// An empty `exp_re` requires the message to be empty.
    pub async fn expect_error(self, exp_re: &str) {
        let body = self.take_body_as_text().await;
        let response: ErrorResponse = serde_json::from_str(&body)
            .unwrap_or_else(|e| panic!("Body is not an error response ({}): {}", e, body));
        if exp_re.is_empty() {
            assert!(response.message.is_empty(), "Unexpected error message {:?}", response);
        } else {
            let re = regex::Regex::new(exp_re).unwrap();
            assert!(re.is_match(&response.message), "{:?} does not match '{}'", response, exp_re);
        }
    }

    /// Expects the body to be the JSON representation of a `T` and returns it.
    pub async fn expect_json<T: DeserializeOwned>(self) -> T {
        let body = self.into_bytes().await;
        match serde_json::from_slice::<T>(&body) {
            Ok(value) => value,
            Err(e) => panic!("Cannot parse JSON ({}): {}", e, String::from_utf8_lossy(&body)),
        }
    }

    /// Expects the body to be text that is not an `ErrorResponse` and that matches `exp_re`.
    pub async fn expect_text(self, exp_re: &str) {
        assert!(!exp_re.is_empty(), "Use expect_empty to check for empty bodies");
        let body = self.take_body_as_text().await;
        assert!(!body.contains("\"message\":"), "Use expect_error to check error responses");
        let re = regex::Regex::new(exp_re).unwrap();
        assert!(re.is_match(&body), "Body '{}' does not match '{}'", body, exp_re);
    }

    /// Verifies the status code and hands over the whole response, for checks on properties
    /// like headers that this type does not cover.
    pub async fn take_response(self) -> Response {
        self.verify();
        self.response
    }
}

/// Generates a test that checks that an API rejects bodies that are not JSON.
#[macro_export]
macro_rules! test_payload_must_be_json {
    ( $app:expr, $route:expr ) => {
        #[tokio::test]
        async fn test_payload_must_be_json() {
            // These rejections are produced by axum's `Json` extractor so they are plain text.
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::UNSUPPORTED_MEDIA_TYPE)
                .expect_text("Content-Type")
                .await;

            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                .with_header(axum::http::header::CONTENT_TYPE, "application/json")
                .send_text("this is not json")
                .await
                .expect_status(axum::http::StatusCode::BAD_REQUEST)
                .expect_text("expected ident")
                .await;
        }
    };
}

pub use test_payload_must_be_json;

/// Generates a test that checks that an API without a request body rejects one.
#[macro_export]
macro_rules! test_payload_must_be_empty {
    ( $app:expr, $route:expr ) => {
        #[tokio::test]
        async fn test_payload_must_be_empty() {
            $crate::rest::testutils::OneShotBuilder::new($app, $route)
                .send_text("should not be here")
                .await
                .expect_status(axum::http::StatusCode::PAYLOAD_TOO_LARGE)
                .expect_error("should be empty")
                .await;
        }
    };
}

pub use test_payload_must_be_empty;
