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

//! Building blocks for the HTTP layer of the services.
//!
//! Each service exposes an `app` function from its own `rest` module that assembles an
//! `axum::Router`, and places every API in a separate file named after the entity and method it
//! serves (`genre_get.rs`, `genres_post.rs`, etc.).  Keeping one API per file makes it obvious
//! which tests exercise which API: the `tests` module of each file defines a `route` function
//! returning the method and path under test, and every test goes through it.

use crate::driver::DriverError;
use crate::model::ModelError;
use async_trait::async_trait;
use axum::Json;
use axum::body::HttpBody;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::header::AsHeaderName;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use log::error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[cfg(feature = "testutils")]
pub mod testutils;

/// Errors that reach the callers of the APIs.  Each variant maps to one HTTP status code.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RestError {
    /// The caller is authenticated but not allowed to do what it asked for.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Something unexpected happened on our side.  Details are logged, not hidden.
    #[error("{0}")]
    InternalError(String),

    /// The request is malformed or violates some rule of the domain.
    #[error("{0}")]
    InvalidRequest(String),

    /// The entity the request refers to does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request carried a body for an API that does not take one.
    #[error("Content should be empty")]
    PayloadNotEmpty,

    /// The caller did not present credentials or presented them in an unknown form.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Authentication scheme the caller should use.
        scheme: &'static str,

        /// Protection space to report in the challenge.
        realm: &'static str,

        /// What was wrong with the credentials.
        message: String,
    },
}

impl RestError {
    /// Returns the HTTP status code that represents this error.
    fn status(&self) -> StatusCode {
        match self {
            RestError::Forbidden(_) => StatusCode::FORBIDDEN,
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::PayloadNotEmpty => StatusCode::PAYLOAD_TOO_LARGE,
            RestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        }
    }

    /// Returns the headers that must accompany the response for this error.
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let RestError::Unauthorized { scheme, realm, .. } = self {
            let challenge = format!("{} realm=\"{}\"", scheme, realm);
            match HeaderValue::from_str(&challenge) {
                Ok(value) => {
                    headers.insert(axum::http::header::WWW_AUTHENTICATE, value);
                }
                Err(e) => error!("Invalid authentication challenge '{}': {}", challenge, e),
            }
        }
        headers
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        let message = e.to_string();
        match e {
            DriverError::AlreadyExists(_) | DriverError::InvalidInput(_) => {
                RestError::InvalidRequest(message)
            }
            DriverError::BackendError(_) => RestError::InternalError(message),
            DriverError::NotFound(_) => RestError::NotFound(message),
            DriverError::Unauthorized(_) => RestError::Forbidden(message),
        }
    }
}

impl From<ModelError> for RestError {
    fn from(e: ModelError) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl From<serde_json::Error> for RestError {
    fn from(e: serde_json::Error) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        if let RestError::InternalError(details) = &self {
            error!("Request failed with internal error: {}", details);
        }
        let status = self.status();
        let headers = self.headers();
        let body = ErrorResponse { message: self.to_string() };
        (status, headers, Json(body)).into_response()
    }
}

/// Result type for this module.
pub type RestResult<T> = Result<T, RestError>;

/// Body of every error response.
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description of the error.
    pub message: String,
}

/// Extractor for APIs that take no request body.
///
/// Rejects requests that carry any content so that clients cannot start relying on fields that
/// the server silently ignores.
pub struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if !req.into_body().is_end_stream() {
            return Err(RestError::PayloadNotEmpty);
        }
        Ok(EmptyBody {})
    }
}

/// Extractor for APIs that take a JSON request body.
///
/// Same as `axum::Json` except for well-formed documents whose fields have the wrong types, which
/// are reported as `RestError::InvalidRequest` like any other problem found during validation.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(JsonRejection::JsonDataError(e)) => {
                Err(RestError::InvalidRequest(e.body_text()).into_response())
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// Gets the value of the `name` header, which may appear at most once in `headers`.
pub fn get_unique_header<K: AsHeaderName + Copy>(
    headers: &HeaderMap,
    name: K,
) -> RestResult<Option<&HeaderValue>> {
    let mut values = headers.get_all(name).into_iter();
    match (values.next(), values.next()) {
        (value, None) => Ok(value),
        (_, Some(_)) => Err(RestError::InvalidRequest(format!(
            "Header {} cannot have more than one value",
            name.as_str()
        ))),
    }
}
