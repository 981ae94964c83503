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

//! API to create a new genre.

use crate::driver::Driver;
use crate::model::GenreName;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
#[cfg(test)]
use serde::Serialize;
use vidly_authn::rest::get_bearer_auth;
use vidly_core::rest::{JsonBody, RestError};
use vidly_core::validation::{ValidationResult, Validator};

/// Message sent to the server to create or update a genre.
#[derive(Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub(crate) struct GenreRequest {
    /// Name of the genre.
    pub(crate) name: Option<String>,
}

impl GenreRequest {
    /// Checks every field of the request.
    pub(crate) fn validate(self) -> ValidationResult<GenreName> {
        let mut v = Validator::default();
        let name = v.parse("name", self.name, GenreName::new);
        v.finish(|| name)
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<GenreRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    let name = request.validate()?;

    let genre = driver.create_genre(token, name).await?;

    Ok((StatusCode::CREATED, Json(genre)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::Genre;
    use crate::rest::testutils::*;
    use axum::http;
    use vidly_core::rest::testutils::OneShotBuilder;
    use vidly_core::test_payload_must_be_json;

    fn route() -> (http::Method, String) {
        (http::Method::POST, "/api/genres".to_owned())
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.user_token().await;

        let request = GenreRequest { name: Some("Documentary".to_owned()) };
        let response = OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(request)
            .await
            .expect_status(http::StatusCode::CREATED)
            .expect_json::<Genre>()
            .await;
        assert_eq!("Documentary", response.name().as_str());

        let genres = db::get_genres(&mut context.ex().await).await.unwrap();
        assert_eq!(vec![response], genres);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let context = TestContext::setup().await;
        let token = context.user_token().await;

        OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(GenreRequest { name: Some("Doc".to_owned()) })
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("name: Name must have between 5 and 50 characters")
            .await;

        OneShotBuilder::new(context.app(), route())
            .with_bearer_auth(token.as_str())
            .send_json(GenreRequest::default())
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_error("name: is required")
            .await;

        assert!(db::get_genres(&mut context.ex().await).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_token() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_json(GenreRequest { name: Some("Documentary".to_owned()) })
            .await
            .expect_status(http::StatusCode::UNAUTHORIZED)
            .expect_error("Missing")
            .await;

        assert!(db::get_genres(&mut context.ex().await).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route())
            .with_bearer_auth(vidly_authn::model::AccessToken::generate().as_str())
            .send_json(GenreRequest { name: Some("Documentary".to_owned()) })
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("Invalid session")
            .await;
    }

    test_payload_must_be_json!(TestContext::setup().await.into_app(), route());
}
