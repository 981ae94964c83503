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

//! API to remove a movie from the catalog.

use crate::driver::Driver;
use crate::model::MovieId;
use crate::rest::parse_path_id;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use vidly_authn::rest::get_bearer_auth;
use vidly_core::rest::{EmptyBody, RestError};

/// DELETE handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    let id: MovieId = parse_path_id(&id, "movie")?;

    let movie = driver.delete_movie(token, id).await?;

    Ok(Json(movie))
}

#[cfg(test)]
mod tests {
    use crate::db;
    use crate::model::{Movie, MovieId};
    use crate::rest::testutils::*;
    use axum::http;
    use vidly_core::db::DbError;
    use vidly_core::rest::testutils::OneShotBuilder;
    use vidly_core::test_payload_must_be_empty;

    fn route(id: impl ToString) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/movies/{}", id.to_string()))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.admin_token().await;
        let movie = context.create_movie("The Shining", 3, 2).await;
        let other = context.create_movie("Casablanca", 1, 1).await;

        let response = OneShotBuilder::new(context.app(), route(movie.id()))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<Movie>()
            .await;
        assert_eq!(movie, response);

        assert_eq!(
            DbError::NotFound,
            db::get_movie(&mut context.ex().await, movie.id()).await.unwrap_err()
        );
        assert_eq!(vec![other], db::get_movies(&mut context.ex().await).await.unwrap());
    }

    #[tokio::test]
    async fn test_not_admin() {
        let context = TestContext::setup().await;
        let token = context.user_token().await;
        let movie = context.create_movie("The Shining", 3, 2).await;

        OneShotBuilder::new(context.app(), route(movie.id()))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("Only administrators")
            .await;

        assert_eq!(movie, db::get_movie(&mut context.ex().await, movie.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;
        let token = context.admin_token().await;

        OneShotBuilder::new(context.into_app(), route(MovieId::generate()))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("The movie with the given ID was not found.")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(MovieId::generate()));
}
