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

//! API to get the details of one movie.

use crate::driver::Driver;
use crate::model::MovieId;
use crate::rest::parse_path_id;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use vidly_core::rest::{EmptyBody, RestError};

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let id: MovieId = parse_path_id(&id, "movie")?;

    let movie = driver.get_movie(id).await?;

    Ok(Json(movie))
}

#[cfg(test)]
mod tests {
    use crate::model::{Movie, MovieId};
    use crate::rest::testutils::*;
    use axum::http;
    use vidly_core::rest::testutils::OneShotBuilder;
    use vidly_core::test_payload_must_be_empty;

    fn route(id: impl ToString) -> (http::Method, String) {
        (http::Method::GET, format!("/api/movies/{}", id.to_string()))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let movie = context.create_movie("The Shining", 3, 2).await;
        context.create_movie("Casablanca", 1, 1).await;

        let response = OneShotBuilder::new(context.into_app(), route(movie.id()))
            .send_empty()
            .await
            .expect_json::<Movie>()
            .await;
        assert_eq!(movie, response);
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route(MovieId::generate()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("The movie with the given ID was not found.")
            .await;
    }

    #[tokio::test]
    async fn test_malformed_id() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.into_app(), route("abc"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("The movie with the given ID was not found.")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.into_app(), route(MovieId::generate()));
}
