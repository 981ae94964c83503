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

//! API to add a movie to the catalog.

use crate::driver::{Driver, MovieDetails};
use crate::model::{GenreId, MovieTitle, parse_u8};
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

/// Message sent to the server to create or update a movie.
#[derive(Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovieRequest {
    /// Title of the movie.
    pub(crate) title: Option<String>,

    /// Identifier of an existing genre.
    pub(crate) genre_id: Option<String>,

    /// Number of copies available for rental.
    pub(crate) number_in_stock: Option<i64>,

    /// Price to rent the movie for one day.
    pub(crate) daily_rental_rate: Option<i64>,
}

impl MovieRequest {
    /// Checks every field of the request.
    pub(crate) fn validate(self) -> ValidationResult<MovieDetails> {
        let mut v = Validator::default();
        let title = v.parse("title", self.title, MovieTitle::new);
        let genre_id = v.id("genreId", self.genre_id).map(GenreId::from);
        let number_in_stock =
            v.parse("numberInStock", self.number_in_stock, |n| parse_u8("Stock", n));
        let daily_rental_rate =
            v.parse("dailyRentalRate", self.daily_rental_rate, |n| parse_u8("Rate", n));
        v.finish(|| {
            Some(MovieDetails {
                title: title?,
                genre_id: genre_id?,
                number_in_stock: number_in_stock?,
                daily_rental_rate: daily_rental_rate?,
            })
        })
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<MovieRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    let details = request.validate()?;

    let movie = driver.create_movie(token, details).await?;

    Ok((StatusCode::CREATED, Json(movie)))
}
