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

//! API to check out a movie for a customer.

use crate::driver::Driver;
use crate::model::{CustomerId, MovieId};
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

/// Message sent to the server to act on the rental of a movie by a customer.
///
/// Used both to check out a movie and to return it.
#[derive(Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct RentalRequest {
    /// Identifier of the customer renting the movie.
    pub(crate) customer_id: Option<String>,

    /// Identifier of the rented movie.
    pub(crate) movie_id: Option<String>,
}

impl RentalRequest {
    /// Checks every field of the request.
    pub(crate) fn validate(self) -> ValidationResult<(CustomerId, MovieId)> {
        let mut v = Validator::default();
        let customer_id = v.id("customerId", self.customer_id).map(CustomerId::from);
        let movie_id = v.id("movieId", self.movie_id).map(MovieId::from);
        v.finish(|| Some((customer_id?, movie_id?)))
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<RentalRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    let (customer_id, movie_id) = request.validate()?;

    let rental = driver.create_rental(token, customer_id, movie_id).await?;

    Ok((StatusCode::CREATED, Json(rental)))
}
