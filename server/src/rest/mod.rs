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

//! REST interface for the rental service.

use crate::driver::Driver;
use axum::Router;
use uuid::Uuid;
use vidly_core::rest::{RestError, RestResult};

mod customer_delete;
mod customer_get;
mod customer_put;
mod customers_get;
mod customers_post;
mod genre_delete;
mod genre_get;
mod genre_put;
mod genres_get;
mod genres_post;
mod movie_delete;
mod movie_get;
mod movie_put;
mod movies_get;
mod movies_post;
mod rental_get;
mod rentals_get;
mod rentals_post;
mod returns_post;
#[cfg(test)]
mod testutils;

/// Parses the raw identifier `id` taken from the path of a request for a `what` entity.
///
/// Malformed identifiers cannot match any entity so they are reported as not found.
fn parse_path_id<T: From<Uuid>>(id: &str, what: &str) -> RestResult<T> {
    match Uuid::parse_str(id) {
        Ok(id) => Ok(T::from(id)),
        Err(_) => {
            Err(RestError::NotFound(format!("The {} with the given ID was not found.", what)))
        }
    }
}

/// Creates the router for the application, serving all APIs under `/api`.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post};

    let authn = vidly_authn::rest::app(driver.authn());

    let rentals = Router::new()
        .route("/customers", get(customers_get::handler).post(customers_post::handler))
        .route(
            "/customers/:id",
            get(customer_get::handler).put(customer_put::handler).delete(customer_delete::handler),
        )
        .route("/genres", get(genres_get::handler).post(genres_post::handler))
        .route(
            "/genres/:id",
            get(genre_get::handler).put(genre_put::handler).delete(genre_delete::handler),
        )
        .route("/movies", get(movies_get::handler).post(movies_post::handler))
        .route(
            "/movies/:id",
            get(movie_get::handler).put(movie_put::handler).delete(movie_delete::handler),
        )
        .route("/rentals", get(rentals_get::handler).post(rentals_post::handler))
        .route("/rentals/:id", get(rental_get::handler))
        .route("/returns", post(returns_post::handler))
        .with_state(driver);

    Router::new().nest("/api", rentals.merge(authn))
}
