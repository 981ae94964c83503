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

//! API to rename a genre.

use crate::driver::Driver;
use crate::model::GenreId;
use crate::rest::genres_post::GenreRequest;
use crate::rest::parse_path_id;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use vidly_authn::rest::get_bearer_auth;
use vidly_core::rest::{JsonBody, RestError};

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<GenreRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    let id: GenreId = parse_path_id(&id, "genre")?;
    let name = request.validate()?;

    let genre = driver.update_genre(token, id, name).await?;

    Ok(Json(genre))
}
