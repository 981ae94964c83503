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

//! API to log out of the session identified by the bearer token.

use crate::driver::AuthnDriver;
use crate::rest::get_bearer_auth;
use axum::extract::State;
use axum::http::HeaderMap;
use vidly_core::rest::{EmptyBody, RestResult};

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<AuthnDriver>,
    headers: HeaderMap,
    _: EmptyBody,
) -> RestResult<()> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    Ok(driver.logout(token).await?)
}
