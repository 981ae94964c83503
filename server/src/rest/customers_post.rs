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

//! API to register a new customer.

use crate::driver::{CustomerDetails, Driver};
use crate::model::{CustomerName, Phone};
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

/// Message sent to the server to create or update a customer.
#[derive(Default, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
#[serde(rename_all = "camelCase")]
pub(crate) struct CustomerRequest {
    /// Name of the customer.
    pub(crate) name: Option<String>,

    /// Contact phone of the customer.
    pub(crate) phone: Option<String>,

    /// Whether the customer has gold status.  Defaults to false.
    pub(crate) is_gold: Option<bool>,
}

impl CustomerRequest {
    /// Checks every field of the request.
    pub(crate) fn validate(self) -> ValidationResult<CustomerDetails> {
        let mut v = Validator::default();
        let name = v.parse("name", self.name, CustomerName::new);
        let phone = v.parse("phone", self.phone, Phone::new);
        let is_gold = self.is_gold.unwrap_or(false);
        v.finish(|| Some(CustomerDetails { name: name?, phone: phone?, is_gold }))
    }
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<CustomerRequest>,
) -> Result<impl IntoResponse, RestError> {
    let token = get_bearer_auth(&headers, driver.realm())?;
    let details = request.validate()?;

    let customer = driver.create_customer(token, details).await?;

    Ok((StatusCode::CREATED, Json(customer)))
}
