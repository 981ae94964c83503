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

//! API to delete a customer.

use crate::driver::Driver;
use crate::model::CustomerId;
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
    let id: CustomerId = parse_path_id(&id, "customer")?;

    let customer = driver.delete_customer(token, id).await?;

    Ok(Json(customer))
}

#[cfg(test)]
mod tests {
    use crate::db;
    use crate::model::{Customer, CustomerId};
    use crate::rest::testutils::*;
    use axum::http;
    use vidly_core::db::DbError;
    use vidly_core::rest::testutils::OneShotBuilder;
    use vidly_core::test_payload_must_be_empty;

    fn route(id: impl ToString) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/customers/{}", id.to_string()))
    }

    #[tokio::test]
    async fn test_ok() {
        let context = TestContext::setup().await;
        let token = context.admin_token().await;
        let customer = context.create_customer("River Tam").await;

        let response = OneShotBuilder::new(context.app(), route(customer.id()))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_json::<Customer>()
            .await;
        assert_eq!(customer, response);

        assert_eq!(
            DbError::NotFound,
            db::get_customer(&mut context.ex().await, customer.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_not_admin() {
        let context = TestContext::setup().await;
        let token = context.user_token().await;
        let customer = context.create_customer("River Tam").await;

        OneShotBuilder::new(context.app(), route(customer.id()))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::FORBIDDEN)
            .expect_error("Only administrators")
            .await;

        assert_eq!(
            customer,
            db::get_customer(&mut context.ex().await, customer.id()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_not_found() {
        let context = TestContext::setup().await;
        let token = context.admin_token().await;

        OneShotBuilder::new(context.into_app(), route(CustomerId::generate()))
            .with_bearer_auth(token.as_str())
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error("The customer with the given ID was not found.")
            .await;
    }

    test_payload_must_be_empty!(
        TestContext::setup().await.into_app(),
        route(CustomerId::generate())
    );
}
