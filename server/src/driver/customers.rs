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

//! Operations on customers.

use crate::db;
use crate::driver::{Driver, map_not_found};
use crate::model::{Customer, CustomerId, CustomerName, Phone};
use vidly_authn::model::AccessToken;
use vidly_core::driver::DriverResult;

/// Caller-provided details of a customer, used both for creation and updates.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub(crate) struct CustomerDetails {
    /// Name of the customer.
    pub(crate) name: CustomerName,

    /// Contact phone of the customer.
    pub(crate) phone: Phone,

    /// Whether the customer has gold status.
    pub(crate) is_gold: bool,
}

impl CustomerDetails {
    /// Builds the customer identified by `id` with these details.
    fn into_customer(self, id: CustomerId) -> Customer {
        Customer::new(id, self.name, self.phone, self.is_gold)
    }
}

impl Driver {
    /// Gets all customers sorted by name.
    pub(crate) async fn get_customers(self) -> DriverResult<Vec<Customer>> {
        let customers = db::get_customers(&mut self.db.ex().await?).await?;
        Ok(customers)
    }

    /// Gets the customer identified by `id`.
    pub(crate) async fn get_customer(self, id: CustomerId) -> DriverResult<Customer> {
        db::get_customer(&mut self.db.ex().await?, id)
            .await
            .map_err(|e| map_not_found(e, "customer"))
    }

    /// Creates a new customer with `details` on behalf of the owner of `token`.
    pub(crate) async fn create_customer(
        self,
        token: AccessToken,
        details: CustomerDetails,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let customer = details.into_customer(CustomerId::generate());
        db::create_customer(tx.ex(), &customer).await?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Replaces the details of the customer identified by `id` with `details` on behalf of the
    /// owner of `token`.
    pub(crate) async fn update_customer(
        self,
        token: AccessToken,
        id: CustomerId,
        details: CustomerDetails,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let customer = details.into_customer(id);
        db::update_customer(tx.ex(), &customer)
            .await
            .map_err(|e| map_not_found(e, "customer"))?;

        tx.commit().await?;
        Ok(customer)
    }

    /// Deletes the customer identified by `id` on behalf of the administrator owning `token`.
    ///
    /// Returns the deleted customer.  Rentals of the customer are unaffected.
    pub(crate) async fn delete_customer(
        self,
        token: AccessToken,
        id: CustomerId,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;
        self.authenticate_admin(&mut tx, token).await?;

        let customer =
            db::get_customer(tx.ex(), id).await.map_err(|e| map_not_found(e, "customer"))?;
        db::delete_customer(tx.ex(), id).await?;

        tx.commit().await?;
        Ok(customer)
    }
}
