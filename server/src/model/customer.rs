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

//! Customers of the rental store.

use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier of a customer.
    CustomerId
);

bounded_string!(
    /// The name of a customer.
    CustomerName,
    "Name",
    5,
    50
);

bounded_string!(
    /// The phone number of a customer.  Free-form.
    Phone,
    "Phone",
    5,
    50
);

/// A customer of the store.
///
/// Rentals embed a copy of their customer, so this same type doubles as the customer snapshot.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Customer {
    /// Identifier of the customer.
    id: CustomerId,

    /// Name of the customer.
    name: CustomerName,

    /// Contact phone of the customer.
    phone: Phone,

    /// Whether the customer has a gold membership.
    is_gold: bool,
}

impl Customer {
    /// Creates a new customer.
    pub(crate) fn new(id: CustomerId, name: CustomerName, phone: Phone, is_gold: bool) -> Self {
        Self { id, name, phone, is_gold }
    }

    /// Gets the customer's identifier.
    pub(crate) fn id(&self) -> CustomerId {
        self.id
    }

    /// Gets the customer's name.
    pub(crate) fn name(&self) -> &CustomerName {
        &self.name
    }

    /// Gets the customer's phone.
    pub(crate) fn phone(&self) -> &Phone {
        &self.phone
    }

    /// Gets whether the customer has a gold membership.
    pub(crate) fn is_gold(&self) -> bool {
        self.is_gold
    }
}
