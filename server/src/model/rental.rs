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

//! Rentals and the computation of their fees.

use crate::model::{Customer, MovieSnapshot};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use vidly_core::model::{ModelError, ModelResult};

entity_id!(
    /// Unique identifier of a rental.
    RentalId
);

/// Computes the fee of a rental at `daily_rental_rate` that started at `date_out` and ended at
/// `date_returned`.
///
/// Only whole days are billed and at least one day is always billed, which also covers returns
/// that appear to happen before checkout due to clock skew.
fn compute_fee(
    date_out: OffsetDateTime,
    date_returned: OffsetDateTime,
    daily_rental_rate: u8,
) -> u32 {
    let days = (date_returned - date_out).whole_days().clamp(1, i64::from(u32::MAX));
    // Lossless after clamping.
    let billable_days = days as u32;
    billable_days.saturating_mul(u32::from(daily_rental_rate))
}

/// A movie checked out by a customer.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Rental {
    /// Identifier of the rental.
    id: RentalId,

    /// Snapshot of the customer at checkout time.
    customer: Customer,

    /// Snapshot of the movie at checkout time.
    movie: MovieSnapshot,

    /// When the movie was checked out.
    #[serde(with = "time::serde::rfc3339")]
    date_out: OffsetDateTime,

    /// When the movie was returned, if it has been.
    #[serde(with = "time::serde::rfc3339::option")]
    date_returned: Option<OffsetDateTime>,

    /// Fee charged for the rental, known once the movie has been returned.
    rental_fee: Option<u32>,
}

impl Rental {
    /// Creates a new open rental that started at `date_out`.
    pub(crate) fn new(
        id: RentalId,
        customer: Customer,
        movie: MovieSnapshot,
        date_out: OffsetDateTime,
    ) -> Self {
        Self { id, customer, movie, date_out, date_returned: None, rental_fee: None }
    }

    /// Marks a rental as returned at `date_returned` with `rental_fee` as its fee.
    ///
    /// This is meant to reconstruct rentals from storage.  Use `mark_returned` to process a
    /// return instead.
    pub(crate) fn with_return(mut self, date_returned: OffsetDateTime, rental_fee: u32) -> Self {
        self.date_returned = Some(date_returned);
        self.rental_fee = Some(rental_fee);
        self
    }

    /// Gets the rental's identifier.
    pub(crate) fn id(&self) -> RentalId {
        self.id
    }

    /// Gets the customer snapshot.
    pub(crate) fn customer(&self) -> &Customer {
        &self.customer
    }

    /// Gets the movie snapshot.
    pub(crate) fn movie(&self) -> &MovieSnapshot {
        &self.movie
    }

    /// Gets the checkout time.
    pub(crate) fn date_out(&self) -> OffsetDateTime {
        self.date_out
    }

    /// Gets the return time, if any.
    pub(crate) fn date_returned(&self) -> Option<OffsetDateTime> {
        self.date_returned
    }

    /// Gets the fee, if the rental has been returned.
    pub(crate) fn rental_fee(&self) -> Option<u32> {
        self.rental_fee
    }

    /// Processes the return of the movie at time `now`, computing the rental fee.
    ///
    /// A rental can only be returned once.
    pub(crate) fn mark_returned(&mut self, now: OffsetDateTime) -> ModelResult<()> {
        if self.date_returned.is_some() {
            return Err(ModelError("Return already processed".to_owned()));
        }
        self.rental_fee = Some(compute_fee(self.date_out, now, self.movie.daily_rental_rate()));
        self.date_returned = Some(now);
        Ok(())
    }
}
