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

//! Processing of movie returns.

use crate::db;
use crate::driver::Driver;
use crate::model::{CustomerId, MovieId, Rental};
use log::warn;
use vidly_authn::model::AccessToken;
use vidly_core::db::DbError;
use vidly_core::driver::{DriverError, DriverResult};

/// Message returned when the rental to return has already been returned.
const ALREADY_RETURNED: &str = "Return already processed";

impl Driver {
    /// Processes the return of the movie `movie_id` by the customer `customer_id` on behalf of
    /// the owner of `token`.
    ///
    /// The most recent rental of the movie by the customer is marked as returned now and its fee
    /// is computed.  Once that is durable, the movie gets one copy back into its stock.
    pub(crate) async fn return_rental(
        self,
        token: AccessToken,
        customer_id: CustomerId,
        movie_id: MovieId,
    ) -> DriverResult<Rental> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let mut rental = match db::get_latest_rental(tx.ex(), customer_id, movie_id).await {
            Ok(rental) => rental,
            Err(DbError::NotFound) => {
                return Err(DriverError::NotFound("Rental not found".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        if rental.date_returned().is_some() {
            return Err(DriverError::InvalidInput(ALREADY_RETURNED.to_owned()));
        }

        rental.mark_returned(self.clock.now_utc())?;
        match db::save_rental_return(tx.ex(), &rental).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                // Another request returned this rental after we looked it up.
                return Err(DriverError::InvalidInput(ALREADY_RETURNED.to_owned()));
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        match db::increment_movie_stock(&mut self.db.ex().await?, rental.movie().id()).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                warn!(
                    "Stock of movie {} not restored after return of rental {}; gone or full",
                    rental.movie().id(),
                    rental.id()
                );
            }
            Err(e) => return Err(e.into()),
        }

        Ok(rental)
    }
}
