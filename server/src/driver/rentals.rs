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

//! Operations on rentals, including the checkout of movies.

use crate::db;
use crate::driver::{Driver, map_invalid_reference, map_not_found};
use crate::model::{CustomerId, MovieId, Rental, RentalId};
use vidly_authn::model::AccessToken;
use vidly_core::driver::{DriverError, DriverResult};

/// Message returned when trying to check out a movie without copies left.
const NOT_IN_STOCK: &str = "Movie not in stock.";

impl Driver {
    /// Gets all rentals, most recent checkouts first.
    pub(crate) async fn get_rentals(self) -> DriverResult<Vec<Rental>> {
        let rentals = db::get_rentals(&mut self.db.ex().await?).await?;
        Ok(rentals)
    }

    /// Gets the rental identified by `id`.
    pub(crate) async fn get_rental(self, id: RentalId) -> DriverResult<Rental> {
        db::get_rental(&mut self.db.ex().await?, id).await.map_err(|e| map_not_found(e, "rental"))
    }

    /// Checks out the movie `movie_id` for the customer `customer_id` on behalf of the owner of
    /// `token`.
    ///
    /// The new rental captures the current details of the customer and the movie, and the movie
    /// loses one copy from its stock.
    pub(crate) async fn create_rental(
        self,
        token: AccessToken,
        customer_id: CustomerId,
        movie_id: MovieId,
    ) -> DriverResult<Rental> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let customer = db::get_customer(tx.ex(), customer_id)
            .await
            .map_err(|e| map_invalid_reference(e, "Invalid customer."))?;
        let movie = db::get_movie(tx.ex(), movie_id)
            .await
            .map_err(|e| map_invalid_reference(e, "Invalid movie."))?;
        if movie.number_in_stock() == 0 {
            return Err(DriverError::InvalidInput(NOT_IN_STOCK.to_owned()));
        }

        let rental =
            Rental::new(RentalId::generate(), customer, movie.snapshot(), self.clock.now_utc());
        db::create_rental(tx.ex(), &rental).await?;
        db::decrement_movie_stock(tx.ex(), movie_id)
            .await
            .map_err(|e| map_invalid_reference(e, NOT_IN_STOCK))?;

        tx.commit().await?;
        Ok(rental)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use vidly_core::clocks::Clock;
    use vidly_core::clocks::testutils::utc_datetime;

    #[tokio::test]
    async fn test_get_rentals_most_recent_first() {
        let context = TestContext::setup().await;
        let customer = context.create_customer("Jane Roe").await;
        let movie = context.create_movie("Unforgiven", 3, 1).await;
        let old = context.create_rental(&customer, &movie, utc_datetime(2023, 1, 1, 0, 0, 0)).await;
        let new = context.create_rental(&customer, &movie, utc_datetime(2023, 2, 1, 0, 0, 0)).await;

        assert_eq!(vec![new, old], context.driver().get_rentals().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_rental_ok_and_not_found() {
        let context = TestContext::setup().await;
        let customer = context.create_customer("Jane Roe").await;
        let movie = context.create_movie("Unforgiven", 3, 1).await;
        let rental =
            context.create_rental(&customer, &movie, utc_datetime(2023, 1, 1, 0, 0, 0)).await;

        assert_eq!(rental, context.driver().get_rental(rental.id()).await.unwrap());
        assert_eq!(
            DriverError::NotFound("The rental with the given ID was not found.".to_owned()),
            context.driver().get_rental(RentalId::generate()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_rental_ok() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let customer = context.create_customer("Jane Roe").await;
        let movie = context.create_movie("Unforgiven", 3, 2).await;

        let rental =
            context.driver().create_rental(token, customer.id(), movie.id()).await.unwrap();
        assert_eq!(&customer, rental.customer());
        assert_eq!(&movie.snapshot(), rental.movie());
        assert_eq!(context.clock.now_utc(), rental.date_out());
        assert_eq!(None, rental.date_returned());
        assert_eq!(None, rental.rental_fee());

        assert_eq!(rental, db::get_rental(&mut context.ex().await, rental.id()).await.unwrap());
        assert_eq!(2, context.stock(movie.id()).await);
    }

    #[tokio::test]
    async fn test_create_rental_until_out_of_stock() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let customer = context.create_customer("Jane Roe").await;
        let movie = context.create_movie("Unforgiven", 1, 2).await;

        context.driver().create_rental(token.clone(), customer.id(), movie.id()).await.unwrap();
        assert_eq!(0, context.stock(movie.id()).await);

        assert_eq!(
            DriverError::InvalidInput("Movie not in stock.".to_owned()),
            context.driver().create_rental(token, customer.id(), movie.id()).await.unwrap_err()
        );
        assert_eq!(0, context.stock(movie.id()).await);
        assert_eq!(1, db::get_rentals(&mut context.ex().await).await.unwrap().len());
    }

    #[tokio::test]
    async fn test_create_rental_invalid_references() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let customer = context.create_customer("Jane Roe").await;
        let movie = context.create_movie("Unforgiven", 1, 2).await;

        assert_eq!(
            DriverError::InvalidInput("Invalid customer.".to_owned()),
            context
                .driver()
                .create_rental(token.clone(), CustomerId::generate(), movie.id())
                .await
                .unwrap_err()
        );
        assert_eq!(
            DriverError::InvalidInput("Invalid movie.".to_owned()),
            context
                .driver()
                .create_rental(token, customer.id(), MovieId::generate())
                .await
                .unwrap_err()
        );
        assert_eq!(1, context.stock(movie.id()).await);
    }

    #[tokio::test]
    async fn test_create_rental_invalid_session() {
        let context = TestContext::setup().await;
        let customer = context.create_customer("Jane Roe").await;
        let movie = context.create_movie("Unforgiven", 1, 2).await;

        let token = AccessToken::generate();
        match context.driver().create_rental(token, customer.id(), movie.id()).await {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("Invalid session")),
            e => panic!("{:?}", e),
        }
        assert_eq!(1, context.stock(movie.id()).await);
    }
}
