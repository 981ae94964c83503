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

//! Test utilities for the business layer.

use crate::db;
use crate::driver::Driver;
use crate::model::{
    Customer, CustomerId, CustomerName, Genre, GenreId, GenreName, Movie, MovieId, MovieTitle,
    Phone, Rental, RentalId,
};
use std::sync::Arc;
use time::OffsetDateTime;
use vidly_authn::driver::AuthnOptions;
use vidly_authn::model::AccessToken;
use vidly_core::clocks::testutils::{SettableClock, utc_datetime};
use vidly_core::db::{Db, Executor};

/// State of a running test.
pub(crate) struct TestContext {
    /// Clock used by the driver, which tests can tweak at will.
    pub(crate) clock: Arc<SettableClock>,

    /// Test context of the authentication layer, sharing the database with this one.
    authn: vidly_authn::driver::testutils::TestContext,

    /// The database backing the driver.
    db: Arc<dyn Db + Send + Sync>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes the driver using an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(vidly_core::db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::from(SettableClock::new(utc_datetime(2023, 12, 1, 5, 0, 0)));

        let authn = vidly_authn::driver::testutils::TestContext::setup_with(
            AuthnOptions::default(),
            db.clone(),
            clock.clone(),
            "the-realm",
        )
        .await;

        let driver = Driver::new(db.clone(), clock.clone(), authn.driver());
        Self { clock, authn, db, driver }
    }

    /// Creates a user identified by `handle` and returns the access token of a new session.
    pub(crate) async fn login(&self, handle: &str, is_admin: bool) -> AccessToken {
        self.authn.do_test_login(handle, is_admin).await
    }

    /// Gets access to the database used by this test context.
    pub(crate) fn db(&self) -> &dyn Db {
        self.db.as_ref()
    }

    /// Gets a direct executor against the database.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Gets a copy of the driver in this test context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Creates a genre named `name` directly in the database.
    pub(crate) async fn create_genre(&self, name: &'static str) -> Genre {
        let genre = Genre::new(GenreId::generate(), GenreName::from(name));
        db::create_genre(&mut self.ex().await, &genre).await.unwrap();
        genre
    }

    /// Creates a movie directly in the database.
    pub(crate) async fn create_movie(&self, title: &'static str, stock: u8, rate: u8) -> Movie {
        let genre = Genre::new(GenreId::generate(), GenreName::from("Drama"));
        let movie = Movie::new(MovieId::generate(), MovieTitle::from(title), genre, stock, rate);
        db::create_movie(&mut self.ex().await, &movie).await.unwrap();
        movie
    }

    /// Creates a customer named `name` directly in the database.
    pub(crate) async fn create_customer(&self, name: &'static str) -> Customer {
        let customer = Customer::new(
            CustomerId::generate(),
            CustomerName::from(name),
            Phone::from("555-1234"),
            false,
        );
        db::create_customer(&mut self.ex().await, &customer).await.unwrap();
        customer
    }

    /// Creates an open rental directly in the database without touching the movie's stock.
    pub(crate) async fn create_rental(
        &self,
        customer: &Customer,
        movie: &Movie,
        date_out: OffsetDateTime,
    ) -> Rental {
        let rental =
            Rental::new(RentalId::generate(), customer.clone(), movie.snapshot(), date_out);
        db::create_rental(&mut self.ex().await, &rental).await.unwrap();
        rental
    }

    /// Gets the current stock of the movie identified by `id`.
    pub(crate) async fn stock(&self, id: MovieId) -> u8 {
        db::get_movie(&mut self.ex().await, id).await.unwrap().number_in_stock()
    }
}
