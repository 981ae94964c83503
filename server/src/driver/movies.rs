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

//! Operations on movies.

use crate::db;
use crate::driver::{Driver, map_invalid_reference, map_not_found};
use crate::model::{GenreId, Movie, MovieId, MovieTitle};
use vidly_authn::model::AccessToken;
use vidly_core::db::TxExecutor;
use vidly_core::driver::DriverResult;

/// Caller-provided details of a movie, used both for creation and updates.
#[derive(Debug)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub(crate) struct MovieDetails {
    /// Title of the movie.
    pub(crate) title: MovieTitle,

    /// Identifier of the genre of the movie, which must exist.
    pub(crate) genre_id: GenreId,

    /// Number of copies available for rental.
    pub(crate) number_in_stock: u8,

    /// Price to rent the movie for one day.
    pub(crate) daily_rental_rate: u8,
}

impl MovieDetails {
    /// Builds the movie identified by `id` with these details, snapshotting its current genre.
    async fn into_movie(self, tx: &mut TxExecutor, id: MovieId) -> DriverResult<Movie> {
        let genre = db::get_genre(tx.ex(), self.genre_id)
            .await
            .map_err(|e| map_invalid_reference(e, "Invalid genre."))?;
        Ok(Movie::new(id, self.title, genre, self.number_in_stock, self.daily_rental_rate))
    }
}

impl Driver {
    /// Gets all movies sorted by title.
    pub(crate) async fn get_movies(self) -> DriverResult<Vec<Movie>> {
        let movies = db::get_movies(&mut self.db.ex().await?).await?;
        Ok(movies)
    }

    /// Gets the movie identified by `id`.
    pub(crate) async fn get_movie(self, id: MovieId) -> DriverResult<Movie> {
        db::get_movie(&mut self.db.ex().await?, id).await.map_err(|e| map_not_found(e, "movie"))
    }

    /// Creates a new movie with `details` on behalf of the owner of `token`.
    pub(crate) async fn create_movie(
        self,
        token: AccessToken,
        details: MovieDetails,
    ) -> DriverResult<Movie> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let movie = details.into_movie(&mut tx, MovieId::generate()).await?;
        db::create_movie(tx.ex(), &movie).await?;

        tx.commit().await?;
        Ok(movie)
    }

    /// Replaces the details of the movie identified by `id` with `details` on behalf of the owner
    /// of `token`.  The genre snapshot is refreshed from the referenced genre.
    pub(crate) async fn update_movie(
        self,
        token: AccessToken,
        id: MovieId,
        details: MovieDetails,
    ) -> DriverResult<Movie> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let movie = details.into_movie(&mut tx, id).await?;
        db::update_movie(tx.ex(), &movie).await.map_err(|e| map_not_found(e, "movie"))?;

        tx.commit().await?;
        Ok(movie)
    }

    /// Deletes the movie identified by `id` on behalf of the administrator owning `token`.
    ///
    /// Returns the deleted movie.  Rentals of the movie are unaffected.
    pub(crate) async fn delete_movie(self, token: AccessToken, id: MovieId) -> DriverResult<Movie> {
        let mut tx = self.db.begin().await?;
        self.authenticate_admin(&mut tx, token).await?;

        let movie = db::get_movie(tx.ex(), id).await.map_err(|e| map_not_found(e, "movie"))?;
        db::delete_movie(tx.ex(), id).await?;

        tx.commit().await?;
        Ok(movie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use vidly_core::db::DbError;
    use vidly_core::driver::DriverError;

    /// Creates a set of valid details for a movie of `genre_id`.
    fn details(genre_id: GenreId) -> MovieDetails {
        MovieDetails {
            title: MovieTitle::from("The Good, the Bad and the Ugly"),
            genre_id,
            number_in_stock: 4,
            daily_rental_rate: 3,
        }
    }

    #[tokio::test]
    async fn test_get_movies_sorted() {
        let context = TestContext::setup().await;
        let movie2 = context.create_movie("Unforgiven", 1, 1).await;
        let movie1 = context.create_movie("High Noon", 1, 1).await;

        assert_eq!(vec![movie1, movie2], context.driver().get_movies().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_movie_ok_and_not_found() {
        let context = TestContext::setup().await;
        let movie = context.create_movie("Unforgiven", 1, 1).await;

        assert_eq!(movie, context.driver().get_movie(movie.id()).await.unwrap());
        assert_eq!(
            DriverError::NotFound("The movie with the given ID was not found.".to_owned()),
            context.driver().get_movie(MovieId::generate()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_movie_ok() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let genre = context.create_genre("Western").await;

        let movie = context.driver().create_movie(token, details(genre.id())).await.unwrap();
        assert_eq!(&genre, movie.genre());
        assert_eq!(4, movie.number_in_stock());
        assert_eq!(3, movie.daily_rental_rate());

        assert_eq!(movie, db::get_movie(&mut context.ex().await, movie.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_movie_invalid_genre() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;

        assert_eq!(
            DriverError::InvalidInput("Invalid genre.".to_owned()),
            context.driver().create_movie(token, details(GenreId::generate())).await.unwrap_err()
        );
        assert!(db::get_movies(&mut context.ex().await).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_movie_refreshes_genre() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let movie = context.create_movie("Unforgiven", 1, 1).await;
        let genre = context.create_genre("Western").await;

        let updated =
            context.driver().update_movie(token, movie.id(), details(genre.id())).await.unwrap();
        assert_eq!(movie.id(), updated.id());
        assert_eq!(&genre, updated.genre());
        assert_eq!(updated, db::get_movie(&mut context.ex().await, movie.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_movie_not_found() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let genre = context.create_genre("Western").await;

        assert_eq!(
            DriverError::NotFound("The movie with the given ID was not found.".to_owned()),
            context
                .driver()
                .update_movie(token, MovieId::generate(), details(genre.id()))
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_movie_ok() {
        let context = TestContext::setup().await;
        let token = context.login("admin", true).await;
        let movie = context.create_movie("Unforgiven", 1, 1).await;

        assert_eq!(movie, context.driver().delete_movie(token, movie.id()).await.unwrap());
        assert_eq!(
            DbError::NotFound,
            db::get_movie(&mut context.ex().await, movie.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_movie_not_admin() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let movie = context.create_movie("Unforgiven", 1, 1).await;

        match context.driver().delete_movie(token, movie.id()).await {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("administrators")),
            e => panic!("{:?}", e),
        }
        assert_eq!(movie, db::get_movie(&mut context.ex().await, movie.id()).await.unwrap());
    }
}
