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

//! Operations on genres.

use crate::db;
use crate::driver::{Driver, map_not_found};
use crate::model::{Genre, GenreId, GenreName};
use vidly_authn::model::AccessToken;
use vidly_core::driver::DriverResult;

impl Driver {
    /// Gets all genres sorted by name.
    pub(crate) async fn get_genres(self) -> DriverResult<Vec<Genre>> {
        let genres = db::get_genres(&mut self.db.ex().await?).await?;
        Ok(genres)
    }

    /// Gets the genre identified by `id`.
    pub(crate) async fn get_genre(self, id: GenreId) -> DriverResult<Genre> {
        db::get_genre(&mut self.db.ex().await?, id).await.map_err(|e| map_not_found(e, "genre"))
    }

    /// Creates a new genre named `name` on behalf of the owner of `token`.
    pub(crate) async fn create_genre(
        self,
        token: AccessToken,
        name: GenreName,
    ) -> DriverResult<Genre> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let genre = Genre::new(GenreId::generate(), name);
        db::create_genre(tx.ex(), &genre).await?;

        tx.commit().await?;
        Ok(genre)
    }

    /// Renames the genre identified by `id` to `name` on behalf of the owner of `token`.
    ///
    /// Movies keep the genre snapshot they were written with.
    pub(crate) async fn update_genre(
        self,
        token: AccessToken,
        id: GenreId,
        name: GenreName,
    ) -> DriverResult<Genre> {
        let mut tx = self.db.begin().await?;
        self.authenticate(&mut tx, token).await?;

        let genre = Genre::new(id, name);
        db::update_genre(tx.ex(), &genre).await.map_err(|e| map_not_found(e, "genre"))?;

        tx.commit().await?;
        Ok(genre)
    }

    /// Deletes the genre identified by `id` on behalf of the administrator owning `token`.
    ///
    /// Returns the deleted genre.
    pub(crate) async fn delete_genre(self, token: AccessToken, id: GenreId) -> DriverResult<Genre> {
        let mut tx = self.db.begin().await?;
        self.authenticate_admin(&mut tx, token).await?;

        let genre = db::get_genre(tx.ex(), id).await.map_err(|e| map_not_found(e, "genre"))?;
        db::delete_genre(tx.ex(), id).await?;

        tx.commit().await?;
        Ok(genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use vidly_core::db::DbError;
    use vidly_core::driver::DriverError;

    #[tokio::test]
    async fn test_get_genres_sorted() {
        let context = TestContext::setup().await;
        let western = context.create_genre("Western").await;
        let comedy = context.create_genre("Comedy").await;

        assert_eq!(vec![comedy, western], context.driver().get_genres().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_genre_not_found() {
        let context = TestContext::setup().await;
        context.create_genre("Western").await;

        assert_eq!(
            DriverError::NotFound("The genre with the given ID was not found.".to_owned()),
            context.driver().get_genre(GenreId::generate()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_genre_ok() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;

        let genre =
            context.driver().create_genre(token, GenreName::from("Thriller")).await.unwrap();
        assert_eq!("Thriller", genre.name().as_str());

        assert_eq!(genre, db::get_genre(&mut context.ex().await, genre.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_genre_invalid_session() {
        let context = TestContext::setup().await;

        let name = GenreName::from("Thriller");
        match context.driver().create_genre(AccessToken::generate(), name).await {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("Invalid session")),
            e => panic!("{:?}", e),
        }
        assert!(db::get_genres(&mut context.ex().await).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_genre_ok() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let genre = context.create_genre("Western").await;

        let updated = context
            .driver()
            .update_genre(token, genre.id(), GenreName::from("Spaghetti western"))
            .await
            .unwrap();
        assert_eq!(genre.id(), updated.id());
        assert_eq!(updated, db::get_genre(&mut context.ex().await, genre.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_genre_not_found() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;

        assert_eq!(
            DriverError::NotFound("The genre with the given ID was not found.".to_owned()),
            context
                .driver()
                .update_genre(token, GenreId::generate(), GenreName::from("Western"))
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_genre_ok() {
        let context = TestContext::setup().await;
        let token = context.login("admin", true).await;
        let genre = context.create_genre("Western").await;

        let deleted = context.driver().delete_genre(token, genre.id()).await.unwrap();
        assert_eq!(genre, deleted);

        assert_eq!(
            DbError::NotFound,
            db::get_genre(&mut context.ex().await, genre.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_genre_not_admin() {
        let context = TestContext::setup().await;
        let token = context.login("user", false).await;
        let genre = context.create_genre("Western").await;

        match context.driver().delete_genre(token, genre.id()).await {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("administrators")),
            e => panic!("{:?}", e),
        }
        assert_eq!(genre, db::get_genre(&mut context.ex().await, genre.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_genre_not_found() {
        let context = TestContext::setup().await;
        let token = context.login("admin", true).await;

        assert_eq!(
            DriverError::NotFound("The genre with the given ID was not found.".to_owned()),
            context.driver().delete_genre(token, GenreId::generate()).await.unwrap_err()
        );
    }
}
