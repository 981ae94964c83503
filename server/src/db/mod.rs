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

//! Database abstraction to manipulate genres, movies, customers and rentals.

use crate::model::{
    Customer, CustomerId, CustomerName, Genre, GenreId, GenreName, Movie, MovieId, MovieSnapshot,
    MovieTitle, Phone, Rental, RentalId, parse_u8,
};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;
#[cfg(feature = "postgres")]
use vidly_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use vidly_core::db::sqlite::{
    self, build_optional_timestamp, build_timestamp, build_uuid, unpack_optional_timestamp,
    unpack_timestamp,
};
use vidly_core::db::{DbError, DbResult, Executor, expect_one_row};


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Reassembles a rental from its stored parts, validating that the return details are either
/// all present or all absent.
fn build_rental(
    id: RentalId,
    customer: Customer,
    movie: MovieSnapshot,
    date_out: OffsetDateTime,
    date_returned: Option<OffsetDateTime>,
    rental_fee: Option<i64>,
) -> DbResult<Rental> {
    let rental = Rental::new(id, customer, movie, date_out);
    match (date_returned, rental_fee) {
        (None, None) => Ok(rental),
        (Some(date_returned), Some(rental_fee)) => {
            let rental_fee = u32::try_from(rental_fee).map_err(|_| {
                DbError::DataIntegrityError(format!("Invalid rental fee {}", rental_fee))
            })?;
            Ok(rental.with_return(date_returned, rental_fee))
        }
        (date_returned, rental_fee) => Err(DbError::DataIntegrityError(format!(
            "Inconsistent return details: date_returned={:?}, rental_fee={:?}",
            date_returned, rental_fee
        ))),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Genre {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: uuid::Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;

        Ok(Genre::new(GenreId::from(id), GenreName::new(name)?))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Movie {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: uuid::Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(postgres::map_sqlx_error)?;
        let genre_id: uuid::Uuid = row.try_get("genre_id").map_err(postgres::map_sqlx_error)?;
        let genre_name: String = row.try_get("genre_name").map_err(postgres::map_sqlx_error)?;
        let number_in_stock: i16 =
            row.try_get("number_in_stock").map_err(postgres::map_sqlx_error)?;
        let daily_rental_rate: i16 =
            row.try_get("daily_rental_rate").map_err(postgres::map_sqlx_error)?;

        Ok(Movie::new(
            MovieId::from(id),
            MovieTitle::new(title)?,
            Genre::new(GenreId::from(genre_id), GenreName::new(genre_name)?),
            parse_u8("Stock", i64::from(number_in_stock))?,
            parse_u8("Rate", i64::from(daily_rental_rate))?,
        ))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Customer {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: uuid::Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(postgres::map_sqlx_error)?;
        let is_gold: bool = row.try_get("is_gold").map_err(postgres::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::from(id),
            CustomerName::new(name)?,
            Phone::new(phone)?,
            is_gold,
        ))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Rental {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: uuid::Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let customer_id: uuid::Uuid =
            row.try_get("customer_id").map_err(postgres::map_sqlx_error)?;
        let customer_name: String =
            row.try_get("customer_name").map_err(postgres::map_sqlx_error)?;
        let customer_phone: String =
            row.try_get("customer_phone").map_err(postgres::map_sqlx_error)?;
        let customer_is_gold: bool =
            row.try_get("customer_is_gold").map_err(postgres::map_sqlx_error)?;
        let movie_id: uuid::Uuid = row.try_get("movie_id").map_err(postgres::map_sqlx_error)?;
        let movie_title: String = row.try_get("movie_title").map_err(postgres::map_sqlx_error)?;
        let movie_daily_rental_rate: i16 =
            row.try_get("movie_daily_rental_rate").map_err(postgres::map_sqlx_error)?;
        let date_out: OffsetDateTime = row.try_get("date_out").map_err(postgres::map_sqlx_error)?;
        let date_returned: Option<OffsetDateTime> =
            row.try_get("date_returned").map_err(postgres::map_sqlx_error)?;
        let rental_fee: Option<i64> = row.try_get("rental_fee").map_err(postgres::map_sqlx_error)?;

        let customer = Customer::new(
            CustomerId::from(customer_id),
            CustomerName::new(customer_name)?,
            Phone::new(customer_phone)?,
            customer_is_gold,
        );
        let movie = MovieSnapshot::new(
            MovieId::from(movie_id),
            MovieTitle::new(movie_title)?,
            parse_u8("Rate", i64::from(movie_daily_rental_rate))?,
        );
        build_rental(RentalId::from(id), customer, movie, date_out, date_returned, rental_fee)
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Genre {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;

        Ok(Genre::new(GenreId::from(build_uuid(&id)?), GenreName::new(name)?))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Movie {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(sqlite::map_sqlx_error)?;
        let genre_id: String = row.try_get("genre_id").map_err(sqlite::map_sqlx_error)?;
        let genre_name: String = row.try_get("genre_name").map_err(sqlite::map_sqlx_error)?;
        let number_in_stock: i64 =
            row.try_get("number_in_stock").map_err(sqlite::map_sqlx_error)?;
        let daily_rental_rate: i64 =
            row.try_get("daily_rental_rate").map_err(sqlite::map_sqlx_error)?;

        Ok(Movie::new(
            MovieId::from(build_uuid(&id)?),
            MovieTitle::new(title)?,
            Genre::new(GenreId::from(build_uuid(&genre_id)?), GenreName::new(genre_name)?),
            parse_u8("Stock", number_in_stock)?,
            parse_u8("Rate", daily_rental_rate)?,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Customer {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let phone: String = row.try_get("phone").map_err(sqlite::map_sqlx_error)?;
        let is_gold: bool = row.try_get("is_gold").map_err(sqlite::map_sqlx_error)?;

        Ok(Customer::new(
            CustomerId::from(build_uuid(&id)?),
            CustomerName::new(name)?,
            Phone::new(phone)?,
            is_gold,
        ))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Rental {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let customer_id: String = row.try_get("customer_id").map_err(sqlite::map_sqlx_error)?;
        let customer_name: String = row.try_get("customer_name").map_err(sqlite::map_sqlx_error)?;
        let customer_phone: String =
            row.try_get("customer_phone").map_err(sqlite::map_sqlx_error)?;
        let customer_is_gold: bool =
            row.try_get("customer_is_gold").map_err(sqlite::map_sqlx_error)?;
        let movie_id: String = row.try_get("movie_id").map_err(sqlite::map_sqlx_error)?;
        let movie_title: String = row.try_get("movie_title").map_err(sqlite::map_sqlx_error)?;
        let movie_daily_rental_rate: i64 =
            row.try_get("movie_daily_rental_rate").map_err(sqlite::map_sqlx_error)?;
        let date_out_secs: i64 = row.try_get("date_out_secs").map_err(sqlite::map_sqlx_error)?;
        let date_out_nsecs: i64 = row.try_get("date_out_nsecs").map_err(sqlite::map_sqlx_error)?;
        let date_returned_secs: Option<i64> =
            row.try_get("date_returned_secs").map_err(sqlite::map_sqlx_error)?;
        let date_returned_nsecs: Option<i64> =
            row.try_get("date_returned_nsecs").map_err(sqlite::map_sqlx_error)?;
        let rental_fee: Option<i64> = row.try_get("rental_fee").map_err(sqlite::map_sqlx_error)?;

        let customer = Customer::new(
            CustomerId::from(build_uuid(&customer_id)?),
            CustomerName::new(customer_name)?,
            Phone::new(customer_phone)?,
            customer_is_gold,
        );
        let movie = MovieSnapshot::new(
            MovieId::from(build_uuid(&movie_id)?),
            MovieTitle::new(movie_title)?,
            parse_u8("Rate", movie_daily_rental_rate)?,
        );
        let date_out = build_timestamp(date_out_secs, date_out_nsecs)?;
        let date_returned = build_optional_timestamp(date_returned_secs, date_returned_nsecs)?;
        build_rental(
            RentalId::from(build_uuid(&id)?),
            customer,
            movie,
            date_out,
            date_returned,
            rental_fee,
        )
    }
}

/// Creates a new `genre`.
pub(crate) async fn create_genre(ex: &mut Executor, genre: &Genre) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "INSERT INTO genres (id, name) VALUES ($1, $2)";
            let done = sqlx::query(query_str)
                .bind(genre.id().as_uuid())
                .bind(genre.name().as_str())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO genres (id, name) VALUES (?, ?)";
            let done = sqlx::query(query_str)
                .bind(genre.id().to_string())
                .bind(genre.name().as_str())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Gets the genre identified by `id`.
pub(crate) async fn get_genre(ex: &mut Executor, id: GenreId) -> DbResult<Genre> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM genres WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Genre::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM genres WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Genre::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all genres sorted by name.
pub(crate) async fn get_genres(ex: &mut Executor) -> DbResult<Vec<Genre>> {
    let query_str = "SELECT * FROM genres ORDER BY name, id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Genre::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Genre::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Updates the existing `genre` with its new details.
pub(crate) async fn update_genre(ex: &mut Executor, genre: &Genre) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE genres SET name = $1 WHERE id = $2";
            let done = sqlx::query(query_str)
                .bind(genre.name().as_str())
                .bind(genre.id().as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE genres SET name = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(genre.name().as_str())
                .bind(genre.id().to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Deletes the genre identified by `id`.  Movies that reference it are left untouched.
pub(crate) async fn delete_genre(ex: &mut Executor, id: GenreId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM genres WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM genres WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Creates a new `movie`.
pub(crate) async fn create_movie(ex: &mut Executor, movie: &Movie) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO movies
                    (id, title, genre_id, genre_name, number_in_stock, daily_rental_rate)
                VALUES ($1, $2, $3, $4, $5, $6)";
            let done = sqlx::query(query_str)
                .bind(movie.id().as_uuid())
                .bind(movie.title().as_str())
                .bind(movie.genre().id().as_uuid())
                .bind(movie.genre().name().as_str())
                .bind(i16::from(movie.number_in_stock()))
                .bind(i16::from(movie.daily_rental_rate()))
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO movies
                    (id, title, genre_id, genre_name, number_in_stock, daily_rental_rate)
                VALUES (?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(movie.id().to_string())
                .bind(movie.title().as_str())
                .bind(movie.genre().id().to_string())
                .bind(movie.genre().name().as_str())
                .bind(i64::from(movie.number_in_stock()))
                .bind(i64::from(movie.daily_rental_rate()))
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Gets the movie identified by `id`.
pub(crate) async fn get_movie(ex: &mut Executor, id: MovieId) -> DbResult<Movie> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM movies WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Movie::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM movies WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Movie::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all movies sorted by title.
pub(crate) async fn get_movies(ex: &mut Executor) -> DbResult<Vec<Movie>> {
    let query_str = "SELECT * FROM movies ORDER BY title, id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Movie::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Movie::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Updates the existing `movie` with its new details, including its genre snapshot.
pub(crate) async fn update_movie(ex: &mut Executor, movie: &Movie) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE movies
                SET title = $1, genre_id = $2, genre_name = $3,
                    number_in_stock = $4, daily_rental_rate = $5
                WHERE id = $6";
            let done = sqlx::query(query_str)
                .bind(movie.title().as_str())
                .bind(movie.genre().id().as_uuid())
                .bind(movie.genre().name().as_str())
                .bind(i16::from(movie.number_in_stock()))
                .bind(i16::from(movie.daily_rental_rate()))
                .bind(movie.id().as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE movies
                SET title = ?, genre_id = ?, genre_name = ?,
                    number_in_stock = ?, daily_rental_rate = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(movie.title().as_str())
                .bind(movie.genre().id().to_string())
                .bind(movie.genre().name().as_str())
                .bind(i64::from(movie.number_in_stock()))
                .bind(i64::from(movie.daily_rental_rate()))
                .bind(movie.id().to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Deletes the movie identified by `id`.  Rentals that reference it are left untouched.
pub(crate) async fn delete_movie(ex: &mut Executor, id: MovieId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM movies WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM movies WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Takes one copy of the movie identified by `id` out of the inventory.
///
/// Fails with `NotFound` if the movie does not exist or if it has no copies left.
pub(crate) async fn decrement_movie_stock(ex: &mut Executor, id: MovieId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE movies SET number_in_stock = number_in_stock - 1
                WHERE id = $1 AND number_in_stock > 0";
            let done = sqlx::query(query_str)
                .bind(id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE movies SET number_in_stock = number_in_stock - 1
                WHERE id = ? AND number_in_stock > 0";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Puts one copy of the movie identified by `id` back into the inventory.
///
/// Fails with `NotFound` if the movie does not exist or if its stock is already at the maximum.
pub(crate) async fn increment_movie_stock(ex: &mut Executor, id: MovieId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE movies SET number_in_stock = number_in_stock + 1
                WHERE id = $1 AND number_in_stock < 255";
            let done = sqlx::query(query_str)
                .bind(id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE movies SET number_in_stock = number_in_stock + 1
                WHERE id = ? AND number_in_stock < 255";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Creates a new `customer`.
pub(crate) async fn create_customer(ex: &mut Executor, customer: &Customer) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "INSERT INTO customers (id, name, phone, is_gold) VALUES ($1, $2, $3, $4)";
            let done = sqlx::query(query_str)
                .bind(customer.id().as_uuid())
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO customers (id, name, phone, is_gold) VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(customer.id().to_string())
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Gets the customer identified by `id`.
pub(crate) async fn get_customer(ex: &mut Executor, id: CustomerId) -> DbResult<Customer> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM customers WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Customer::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM customers WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Customer::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all customers sorted by name.
pub(crate) async fn get_customers(ex: &mut Executor) -> DbResult<Vec<Customer>> {
    let query_str = "SELECT * FROM customers ORDER BY name, id";
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Updates the existing `customer` with its new details.
pub(crate) async fn update_customer(ex: &mut Executor, customer: &Customer) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "UPDATE customers SET name = $1, phone = $2, is_gold = $3 WHERE id = $4";
            let done = sqlx::query(query_str)
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .bind(customer.id().as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE customers SET name = ?, phone = ?, is_gold = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(customer.name().as_str())
                .bind(customer.phone().as_str())
                .bind(customer.is_gold())
                .bind(customer.id().to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Deletes the customer identified by `id`.  Rentals that reference it are left untouched.
pub(crate) async fn delete_customer(ex: &mut Executor, id: CustomerId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM customers WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM customers WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Creates a new `rental`, including its return details if it has any.
pub(crate) async fn create_rental(ex: &mut Executor, rental: &Rental) -> DbResult<()> {
    let rental_fee = rental.rental_fee().map(i64::from);
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO rentals (
                    id,
                    customer_id, customer_name, customer_phone, customer_is_gold,
                    movie_id, movie_title, movie_daily_rental_rate,
                    date_out, date_returned, rental_fee
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";
            let done = sqlx::query(query_str)
                .bind(rental.id().as_uuid())
                .bind(rental.customer().id().as_uuid())
                .bind(rental.customer().name().as_str())
                .bind(rental.customer().phone().as_str())
                .bind(rental.customer().is_gold())
                .bind(rental.movie().id().as_uuid())
                .bind(rental.movie().title().as_str())
                .bind(i16::from(rental.movie().daily_rental_rate()))
                .bind(rental.date_out())
                .bind(rental.date_returned())
                .bind(rental_fee)
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (date_out_secs, date_out_nsecs) = unpack_timestamp(rental.date_out());
            let (date_returned_secs, date_returned_nsecs) =
                unpack_optional_timestamp(rental.date_returned());

            let query_str = "
                INSERT INTO rentals (
                    id,
                    customer_id, customer_name, customer_phone, customer_is_gold,
                    movie_id, movie_title, movie_daily_rental_rate,
                    date_out_secs, date_out_nsecs,
                    date_returned_secs, date_returned_nsecs, rental_fee
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(rental.id().to_string())
                .bind(rental.customer().id().to_string())
                .bind(rental.customer().name().as_str())
                .bind(rental.customer().phone().as_str())
                .bind(rental.customer().is_gold())
                .bind(rental.movie().id().to_string())
                .bind(rental.movie().title().as_str())
                .bind(i64::from(rental.movie().daily_rental_rate()))
                .bind(date_out_secs)
                .bind(date_out_nsecs)
                .bind(date_returned_secs)
                .bind(date_returned_nsecs)
                .bind(rental_fee)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}

/// Gets the rental identified by `id`.
pub(crate) async fn get_rental(ex: &mut Executor, id: RentalId) -> DbResult<Rental> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rentals WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Rental::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM rentals WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Rental::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets all rentals, most recent checkouts first.
pub(crate) async fn get_rentals(ex: &mut Executor) -> DbResult<Vec<Rental>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM rentals ORDER BY date_out DESC, id";
            let rows = sqlx::query(query_str)
                .fetch_all(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Rental::try_from).collect()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT * FROM rentals ORDER BY date_out_secs DESC, date_out_nsecs DESC, id";
            let rows =
                sqlx::query(query_str).fetch_all(ex.conn()).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Rental::try_from).collect()
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the most recent rental of the movie `movie_id` by the customer `customer_id`, whether it
/// has been returned or not.
pub(crate) async fn get_latest_rental(
    ex: &mut Executor,
    customer_id: CustomerId,
    movie_id: MovieId,
) -> DbResult<Rental> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT * FROM rentals
                WHERE customer_id = $1 AND movie_id = $2
                ORDER BY date_out DESC, id DESC
                LIMIT 1";
            let row = sqlx::query(query_str)
                .bind(customer_id.as_uuid())
                .bind(movie_id.as_uuid())
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            Rental::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT * FROM rentals
                WHERE customer_id = ? AND movie_id = ?
                ORDER BY date_out_secs DESC, date_out_nsecs DESC, id DESC
                LIMIT 1";
            let row = sqlx::query(query_str)
                .bind(customer_id.to_string())
                .bind(movie_id.to_string())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Rental::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Records the return details of `rental`, which must carry them already.
///
/// The write only happens if the stored rental has not been returned yet, which makes concurrent
/// returns of the same rental race-free.  Fails with `NotFound` if the rental does not exist or
/// was already returned.
pub(crate) async fn save_rental_return(ex: &mut Executor, rental: &Rental) -> DbResult<()> {
    let (date_returned, rental_fee) = match (rental.date_returned(), rental.rental_fee()) {
        (Some(date_returned), Some(rental_fee)) => (date_returned, i64::from(rental_fee)),
        _ => {
            return Err(DbError::BackendError(format!(
                "Rental {} has no return details to save",
                rental.id()
            )));
        }
    };

    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE rentals SET date_returned = $1, rental_fee = $2
                WHERE id = $3 AND date_returned IS NULL";
            let done = sqlx::query(query_str)
                .bind(date_returned)
                .bind(rental_fee)
                .bind(rental.id().as_uuid())
                .execute(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let (date_returned_secs, date_returned_nsecs) = unpack_timestamp(date_returned);

            let query_str = "
                UPDATE rentals
                SET date_returned_secs = ?, date_returned_nsecs = ?, rental_fee = ?
                WHERE id = ? AND date_returned_secs IS NULL";
            let done = sqlx::query(query_str)
                .bind(date_returned_secs)
                .bind(date_returned_nsecs)
                .bind(rental_fee)
                .bind(rental.id().to_string())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    expect_one_row(rows_affected)
}
