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

//! Movies available for rental.

use crate::model::Genre;
use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier of a movie.
    MovieId
);

bounded_string!(
    /// The title of a movie.
    MovieTitle,
    "Title",
    5,
    255
);

/// A movie in the catalog along with its inventory.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Movie {
    /// Identifier of the movie.
    id: MovieId,

    /// Title of the movie.
    title: MovieTitle,

    /// Snapshot of the genre at the time the movie was last written.
    genre: Genre,

    /// Number of copies available for rental.
    number_in_stock: u8,

    /// Price to rent the movie for one day.
    daily_rental_rate: u8,
}

impl Movie {
    /// Creates a new movie.
    pub(crate) fn new(
        id: MovieId,
        title: MovieTitle,
        genre: Genre,
        number_in_stock: u8,
        daily_rental_rate: u8,
    ) -> Self {
        Self { id, title, genre, number_in_stock, daily_rental_rate }
    }

    /// Gets the movie's identifier.
    pub(crate) fn id(&self) -> MovieId {
        self.id
    }

    /// Gets the movie's title.
    pub(crate) fn title(&self) -> &MovieTitle {
        &self.title
    }

    /// Gets the movie's genre snapshot.
    pub(crate) fn genre(&self) -> &Genre {
        &self.genre
    }

    /// Gets the number of copies available for rental.
    pub(crate) fn number_in_stock(&self) -> u8 {
        self.number_in_stock
    }

    /// Gets the price to rent the movie for one day.
    pub(crate) fn daily_rental_rate(&self) -> u8 {
        self.daily_rental_rate
    }

    /// Captures the details of this movie that a rental needs to keep.
    pub(crate) fn snapshot(&self) -> MovieSnapshot {
        MovieSnapshot::new(self.id, self.title.clone(), self.daily_rental_rate)
    }
}

/// Copy of the details of a movie embedded in a rental.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovieSnapshot {
    /// Identifier of the movie.
    id: MovieId,

    /// Title of the movie at checkout time.
    title: MovieTitle,

    /// Daily rate of the movie at checkout time.
    daily_rental_rate: u8,
}

impl MovieSnapshot {
    /// Creates a new movie snapshot.
    pub(crate) fn new(id: MovieId, title: MovieTitle, daily_rental_rate: u8) -> Self {
        Self { id, title, daily_rental_rate }
    }

    /// Gets the movie's identifier.
    pub(crate) fn id(&self) -> MovieId {
        self.id
    }

    /// Gets the movie's title.
    pub(crate) fn title(&self) -> &MovieTitle {
        &self.title
    }

    /// Gets the daily rate of the movie at checkout time.
    pub(crate) fn daily_rental_rate(&self) -> u8 {
        self.daily_rental_rate
    }
}
