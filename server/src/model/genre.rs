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

//! Genres of movies.

use serde::{Deserialize, Serialize};

entity_id!(
    /// Unique identifier of a genre.
    GenreId
);

bounded_string!(
    /// The name of a genre.
    GenreName,
    "Name",
    5,
    50
);

/// A movie genre.
///
/// Movies embed a copy of their genre, so this same type doubles as the genre snapshot.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub(crate) struct Genre {
    /// Identifier of the genre.
    id: GenreId,

    /// Name of the genre.
    name: GenreName,
}

impl Genre {
    /// Creates a new genre.
    pub(crate) fn new(id: GenreId, name: GenreName) -> Self {
        Self { id, name }
    }

    /// Gets the genre's identifier.
    pub(crate) fn id(&self) -> GenreId {
        self.id
    }

    /// Gets the genre's name.
    pub(crate) fn name(&self) -> &GenreName {
        &self.name
    }
}
