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

//! Data types for the rental service.

use vidly_core::model::{ModelError, ModelResult};

/// Generates a newtype over a UUID to identify entities of a given kind.
macro_rules! entity_id {
    ( $(#[$meta:meta])* $name:ident ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            serde::Deserialize,
            serde::Serialize,
        )]
        #[serde(transparent)]
        pub(crate) struct $name(uuid::Uuid);

        impl $name {
            /// Generates a new random identifier.
            pub(crate) fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Returns the raw identifier.
            pub(crate) fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(id: uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

/// Generates a newtype over a string whose length, in characters, must be within `min..=max`.
///
/// Values are validated on construction and on deserialization.
macro_rules! bounded_string {
    ( $(#[$meta:meta])* $name:ident, $what:literal, $min:expr, $max:expr ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
        #[serde(try_from = "String")]
        pub(crate) struct $name(String);

        impl $name {
            /// Creates a new value from an untrusted string `s`, making sure it is valid.
            pub(crate) fn new<S: Into<String>>(s: S) -> vidly_core::model::ModelResult<Self> {
                let s = s.into();
                vidly_core::model::check_length($what, &s, $min, $max)?;
                Ok(Self(s))
            }

            /// Returns a string view of the value.
            pub(crate) fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = vidly_core::model::ModelError;

            fn try_from(s: String) -> vidly_core::model::ModelResult<Self> {
                Self::new(s)
            }
        }

        #[cfg(test)]
        impl From<&'static str> for $name {
            /// Creates a new value from a hardcoded string, which must be valid.
            fn from(s: &'static str) -> Self {
                Self::new(s).expect("Hardcoded values must be valid")
            }
        }
    };
}

mod customer;
pub(crate) use customer::{Customer, CustomerId, CustomerName, Phone};
mod genre;
pub(crate) use genre::{Genre, GenreId, GenreName};
mod movie;
pub(crate) use movie::{Movie, MovieId, MovieSnapshot, MovieTitle};
mod rental;
pub(crate) use rental::{Rental, RentalId};

/// Converts an untrusted integer `value` for the `what` property into a byte-sized quantity.
pub(crate) fn parse_u8(what: &str, value: i64) -> ModelResult<u8> {
    u8::try_from(value).map_err(|_| {
        ModelError(format!("{} must be between {} and {} but is {}", what, u8::MIN, u8::MAX, value))
    })
}
