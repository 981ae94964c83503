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

//! The `User` data type and its identifiers.

use crate::model::HashedPassword;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;
use vidly_core::model::{EmailAddress, ModelResult, check_length};

/// Minimum length of a user's display name.
const MIN_USER_NAME_LENGTH: usize = 5;

/// Maximum length of a user's display name per the schema.
const MAX_USER_NAME_LENGTH: usize = 50;

/// Unique identifier of a user.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generates a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the raw identifier.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The display name of a user.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserName(String);

impl UserName {
    /// Creates a new name from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        check_length("Name", &s, MIN_USER_NAME_LENGTH, MAX_USER_NAME_LENGTH)?;
        Ok(Self(s))
    }

    /// Returns a string view of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for UserName {
    /// Creates a new name from a hardcoded string, which must be valid.
    fn from(name: &'static str) -> Self {
        Self::new(name).expect("Hardcoded names must be valid")
    }
}

/// Representation of a user's information.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    /// Unique identifier of the user.
    id: UserId,

    /// Display name of the user.
    name: UserName,

    /// Email of the user, which also serves as the login identifier.
    email: EmailAddress,

    /// Hashed password.
    password: HashedPassword,

    /// Whether the user has administrative privileges.
    is_admin: bool,

    /// Time of last login of the user.  None if the user has never logged in.
    last_login: Option<OffsetDateTime>,
}

impl User {
    /// Creates a new non-admin user with the given fields.
    pub fn new(id: UserId, name: UserName, email: EmailAddress, password: HashedPassword) -> Self {
        Self { id, name, email, password, is_admin: false, last_login: None }
    }

    /// Modifies a user to grant or revoke administrative privileges.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Modifies a user to record their most recent login time.
    pub fn with_last_login(mut self, last_login: OffsetDateTime) -> Self {
        self.last_login = Some(last_login);
        self
    }

    /// Gets the user's identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Gets the user's display name.
    pub fn name(&self) -> &UserName {
        &self.name
    }

    /// Gets the user's email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Gets the user's password as a hash.
    pub fn password(&self) -> &HashedPassword {
        &self.password
    }

    /// Returns true if the user has administrative privileges.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Gets the user's last login timestamp, or `None` if the user has never logged in yet.
    pub fn last_login(&self) -> Option<OffsetDateTime> {
        self.last_login
    }
}
