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

//! The `Password` and `HashedPassword` data types.
//!
//! Neither type prints its contents in `Debug` so that secrets cannot leak into the logs.

use std::fmt;
use vidly_core::model::{ModelError, ModelResult, check_length};

/// Shortest password we accept.
const MIN_LENGTH: usize = 5;

/// Longest password we accept.  bcrypt ignores anything past 72 bytes, and this keeps passwords
/// with multi-byte characters under that limit in the common case.
const MAX_LENGTH: usize = 56;

/// Work factor of bcrypt.
const BCRYPT_COST: u32 = 10;

/// Converts a bcrypt failure into a model error.
fn bcrypt_error(e: bcrypt::BcryptError) -> ModelError {
    ModelError(format!("Password error: {}", e))
}

/// A plain-text password as typed by a user.
#[derive(PartialEq)]
#[cfg_attr(any(test, feature = "testutils"), derive(Clone))]
pub struct Password(String);

impl Password {
    /// Validates the untrusted password `s`.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        check_length("Password", &s, MIN_LENGTH, MAX_LENGTH)?;
        Ok(Password(s))
    }

    /// Computes the salted hash to store.  The plain text is dropped afterwards.
    pub fn hash(self) -> ModelResult<HashedPassword> {
        bcrypt::hash(self.0, BCRYPT_COST).map(HashedPassword).map_err(bcrypt_error)
    }

    /// Checks if this is the password that produced `hash`.
    pub fn verify(self, hash: &HashedPassword) -> ModelResult<bool> {
        bcrypt::verify(self.0, &hash.0).map_err(bcrypt_error)
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for Password {
    /// Panics if the hardcoded `s` is invalid.
    fn from(s: &'static str) -> Self {
        Password::new(s).expect("Hardcoded passwords must be valid")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// A bcrypt hash of a `Password`, as stored in the database.
#[derive(Clone, PartialEq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wraps a hash loaded from the database.
    pub fn new<S: Into<String>>(s: S) -> Self {
        HashedPassword(s.into())
    }

    /// Returns the hash in its textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(<redacted>)")
    }
}
