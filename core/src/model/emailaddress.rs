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

//! The `EmailAddress` data type.

use crate::model::{ModelError, ModelResult, check_length};
use serde::{Deserialize, Serialize};

/// Shortest address we accept, as in `a@b.c`.
const MIN_LENGTH: usize = 5;

/// Longest address that fits in the database columns holding addresses.
const MAX_LENGTH: usize = 255;

/// A plausible email address, normalized to lowercase.
///
/// Addresses identify accounts, so normalizing them makes lookups case-insensitive.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates the untrusted address `s`.
    ///
    /// Only obviously broken addresses are rejected: the real test of an address is whether mail
    /// sent to it arrives.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        check_length("Email address", &s, MIN_LENGTH, MAX_LENGTH)?;

        let well_formed = match s.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !s.contains(char::is_whitespace)
            }
            None => false,
        };
        if !well_formed {
            return Err(ModelError(format!("Email does not look like a valid address '{}'", s)));
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Wraps `s` without validating it, to simulate corrupt data in tests.
    #[cfg(any(test, feature = "testutils"))]
    pub fn new_invalid<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    /// Returns the address as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ModelError;

    fn try_from(s: String) -> ModelResult<Self> {
        EmailAddress::new(s)
    }
}

#[cfg(any(test, feature = "testutils"))]
impl From<&'static str> for EmailAddress {
    /// Panics if the hardcoded `raw` is invalid.
    fn from(raw: &'static str) -> Self {
        Self::new(raw).expect("Hardcoded email addresses for testing must be valid")
    }
}
