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

//! The `AccessToken` data type.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::fmt;
use vidly_core::model::{ModelError, ModelResult};

/// Number of alphanumeric characters in a token.  Must match the column width in the schemas.
const TOKEN_LENGTH: usize = 256;

/// Secret that identifies a session.
///
/// Tokens are random alphanumeric strings of a fixed length.  Their `Debug` representation hides
/// the secret so that tokens never leak into the logs.
#[derive(Clone, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct AccessToken(String);

impl AccessToken {
    /// Validates the untrusted `token`.
    pub fn new<S: Into<String>>(token: S) -> ModelResult<Self> {
        let token = token.into();
        let well_formed =
            token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric());
        if !well_formed {
            return Err(ModelError("Invalid access token".to_owned()));
        }
        Ok(Self(token))
    }

    /// Creates a random token.
    pub fn generate() -> Self {
        let token = rand::rng()
            .sample_iter(Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect::<String>();
        Self(token)
    }

    /// Returns the secret in its textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<AccessToken> for String {
    fn from(token: AccessToken) -> Self {
        token.0
    }
}

impl TryFrom<String> for AccessToken {
    type Error = ModelError;

    fn try_from(token: String) -> ModelResult<Self> {
        AccessToken::new(token)
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_de_tokens_error, assert_tokens};
    use std::collections::HashSet;

    #[test]
    fn test_access_token_new_ok() {
        let raw = format!("{}{}", "Ab3".repeat(85), "z");
        assert_eq!(raw, AccessToken::new(raw.as_str()).unwrap().as_str());
    }

    #[test]
    fn test_access_token_new_errors() {
        let cases = [
            String::new(),
            "a".repeat(TOKEN_LENGTH - 1),
            "a".repeat(TOKEN_LENGTH + 1),
            format!("{}-", "a".repeat(TOKEN_LENGTH - 1)),
            format!("{}ñ", "a".repeat(TOKEN_LENGTH - 2)),
        ];
        for raw in cases {
            assert_eq!(
                ModelError("Invalid access token".to_owned()),
                AccessToken::new(raw).unwrap_err()
            );
        }
    }

    #[test]
    fn test_access_token_generate() {
        let tokens = (0..500).map(|_| AccessToken::generate()).collect::<HashSet<_>>();
        assert_eq!(500, tokens.len());
        for token in tokens {
            assert_eq!(token, AccessToken::new(token.as_str()).unwrap());
        }
    }

    #[test]
    fn test_access_token_debug_redacts_secret() {
        let token = AccessToken::generate();
        let debug = format!("{:?}", token);
        assert_eq!("AccessToken(<redacted>)", debug);
        assert!(!debug.contains(token.as_str()));
    }

    #[test]
    fn test_access_token_ser_de_ok() {
        let raw: &'static str = Box::leak("A1".repeat(TOKEN_LENGTH / 2).into_boxed_str());
        assert_tokens(&AccessToken::new(raw).unwrap(), &[Token::Str(raw)]);
    }

    #[test]
    fn test_access_token_de_errors() {
        assert_de_tokens_error::<AccessToken>(&[Token::Str("short")], "Invalid access token");
        assert_de_tokens_error::<AccessToken>(
            &[Token::I64(5)],
            "invalid type: integer `5`, expected a string",
        );
    }
}
