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

//! Extraction of credentials from HTTP requests.

use crate::model::AccessToken;
use http::header::{AUTHORIZATION, HeaderMap};
use vidly_core::rest::{RestError, RestResult, get_unique_header};

/// Scheme of the `Authorization` header that carries access tokens.
const BEARER: &str = "Bearer";

/// Gets the access token from the `Authorization: Bearer <token>` header in `headers`.
///
/// Problems with the header itself are reported as `Unauthorized` with a challenge for `realm`.
/// A well-formed header with a token that cannot be valid is reported as `Forbidden`.
pub fn get_bearer_auth(headers: &HeaderMap, realm: &'static str) -> RestResult<AccessToken> {
    let unauthorized =
        |message: String| RestError::Unauthorized { scheme: BEARER, realm, message };

    let value = get_unique_header(headers, &AUTHORIZATION)
        .map_err(|e| unauthorized(e.to_string()))?
        .ok_or_else(|| unauthorized("Missing Authorization header".to_owned()))?;
    let value = value
        .to_str()
        .map_err(|e| unauthorized(format!("Bad encoding in Authorization header: {}", e)))?;

    let (scheme, token) = match value.split_once(' ') {
        Some((scheme, token)) => (scheme, Some(token)),
        None => (value, None),
    };
    if scheme.is_empty() {
        return Err(unauthorized("Bad Authorization header: missing scheme".to_owned()));
    }
    if scheme != BEARER {
        return Err(unauthorized("Unsupported scheme".to_owned()));
    }
    let Some(token) = token else {
        return Err(unauthorized("Bad Authorization header: missing payload".to_owned()));
    };

    AccessToken::new(token).map_err(|e| RestError::Forbidden(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    /// Calls `get_bearer_auth` on a request with one `Authorization` header per entry in
    /// `values` and returns the message of the `Unauthorized` error it must fail with.
    fn unauthorized_message(values: &[&[u8]]) -> String {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        }
        match get_bearer_auth(&headers, "vidly-test") {
            Err(RestError::Unauthorized { scheme: "Bearer", realm: "vidly-test", message }) => {
                message
            }
            e => panic!("{:?}", e),
        }
    }

    #[test]
    fn test_get_bearer_auth_ok() {
        let token = AccessToken::generate();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        assert_eq!(token, get_bearer_auth(&headers, "vidly-test").unwrap());
    }

    #[test]
    fn test_get_bearer_auth_bad_headers() {
        let cases: [(&str, &[&[u8]]); 7] = [
            ("Missing Authorization header", &[]),
            ("cannot have more than one value", &[b"Bearer a", b"Bearer b"]),
            ("Bad encoding in Authorization header", &[b"Bearer \xc5"]),
            ("missing scheme", &[b""]),
            ("missing scheme", &[b" abc"]),
            ("missing payload", &[b"Bearer"]),
            ("Unsupported scheme", &[b"Basic dXNlcjpwYXNz"]),
        ];
        for (exp_message, values) in cases {
            let message = unauthorized_message(values);
            assert!(message.contains(exp_message), "'{}' lacks '{}'", message, exp_message);
        }
    }

    #[test]
    fn test_get_bearer_auth_malformed_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-token"));
        assert_eq!(
            RestError::Forbidden("Invalid access token".to_owned()),
            get_bearer_auth(&headers, "vidly-test").unwrap_err()
        );
    }
}
