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

//! The `Session` data type.

use crate::model::{AccessToken, UserId};
use std::time::Duration;
use time::OffsetDateTime;

/// A logged-in user, as identified by an access token.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    /// Secret handed to the client.  Doubles as the key of the session.
    access_token: AccessToken,

    /// Owner of the session.
    user_id: UserId,

    /// When the owner logged in.
    login_time: OffsetDateTime,
}

impl Session {
    /// Creates a session from its parts.
    pub(crate) fn new(
        access_token: AccessToken,
        user_id: UserId,
        login_time: OffsetDateTime,
    ) -> Self {
        Self { access_token, user_id, login_time }
    }

    /// Returns the access token.
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the owner of the session.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns when the session started.
    pub fn login_time(&self) -> OffsetDateTime {
        self.login_time
    }

    /// Checks if the session can be used at `now`.
    ///
    /// Sessions live for `max_age` after login.  A login time up to `max_skew` in the future is
    /// tolerated to account for clock differences between the machines serving requests.
    pub fn is_valid_at(&self, now: OffsetDateTime, max_age: Duration, max_skew: Duration) -> bool {
        self.login_time >= now - max_age && self.login_time <= now + max_skew
    }

    /// Consumes the session to extract its access token.
    pub fn take_access_token(self) -> AccessToken {
        self.access_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidly_core::clocks::testutils::utc_datetime;

    #[test]
    fn test_session_accessors() {
        let token = AccessToken::generate();
        let user_id = UserId::generate();
        let login_time = utc_datetime(2024, 6, 2, 20, 15, 0);
        let session = Session::new(token.clone(), user_id, login_time);
        assert_eq!(&token, session.access_token());
        assert_eq!(user_id, session.user_id());
        assert_eq!(login_time, session.login_time());
        assert_eq!(token, session.take_access_token());
    }

    #[test]
    fn test_session_is_valid_at() {
        let login_time = utc_datetime(2024, 6, 2, 20, 15, 0);
        let session = Session::new(AccessToken::generate(), UserId::generate(), login_time);
        let max_age = Duration::from_secs(24 * 60 * 60);
        let max_skew = Duration::from_secs(60 * 60);

        let valid = [
            login_time,
            utc_datetime(2024, 6, 2, 19, 15, 0),
            utc_datetime(2024, 6, 3, 20, 14, 59),
            utc_datetime(2024, 6, 3, 20, 15, 0),
        ];
        for now in valid {
            assert!(session.is_valid_at(now, max_age, max_skew), "{} should be valid", now);
        }

        let invalid = [utc_datetime(2024, 6, 2, 19, 14, 59), utc_datetime(2024, 6, 3, 20, 15, 1)];
        for now in invalid {
            assert!(!session.is_valid_at(now, max_age, max_skew), "{} should be invalid", now);
        }
    }
}
