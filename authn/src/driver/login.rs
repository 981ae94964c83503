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

//! Extends the driver with the `login` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password, Session};
use vidly_core::db::DbError;
use vidly_core::driver::{DriverError, DriverResult};
use vidly_core::model::EmailAddress;

/// Message returned for any credentials mismatch.  Callers must not be able to tell whether the
/// email exists or not.
const INVALID_CREDENTIALS: &str = "Invalid email or password.";

impl AuthnDriver {
    /// Logs the user identified by `email` in if `password` matches.
    pub async fn login(self, email: EmailAddress, password: Password) -> DriverResult<Session> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let user = match db::get_user_by_email(tx.ex(), &email).await {
            Ok(user) => user,
            Err(DbError::NotFound) => {
                return Err(DriverError::InvalidInput(INVALID_CREDENTIALS.to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        if !password.verify(user.password())? {
            return Err(DriverError::InvalidInput(INVALID_CREDENTIALS.to_owned()));
        }

        let session = Session::new(AccessToken::generate(), user.id(), now);
        db::put_session(tx.ex(), &session).await?;
        db::update_user_last_login(tx.ex(), user.id(), now).await?;

        tx.commit().await?;
        Ok(session)
    }
}
