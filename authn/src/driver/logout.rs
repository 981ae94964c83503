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

//! Extends the driver with the `logout` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::AccessToken;
use vidly_core::db::DbError;
use vidly_core::driver::{DriverError, DriverResult};

impl AuthnDriver {
    /// Marks the session identified by `token` as logged out.
    ///
    /// The session must be valid at the time of the call.
    pub async fn logout(self, token: AccessToken) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        self.get_session(&mut tx, now, token.clone()).await?;

        match db::delete_session(tx.ex(), &token, now).await {
            Ok(()) => (),
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;

        self.sessions_cache.forget(&token).await;
        Ok(())
    }
}
