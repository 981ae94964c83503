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

//! Extends the driver with the `whoami` method.

use crate::driver::AuthnDriver;
use crate::model::{AccessToken, User};
use std::sync::Arc;
use vidly_core::driver::DriverResult;

impl AuthnDriver {
    /// Returns the user that owns the session identified by `token`.
    pub async fn whoami(self, token: AccessToken) -> DriverResult<Arc<User>> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let user = self.get_session(&mut tx, now, token).await?;

        tx.commit().await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::AuthnOptions;
    use crate::driver::testutils::*;
    use vidly_core::driver::DriverError;

    #[tokio::test]
    async fn test_whoami_ok() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let token = context.do_test_login("whoami", true).await;

        let user = context.driver().whoami(token).await.unwrap();
        assert_eq!("whoami@example.com", user.email().as_str());
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_whoami_unknown_token() {
        let context = TestContext::setup(AuthnOptions::default()).await;

        match context.driver().whoami(AccessToken::generate()).await {
            Err(DriverError::Unauthorized(msg)) => assert!(msg.contains("Invalid session")),
            e => panic!("{:?}", e),
        }
    }
}
