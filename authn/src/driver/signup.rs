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

//! Extends the driver with the `signup` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password, Session, User, UserId, UserName};
use vidly_core::db::DbError;
use vidly_core::driver::{DriverError, DriverResult};
use vidly_core::model::EmailAddress;

impl AuthnDriver {
    /// Registers a new user and opens a session for it right away.
    ///
    /// Returns the newly-created user and the access token of its first session.
    pub async fn signup(
        self,
        name: UserName,
        email: EmailAddress,
        password: Password,
    ) -> DriverResult<(User, AccessToken)> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let hashed = password.hash()?;
        let user = User::new(UserId::generate(), name, email, hashed).with_last_login(now);
        match db::create_user(tx.ex(), &user).await {
            Ok(()) => (),
            Err(DbError::AlreadyExists) => {
                return Err(DriverError::AlreadyExists("User already registered.".to_owned()));
            }
            Err(e) => return Err(e.into()),
        }

        let session = Session::new(AccessToken::generate(), user.id(), now);
        db::put_session(tx.ex(), &session).await?;

        tx.commit().await?;
        Ok((user, session.take_access_token()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::AuthnOptions;
    use crate::driver::testutils::*;
    use vidly_core::clocks::Clock;

    #[tokio::test]
    async fn test_signup_ok() {
        let context = TestContext::setup(AuthnOptions::default()).await;

        let (user, token) = context
            .driver()
            .signup(
                UserName::from("John Doe"),
                EmailAddress::from("john@example.com"),
                Password::from("secret"),
            )
            .await
            .unwrap();
        assert_eq!("John Doe", user.name().as_str());
        assert!(!user.is_admin());
        assert_eq!(Some(context.clock.now_utc()), user.last_login());

        let stored = db::get_user_by_email(&mut context.ex().await, user.email()).await.unwrap();
        assert_eq!(user, stored);
        assert!(Password::from("secret").verify(stored.password()).unwrap());

        let session = db::get_session(&mut context.ex().await, &token).await.unwrap();
        assert_eq!(user.id(), session.user_id());
        assert_eq!(context.clock.now_utc(), session.login_time());
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let context = TestContext::setup(AuthnOptions::default()).await;

        context
            .driver()
            .signup(
                UserName::from("First user"),
                EmailAddress::from("same@example.com"),
                Password::from("secret"),
            )
            .await
            .unwrap();

        match context
            .driver()
            .signup(
                UserName::from("Second user"),
                EmailAddress::from("same@example.com"),
                Password::from("other"),
            )
            .await
        {
            Err(DriverError::AlreadyExists(msg)) => assert_eq!("User already registered.", msg),
            e => panic!("{:?}", e),
        }
    }

    #[tokio::test]
    async fn test_signup_email_is_case_insensitive() {
        let context = TestContext::setup(AuthnOptions::default()).await;

        context
            .driver()
            .signup(
                UserName::from("First user"),
                EmailAddress::from("same@example.com"),
                Password::from("secret"),
            )
            .await
            .unwrap();

        let err = context
            .driver()
            .signup(
                UserName::from("Second user"),
                EmailAddress::new("SAME@Example.com").unwrap(),
                Password::from("secret"),
            )
            .await
            .unwrap_err();
        assert_eq!(DriverError::AlreadyExists("User already registered.".to_owned()), err);
    }
}
