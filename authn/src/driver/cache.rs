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

//! In-memory cache of session validation results.

use crate::model::{AccessToken, User};
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use std::sync::Arc;
use std::time::Duration;
use vidly_core::driver::DriverResult;

/// Outcome of validating one access token.
type Validation = DriverResult<Arc<User>>;

/// Remembers recent validations, including failed ones, so that every authenticated request
/// does not need to hit the sessions table.
///
/// Entries expire after a short time so that changes to users become visible eventually.
/// Logouts must evict their token explicitly.
pub(super) struct SessionsCache(Mutex<LruCache<AccessToken, Validation>>);

impl SessionsCache {
    /// Creates a cache that holds up to `capacity` entries for `ttl` each.
    pub(super) fn new(ttl: Duration, capacity: usize) -> Self {
        Self(Mutex::new(LruCache::with_expiry_duration_and_capacity(ttl, capacity)))
    }

    /// Returns the cached validation of `token`, if any.
    pub(super) async fn get(&self, token: &AccessToken) -> Option<Validation> {
        self.0.lock().await.get(token).cloned()
    }

    /// Records the validation `result` of `token`.
    pub(super) async fn put(&self, token: AccessToken, result: Validation) {
        let mut cache = self.0.lock().await;
        if let Some(previous) = cache.insert(token, result.clone()) {
            // Two concurrent requests can validate the same token.  They must agree.
            if previous != result {
                warn!("Concurrent session validations disagree: {:?} != {:?}", previous, result);
            }
        }
    }

    /// Drops the validation of `token`.
    pub(super) async fn forget(&self, token: &AccessToken) {
        self.0.lock().await.remove(token);
    }
}
