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

//! Errors of the business logic layer.
//!
//! Each service defines a `Driver` type holding the handles its operations need, typically a
//! `Db` and a `Clock` behind `Arc`s so that the driver is cheap to clone.  Driver operations take
//! `self` by value: an operation owns the transaction it runs in, and issuing a second operation
//! requires an explicit `clone()` that makes the extra round trip visible at the call site.

use crate::db::DbError;
use crate::model::ModelError;

/// Failures of a driver operation, classified by how the caller should react to them.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// The operation tried to create something that exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// The operation failed for reasons unrelated to its input.
    #[error("{0}")]
    BackendError(String),

    /// The input is not acceptable, even if well-formed.
    #[error("{0}")]
    InvalidInput(String),

    /// The operation refers to something that does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The caller lacks the privileges for the operation.
    #[error("{0}")]
    Unauthorized(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        let message = e.to_string();
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(message),
            DbError::NotFound => DriverError::NotFound(message),
            DbError::BackendError(_) | DbError::DataIntegrityError(_) | DbError::Unavailable => {
                DriverError::BackendError(message)
            }
        }
    }
}

impl From<ModelError> for DriverError {
    fn from(e: ModelError) -> Self {
        DriverError::InvalidInput(e.0)
    }
}

/// Result type for this module.
pub type DriverResult<T> = Result<T, DriverError>;
