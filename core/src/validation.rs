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

//! Validation of untrusted request payloads.
//!
//! Request payloads are deserialized into "raw" types whose fields are all optional and loosely
//! typed.  Each raw type offers a pure `validate` method that converts it into its validated
//! counterpart using a `Validator`, which records every problem it finds instead of stopping at
//! the first one.  This allows error responses to list all offending fields at once.

use crate::model::ModelResult;
use crate::rest::RestError;
use std::fmt;
use uuid::Uuid;

/// A problem found in a single field of a request.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    /// Name of the field as it appears in the request payload.
    pub field: &'static str,

    /// Description of the problem.
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Collection of all problems found while validating a request.  Never empty.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationErrors(Vec<FieldError>);

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    /// Returns the individual field errors.
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid request: ")?;
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for RestError {
    fn from(e: ValidationErrors) -> Self {
        RestError::InvalidRequest(e.to_string())
    }
}

/// Result type for this module.
pub type ValidationResult<T> = Result<T, ValidationErrors>;

/// Accumulator of field errors.
///
/// Every method that returns an `Option` yields `None` only after recording an error for the
/// field, so `finish` can rely on all values being present when no errors were recorded.
#[derive(Default)]
#[must_use]
pub struct Validator {
    /// Errors found so far.
    errors: Vec<FieldError>,
}

impl Validator {
    /// Records an error for `field`.
    pub fn add<M: Into<String>>(&mut self, field: &'static str, message: M) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    /// Checks that the `field` with `value` was provided.
    pub fn required<T>(&mut self, field: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, "is required");
        }
        value
    }

    /// Checks that the `field` was provided and converts its `value` with `parse`, which usually
    /// is the constructor of a model type.
    pub fn parse<R, T, F>(&mut self, field: &'static str, value: Option<R>, parse: F) -> Option<T>
    where
        F: FnOnce(R) -> ModelResult<T>,
    {
        let value = self.required(field, value)?;
        match parse(value) {
            Ok(value) => Some(value),
            Err(e) => {
                self.add(field, e.0);
                None
            }
        }
    }

    /// Checks that the `field` was provided and contains a valid identifier.
    pub fn id(&mut self, field: &'static str, value: Option<String>) -> Option<Uuid> {
        let value = self.required(field, value)?;
        match Uuid::parse_str(&value) {
            Ok(id) => Some(id),
            Err(_) => {
                self.add(field, format!("'{}' is not a valid identifier", value));
                None
            }
        }
    }

    /// Finishes validation.
    ///
    /// Returns all recorded errors, if any.  Otherwise, returns the result of `build`, which
    /// should assemble the validated type from the values obtained earlier.
    pub fn finish<T, F>(self, build: F) -> ValidationResult<T>
    where
        F: FnOnce() -> Option<T>,
    {
        if !self.errors.is_empty() {
            return Err(ValidationErrors(self.errors));
        }
        build().ok_or_else(|| {
            ValidationErrors(vec![FieldError {
                field: "request",
                message: "is incomplete".to_owned(),
            }])
        })
    }
}
