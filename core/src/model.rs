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

//! Generic data types shared by all services.

mod emailaddress;
pub use emailaddress::EmailAddress;

/// Model errors.  Raised when a value violates the invariants of a domain type.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Checks that the text `s` has a number of characters within `min..=max`.
///
/// `what` names the value in the error message and should be capitalized.
pub fn check_length(what: &str, s: &str, min: usize, max: usize) -> ModelResult<()> {
    let len = s.chars().count();
    if len < min || len > max {
        return Err(ModelError(format!(
            "{} must have between {} and {} characters but has {}",
            what, min, max, len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_length_ok() {
        check_length("Name", "abcde", 5, 10).unwrap();
        check_length("Name", "abcdefghij", 5, 10).unwrap();
    }

    #[test]
    fn test_check_length_counts_chars_not_bytes() {
        check_length("Name", "ñññññ", 5, 5).unwrap();
    }

    #[test]
    fn test_check_length_out_of_range() {
        assert_eq!(
            ModelError("Name must have between 5 and 10 characters but has 4".to_owned()),
            check_length("Name", "abcd", 5, 10).unwrap_err()
        );
        assert_eq!(
            ModelError("Title must have between 1 and 2 characters but has 3".to_owned()),
            check_length("Title", "abc", 1, 2).unwrap_err()
        );
    }
}
