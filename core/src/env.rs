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

//! Access to configuration stored in environment variables.
//!
//! Settings are grouped under a prefix so that a single process can hold several configurations
//! of the same kind: `<prefix>_<name>`.

use std::env;
use std::time::Duration;

/// Types that can be parsed from the textual value of an environment variable.
pub trait EnvValue: Sized {
    /// Parses `raw` into the target type, describing the problem on error.
    fn parse_env(raw: String) -> Result<Self, String>;
}

impl EnvValue for String {
    fn parse_env(raw: String) -> Result<Self, String> {
        Ok(raw)
    }
}

/// Implements `EnvValue` for integer types via their `FromStr` implementation.
macro_rules! env_value_for_int [
    ( $( $t:ty ),+ ) => {
        $(
            impl EnvValue for $t {
                fn parse_env(raw: String) -> Result<Self, String> {
                    raw.parse::<$t>().map_err(|e| format!("Invalid {}: {}", stringify!($t), e))
                }
            }
        )+
    }
];

env_value_for_int!(u16, u32, u64, usize);

impl EnvValue for bool {
    fn parse_env(raw: String) -> Result<Self, String> {
        if ["1", "true", "yes"].iter().any(|v| raw.eq_ignore_ascii_case(v)) {
            Ok(true)
        } else if ["0", "false", "no"].iter().any(|v| raw.eq_ignore_ascii_case(v)) {
            Ok(false)
        } else {
            Err(format!("Invalid bool: {}", raw))
        }
    }
}

/// Durations are written as an integer followed by one of the `s`, `m`, `h` or `d` units.
impl EnvValue for Duration {
    fn parse_env(raw: String) -> Result<Self, String> {
        let raw = raw.trim();
        let (number, unit_secs) = match raw.char_indices().last() {
            None => return Err("Invalid duration: empty".to_owned()),
            Some((i, 's')) => (&raw[..i], 1),
            Some((i, 'm')) => (&raw[..i], 60),
            Some((i, 'h')) => (&raw[..i], 60 * 60),
            Some((i, 'd')) => (&raw[..i], 24 * 60 * 60),
            Some((_, unit)) => {
                return Err(format!("Invalid duration {}: unknown unit '{}'", raw, unit));
            }
        };
        let n = number.parse::<u64>().map_err(|e| format!("Invalid duration {}: {}", raw, e))?;
        n.checked_mul(unit_secs)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("Invalid duration {}: too large", raw))
    }
}

/// Reads and parses `<prefix>_<suffix>`, returning `None` if the variable is not set.
fn lookup<T: EnvValue>(prefix: &str, suffix: &str) -> Result<Option<T>, String> {
    let name = format!("{}_{}", prefix, suffix);
    let raw = match env::var(&name) {
        Ok(raw) => raw,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            return Err(format!("Invalid value in environment variable {}", name));
        }
    };
    T::parse_env(raw)
        .map(Some)
        .map_err(|e| format!("Invalid type in environment variable {}: {}", name, e))
}

/// Gets the value of `<prefix>_<suffix>` as a `T`, failing if the variable is not set.
pub fn get_required_var<T: EnvValue>(prefix: &str, suffix: &str) -> Result<T, String> {
    lookup(prefix, suffix)?.ok_or_else(|| {
        format!("Required environment variable {}_{} not present", prefix, suffix)
    })
}

/// Gets the value of `<prefix>_<suffix>` as a `T`, if set.
pub fn get_optional_var<T: EnvValue>(prefix: &str, suffix: &str) -> Result<Option<T>, String> {
    lookup(prefix, suffix)
}
