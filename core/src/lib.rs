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

//! Shared foundation of the Vidly services.
//!
//! Each service is split in layers, and each layer lives in a module of the same name:
//!
//! 1.  `model`: domain types.  Constructors enforce the invariants of each type so that holding a
//!     value is proof of its validity.  No other logic belongs here.
//!
//! 1.  `db`: persistence.  Free functions that take an `Executor` and run one query per supported
//!     backend.
//!
//! 1.  `driver`: business logic.  A cloneable `Driver` owns the database and clock handles and
//!     groups the queries of each operation into a transaction.
//!
//! 1.  `rest`: HTTP APIs.  An `axum::Router` whose handlers validate requests, call the driver
//!     and serialize its answers.
//!
//! 1.  `main`: launcher.  Reads the configuration from the environment and calls `serve`.
//!
//! Every layer has its own error type, and each one converts into the next so that `?` carries
//! failures up to the REST layer, where they become HTTP status codes.  Request payloads go
//! through the `validation` module before reaching the driver.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod clocks;
pub mod db;
pub mod driver;
pub mod env;
pub mod model;
pub mod rest;
pub mod validation;
