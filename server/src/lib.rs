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

//! Vidly: REST service to manage the genres, movies, customers and rentals of a video store.
//!
//! Users and sessions are provided by `vidly_authn`, whose APIs are served by this same app under
//! the common `/api` prefix.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use axum::http::HeaderName;
use axum::response::{IntoResponse, Response};
use log::{error, info};
use std::any::Any;
use std::error::Error;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as CorsAny, CorsLayer};
use vidly_authn::driver::{AuthnDriver, AuthnOptions};
use vidly_authn::rest::AUTH_TOKEN_HEADER;
use vidly_core::clocks::{Clock, SystemClock};
use vidly_core::db::Db;
use vidly_core::env::get_optional_var;
use vidly_core::rest::RestError;

pub mod db;
mod driver;
use driver::Driver;
pub(crate) mod model;
mod rest;
use rest::app;

/// Authentication realm reported to unauthenticated callers.
const REALM: &str = "vidly";

/// Default port to listen on.
const DEFAULT_PORT: u16 = 3000;

/// Configuration options for the HTTP listener.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerOptions {
    /// Port to listen on.
    pub port: u16,

    /// Whether to listen on all interfaces instead of just on localhost.
    pub bind_all: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, bind_all: false }
    }
}

impl ServerOptions {
    /// Creates a new set of options from environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        Ok(Self {
            port: get_optional_var::<u16>(prefix, "PORT")?.unwrap_or(DEFAULT_PORT),
            bind_all: get_optional_var::<bool>(prefix, "BIND_ALL")?.unwrap_or(false),
        })
    }

    /// Computes the address to bind to.
    pub fn bind_addr(&self) -> SocketAddr {
        if self.bind_all {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
        } else {
            SocketAddr::from((Ipv4Addr::LOCALHOST, self.port))
        }
    }
}

/// Converts a panic raised by a request handler into an internal error response.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "Unknown panic payload".to_owned()
    };
    error!("Request handler panicked: {}", details);
    RestError::InternalError("Internal server error".to_owned()).into_response()
}

/// Waits until the process is asked to terminate.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C; shutting down"),
        Err(e) => error!("Cannot wait for Ctrl+C: {}; shutting down", e),
    }
}

/// Instantiates all resources to serve the application on `bind_addr`.
///
/// The `db` must have been initialized with the schemas of both this crate and `vidly_authn`.
/// The database is closed once the server stops.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
    authn_opts: AuthnOptions,
) -> Result<(), Box<dyn Error>> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::from(SystemClock::default());
    let authn = AuthnDriver::new(db.clone(), clock.clone(), REALM, authn_opts);
    let driver = Driver::new(db.clone(), clock, authn);

    let cors = CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny)
        .expose_headers([HeaderName::from_static(AUTH_TOKEN_HEADER)]);
    let app = app(driver).layer(cors).layer(CatchPanicLayer::custom(handle_panic));

    let bind_addr = bind_addr.into();
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Listening on {}", bind_addr);
    let result = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await;

    db.close().await;
    result?;
    Ok(())
}
