// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Crypto Server API Layer
//!
//! Entry point used by the transport layer. Raw request values are checked
//! here before reaching the services, and every failure is reduced to a
//! status code and a description.
//!
//! # Example
//!
//! ```ignore
//! use robert_core::api::{BundleRequest, CryptoServerConfig, RobertCryptoServer};
//!
//! let config = CryptoServerConfig::from_env()?;
//! let server = RobertCryptoServer::open(&config)?;
//!
//! let bundle = BundleRequest {
//!     server_country_code: &[33],
//!     from_epoch_id: 2400,
//!     number_of_days: 4,
//! };
//! let registration = server.create_registration(&client_public_key, &bundle)?;
//! println!("registered {}", registration.id_a);
//! ```
//!
//! # Module Structure
//!
//! - `error` - Unified error type and status codes
//! - `config` - Server configuration
//! - `server` - The `RobertCryptoServer` facade

mod config;
mod error;
mod server;

pub use config::{
    ConfigError, CryptoServerConfig, DEFAULT_MAX_BUNDLE_DAYS, ENV_DATABASE_PATH,
    ENV_HELLO_TOLERANCE_SECS, ENV_KEYSTORE_DIR, ENV_KEYSTORE_PIN, ENV_MAX_BUNDLE_DAYS,
    ENV_SERVICE_START_DATE,
};
pub use error::{ErrorKind, RobertError, RobertResult};
pub use server::{
    AuthRequest, AuthenticatedId, BundleRequest, ContactReport, HelloDetailRequest, Registration,
    RobertCryptoServer, StatusResponse,
};
