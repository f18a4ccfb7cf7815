// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Oblivious HTTP (RFC 9458) client.
//!
//! A request is encoded as binary HTTP (RFC 9292), sealed to the gateway's
//! published key, POSTed to the gateway, and the sealed reply is opened and
//! decoded again. [`OhttpClient`] runs the whole exchange.

pub mod bhttp;
pub mod client;
pub mod config;
pub mod encapsulation;
pub mod error;
pub mod key_config;
pub mod message;
pub mod relay;

pub use client::OhttpClient;
pub use config::{ConfigError, OrchestrationConfig};
pub use encapsulation::{
    EncapsulatedRequest, EncapsulatedResponse, Encapsulator, OhttpEncapsulator, SessionContext,
};
pub use error::{Error, ErrorKind, Stage};
pub use key_config::{fetch_key_config, PublicKeyConfig};
pub use message::{HeaderList, RequestDescriptor, ResponseDescriptor};
