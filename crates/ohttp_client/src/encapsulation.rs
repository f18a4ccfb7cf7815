// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sealing binary requests for the target and opening its responses.
//!
//! The HPKE work is behind [`Encapsulator`] and [`ResponseOpener`], so the
//! orchestrator never depends on a particular engine. [`OhttpEncapsulator`]
//! is the default one, built on the `ohttp` crate.

use std::fmt;

use bytes::Bytes;
use tracing::debug;

use crate::key_config::PublicKeyConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum EncapsulationError {
    #[error("key config {key_id} is not usable: {source}")]
    InvalidConfig { key_id: u8, source: BoxError },
    #[error("sealing request: {source}")]
    Seal { source: BoxError },
}

#[derive(Debug, thiserror::Error)]
pub enum DecapsulationError {
    #[error("session context has already been used to open a response")]
    ContextConsumed,
    #[error("opening response: {source}")]
    Open { source: BoxError },
}

/// A sealed request, ready to be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedRequest(Bytes);

impl EncapsulatedRequest {
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Vec<u8>> for EncapsulatedRequest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl AsRef<[u8]> for EncapsulatedRequest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A sealed response, as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedResponse(Bytes);

impl From<Bytes> for EncapsulatedResponse {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncapsulatedResponse {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Engine-specific half of a session, able to open exactly one response.
pub trait ResponseOpener: Send {
    fn open(self: Box<Self>, response: &[u8]) -> Result<Vec<u8>, BoxError>;
}

/// Produces sealed requests and the [`SessionContext`] needed to read the reply.
pub trait Encapsulator: Send + Sync {
    /// Seal `request` for the holder of `config`'s private key. Every call must
    /// use fresh randomness.
    fn open_request(
        &self,
        config: &PublicKeyConfig,
        request: &[u8],
    ) -> Result<(EncapsulatedRequest, SessionContext), EncapsulationError>;
}

enum SessionState {
    Active(Box<dyn ResponseOpener>),
    Consumed,
}

/// Per-exchange state linking an [`EncapsulatedRequest`] to its response.
///
/// Single use: the first [`close_response`](Self::close_response) moves it to
/// the consumed state whether or not the response opens.
pub struct SessionContext {
    key_id: u8,
    state: SessionState,
}

impl SessionContext {
    pub fn new(key_id: u8, opener: Box<dyn ResponseOpener>) -> Self {
        Self {
            key_id,
            state: SessionState::Active(opener),
        }
    }

    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    pub fn is_consumed(&self) -> bool {
        matches!(self.state, SessionState::Consumed)
    }

    pub fn close_response(
        &mut self,
        response: &EncapsulatedResponse,
    ) -> Result<Bytes, DecapsulationError> {
        match std::mem::replace(&mut self.state, SessionState::Consumed) {
            SessionState::Active(opener) => opener
                .open(response.as_ref())
                .map(Bytes::from)
                .map_err(|source| DecapsulationError::Open { source }),
            SessionState::Consumed => Err(DecapsulationError::ContextConsumed),
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("key_id", &self.key_id)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// [`Encapsulator`] backed by the `ohttp` crate (HPKE via `rust-hpke`).
#[derive(Debug, Clone, Copy, Default)]
pub struct OhttpEncapsulator;

struct OhttpResponseOpener(ohttp::ClientResponse);

impl ResponseOpener for OhttpResponseOpener {
    fn open(self: Box<Self>, response: &[u8]) -> Result<Vec<u8>, BoxError> {
        Ok(self.0.decapsulate(response)?)
    }
}

impl Encapsulator for OhttpEncapsulator {
    fn open_request(
        &self,
        config: &PublicKeyConfig,
        request: &[u8],
    ) -> Result<(EncapsulatedRequest, SessionContext), EncapsulationError> {
        let key_id = config.key_id();
        let client = ohttp::ClientRequest::from_encoded_config(config.encoded()).map_err(|e| {
            EncapsulationError::InvalidConfig {
                key_id,
                source: Box::new(e),
            }
        })?;
        let (sealed, response) = client
            .encapsulate(request)
            .map_err(|e| EncapsulationError::Seal {
                source: Box::new(e),
            })?;
        debug!(
            "sealed {} byte request into {} bytes for key {key_id}",
            request.len(),
            sealed.len()
        );
        Ok((
            EncapsulatedRequest::from(sealed),
            SessionContext::new(key_id, Box::new(OhttpResponseOpener(response))),
        ))
    }
}
