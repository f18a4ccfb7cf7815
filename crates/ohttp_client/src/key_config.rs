// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gateway's published key configuration (RFC 9458, section 3) and how
//! to fetch it.

use std::fmt;

use bytes::{Buf, Bytes};
use http_client::BaseApiClient;
use tracing::debug;

use crate::error::{Error, Stage};
use crate::relay::OHTTP_KEYS_CONTENT_TYPE;

/// A HPKE KEM identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KemId(pub u16);

impl KemId {
    pub const P256_SHA256: KemId = KemId(0x0010);
    pub const P384_SHA384: KemId = KemId(0x0011);
    pub const P521_SHA512: KemId = KemId(0x0012);
    pub const X25519_SHA256: KemId = KemId(0x0020);
    pub const X448_SHA512: KemId = KemId(0x0021);

    /// Size of an encoded public key, if this KEM is known.
    pub fn public_key_len(self) -> Option<usize> {
        match self {
            Self::P256_SHA256 => Some(65),
            Self::P384_SHA384 => Some(97),
            Self::P521_SHA512 => Some(133),
            Self::X25519_SHA256 => Some(32),
            Self::X448_SHA512 => Some(56),
            _ => None,
        }
    }
}

impl fmt::Debug for KemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KemId({:#06x})", self.0)
    }
}

/// One (KDF, AEAD) pair the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymmetricSuite {
    pub kdf: u16,
    pub aead: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum KeyConfigError {
    #[error("key config is truncated")]
    Truncated,
    #[error("unknown KEM {0:?}")]
    UnknownKem(KemId),
    #[error("symmetric suite list length {0} is not a non-zero multiple of 4")]
    BadSuitesLength(usize),
    #[error("{0} unexpected bytes after key config")]
    TrailingBytes(usize),
    #[error("key config list has no entry with a known KEM")]
    NoUsableConfig,
}

/// A parsed key configuration.
///
/// Always parsed fresh from what the gateway serves; nothing here is cached.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyConfig {
    key_id: u8,
    kem: KemId,
    public_key: Bytes,
    suites: Vec<SymmetricSuite>,
    encoded: Bytes,
}

impl PublicKeyConfig {
    /// Parse either a single encoded key config, or an `application/ohttp-keys`
    /// list of length-prefixed configs. From a list, the first entry with a
    /// known KEM is used.
    pub fn parse(encoded: &[u8]) -> Result<Self, KeyConfigError> {
        let single_err = match Self::parse_single(encoded) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };
        match split_list(encoded) {
            Some(entries) => {
                for entry in entries {
                    match Self::parse_single(entry) {
                        Ok(config) => return Ok(config),
                        Err(KeyConfigError::UnknownKem(kem)) => {
                            debug!("skipping key config with unknown KEM {kem:?}");
                        }
                        Err(e) => return Err(e),
                    }
                }
                Err(KeyConfigError::NoUsableConfig)
            }
            None => Err(single_err),
        }
    }

    fn parse_single(encoded: &[u8]) -> Result<Self, KeyConfigError> {
        let mut buf = encoded;
        if buf.remaining() < 3 {
            return Err(KeyConfigError::Truncated);
        }
        let key_id = buf.get_u8();
        let kem = KemId(buf.get_u16());
        let pk_len = kem
            .public_key_len()
            .ok_or(KeyConfigError::UnknownKem(kem))?;
        if buf.remaining() < pk_len + 2 {
            return Err(KeyConfigError::Truncated);
        }
        let public_key = buf.copy_to_bytes(pk_len);

        let suites_len = usize::from(buf.get_u16());
        if suites_len == 0 || suites_len % 4 != 0 {
            return Err(KeyConfigError::BadSuitesLength(suites_len));
        }
        if buf.remaining() < suites_len {
            return Err(KeyConfigError::Truncated);
        }
        let suites = (0..suites_len / 4)
            .map(|_| SymmetricSuite {
                kdf: buf.get_u16(),
                aead: buf.get_u16(),
            })
            .collect();
        if buf.has_remaining() {
            return Err(KeyConfigError::TrailingBytes(buf.remaining()));
        }

        Ok(Self {
            key_id,
            kem,
            public_key,
            suites,
            encoded: Bytes::copy_from_slice(encoded),
        })
    }

    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    pub fn kem(&self) -> KemId {
        self.kem
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn suites(&self) -> &[SymmetricSuite] {
        &self.suites
    }

    /// The single config this was parsed from, in wire form.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}

impl fmt::Debug for PublicKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyConfig")
            .field("key_id", &self.key_id)
            .field("kem", &self.kem)
            .field("suites", &self.suites)
            .finish_non_exhaustive()
    }
}

/// Split a `u16`-length-prefixed list. `None` if the framing doesn't line up.
fn split_list(mut buf: &[u8]) -> Option<Vec<&[u8]>> {
    let mut entries = Vec::new();
    while !buf.is_empty() {
        if buf.len() < 2 {
            return None;
        }
        let len = usize::from(buf.get_u16());
        if len == 0 || buf.len() < len {
            return None;
        }
        let (entry, rest) = buf.split_at(len);
        entries.push(entry);
        buf = rest;
    }
    (!entries.is_empty()).then_some(entries)
}

/// Download and parse the key config at `url`. Exactly one attempt is made.
pub async fn fetch_key_config(
    client: &BaseApiClient,
    url: &str,
) -> Result<PublicKeyConfig, Error> {
    let accept = [("accept".to_owned(), OHTTP_KEYS_CONTENT_TYPE.to_owned())];
    let bytes = client
        .bytes_get_with_headers(url, &accept)
        .await
        .map_err(|e| Error::from_http(Stage::KeyFetch, e))?;
    debug!("fetched {} bytes of key config from {url}", bytes.len());
    PublicKeyConfig::parse(&bytes).map_err(|source| Error::KeyConfig { source })
}
