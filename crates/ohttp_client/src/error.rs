// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;

use bytes::Bytes;
use http_client::HttpError;

use crate::bhttp::{DecodeError, EncodeError};
use crate::encapsulation::{DecapsulationError, EncapsulationError};
use crate::key_config::KeyConfigError;

/// The pipeline step that was running when an exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    KeyFetch,
    EncodeRequest,
    EncapsulateRequest,
    Relay,
    DecapsulateResponse,
    DecodeResponse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::KeyFetch => "fetching key config",
            Stage::EncodeRequest => "encoding request",
            Stage::EncapsulateRequest => "encapsulating request",
            Stage::Relay => "relaying through gateway",
            Stage::DecapsulateResponse => "decapsulating response",
            Stage::DecodeResponse => "decoding response",
        })
    }
}

/// Coarse classification of an [`Error`], independent of the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    UpstreamStatus,
    Read,
    Decode,
    Encode,
    Encapsulation,
    Decapsulation,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{stage}: {source}")]
    Transport { stage: Stage, source: HttpError },
    #[error("{stage}: {ctx}: upstream status {status}, body={body_text}", body_text = String::from_utf8_lossy(body))]
    UpstreamStatus {
        stage: Stage,
        ctx: String,
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: Bytes,
    },
    #[error("{stage}: {source}")]
    Read { stage: Stage, source: HttpError },
    #[error("{}: parsing key config: {source}", Stage::KeyFetch)]
    KeyConfig { source: KeyConfigError },
    #[error("{}: {source}", Stage::EncodeRequest)]
    Encode { source: EncodeError },
    #[error("{}: {source}", Stage::EncapsulateRequest)]
    Encapsulation { source: EncapsulationError },
    #[error("{}: {source}", Stage::DecapsulateResponse)]
    Decapsulation { source: DecapsulationError },
    #[error("{}: {source}", Stage::DecodeResponse)]
    Decode { source: DecodeError },
}

impl Error {
    /// Sort a transport failure into transport, status and read errors.
    pub(crate) fn from_http(stage: Stage, error: HttpError) -> Self {
        match error {
            HttpError::StatusError { ctx, status, body } => Error::UpstreamStatus {
                stage,
                ctx,
                status,
                body,
            },
            e @ HttpError::ReadError { .. } => Error::Read { stage, source: e },
            e @ HttpError::RequestError { .. } => Error::Transport { stage, source: e },
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Error::Transport { stage, .. }
            | Error::UpstreamStatus { stage, .. }
            | Error::Read { stage, .. } => *stage,
            Error::KeyConfig { .. } => Stage::KeyFetch,
            Error::Encode { .. } => Stage::EncodeRequest,
            Error::Encapsulation { .. } => Stage::EncapsulateRequest,
            Error::Decapsulation { .. } => Stage::DecapsulateResponse,
            Error::Decode { .. } => Stage::DecodeResponse,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } => ErrorKind::Transport,
            Error::UpstreamStatus { .. } => ErrorKind::UpstreamStatus,
            Error::Read { .. } => ErrorKind::Read,
            Error::KeyConfig { .. } | Error::Decode { .. } => ErrorKind::Decode,
            Error::Encode { .. } => ErrorKind::Encode,
            Error::Encapsulation { .. } => ErrorKind::Encapsulation,
            Error::Decapsulation { .. } => ErrorKind::Decapsulation,
        }
    }

    /// The outer HTTP status, for errors caused by a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_are_sorted_by_kind() {
        let status = Error::from_http(
            Stage::Relay,
            HttpError::StatusError {
                ctx: "posting http://gateway.test/".into(),
                status: 500,
                body: Bytes::from_static(b"gateway overloaded"),
            },
        );
        assert_eq!(status.kind(), ErrorKind::UpstreamStatus);
        assert_eq!(status.stage(), Stage::Relay);
        assert_eq!(status.status(), Some(500));
        assert_eq!(
            status.to_string(),
            "relaying through gateway: posting http://gateway.test/: upstream status 500, body=gateway overloaded"
        );

        let transport = Error::from_http(
            Stage::KeyFetch,
            HttpError::RequestError {
                ctx: "requesting http://keys.test/".into(),
                source: "connection refused".into(),
            },
        );
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert_eq!(transport.status(), None);

        let read = Error::from_http(
            Stage::Relay,
            HttpError::ReadError {
                ctx: "posting http://gateway.test/".into(),
                source: "connection reset".into(),
            },
        );
        assert_eq!(read.kind(), ErrorKind::Read);
    }

    #[test]
    fn local_errors_know_their_stage() {
        let err = Error::KeyConfig {
            source: KeyConfigError::Truncated,
        };
        assert_eq!(err.stage(), Stage::KeyFetch);
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(
            err.to_string(),
            "fetching key config: parsing key config: key config is truncated"
        );

        let err = Error::Decapsulation {
            source: DecapsulationError::ContextConsumed,
        };
        assert_eq!(err.stage(), Stage::DecapsulateResponse);
        assert_eq!(err.kind(), ErrorKind::Decapsulation);
    }
}
