// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request never produced a response (DNS, connect, TLS, ...).
    #[error("while {ctx}: {source}")]
    RequestError {
        ctx: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// The server answered with a non-success status.
    #[error("while {ctx}: status {status}, body={body_text}", body_text = String::from_utf8_lossy(body))]
    StatusError {
        ctx: String,
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: Bytes,
    },
    /// The response headers arrived but the body could not be read to the end.
    #[error("while {ctx}, reading body: {source}")]
    ReadError {
        ctx: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl HttpError {
    /// The HTTP status code of the error, if the server got far enough to send one.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::StatusError { status, .. } => Some(*status),
            HttpError::RequestError { .. } | HttpError::ReadError { .. } => None,
        }
    }

    /// The raw body of a non-success response.
    pub fn body(&self) -> Option<&Bytes> {
        match self {
            HttpError::StatusError { body, .. } => Some(body),
            HttpError::RequestError { .. } | HttpError::ReadError { .. } => None,
        }
    }
}
