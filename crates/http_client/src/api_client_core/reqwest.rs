// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use bytes::Bytes;
use tracing::debug;

use crate::error::HttpError;

#[derive(Debug, Clone)]
pub struct ApiClientCore {
    client: reqwest::Client, // cheaply cloneable (Arc<...> internally), see docs
}

impl ApiClientCore {
    pub fn new() -> Self {
        Self {
            client: reqwest::ClientBuilder::new()
                .build()
                .unwrap(), // this only fails if the system config is messed up, isn't recoverable
        }
    }

    /// Wrap an already configured `reqwest::Client` (proxies, timeouts, root certificates...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get or post a given body to a given url with a given content type, and optional extra headers.
    pub(crate) async fn raw_request(
        &self,
        url: &str,
        body: Option<Bytes>,
        content_type: &'static str,
        header_iter: &[(String, String)],
    ) -> Result<Bytes, HttpError> {
        let (verb, mut rb) = match body {
            Some(b) => (
                "posting",
                self.client
                    .post(url)
                    .body(b)
                    .header(reqwest::header::CONTENT_TYPE, content_type),
            ),
            None => ("requesting", self.client.get(url)),
        };

        for (key, value) in header_iter {
            rb = rb.header(key, value)
        }

        debug!("http_client: {verb} {url}");

        let response = rb.send().await.map_err(|e| HttpError::RequestError {
            ctx: format!("{verb} {url}"),
            source: Box::new(e),
        })?;

        let status = response.status();
        debug!("http_client: response from {url:?}: {status}");

        if !status.is_success() {
            // the body is only diagnostic here, so a failed read leaves it empty
            let body = response.bytes().await.unwrap_or_default();
            return Err(HttpError::StatusError {
                ctx: format!("{verb} {url}"),
                status: status.as_u16(),
                body,
            });
        }

        response.bytes().await.map_err(|e| HttpError::ReadError {
            ctx: format!("{verb} {url}"),
            source: Box::new(e),
        })
    }
}

impl Default for ApiClientCore {
    fn default() -> Self {
        Self::new()
    }
}
