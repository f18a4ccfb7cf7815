// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::api_client_core::{ApiClientCore, ApiClientCoreImpl};
use crate::error::HttpError;

/// Helper for talking to key-config hosts and OHTTP gateways
#[derive(Clone)]
pub struct BaseApiClient {
    // 99% of the time this is going to be ApiClientCoreImpl, but it's overrideable for mocking purposes
    core: Arc<dyn ApiClientCore + Send + Sync>,
}

impl<Core: ApiClientCore + Send + Sync + 'static> From<Core> for BaseApiClient {
    fn from(core: Core) -> Self {
        Self {
            core: Arc::new(core),
        }
    }
}

impl BaseApiClient {
    /// Construct a new ApiClient backed by a default `reqwest::Client`.
    pub fn new() -> Self {
        ApiClientCoreImpl::new().into()
    }

    /// Construct a new ApiClient around a preconfigured `reqwest::Client`.
    pub fn with_reqwest(client: reqwest::Client) -> Self {
        ApiClientCoreImpl::with_client(client).into()
    }

    /// Get bytes. Returns error for non-2xx status.
    pub async fn bytes_get(&self, url: &str) -> Result<Bytes, HttpError> {
        self.bytes_get_with_headers(url, &[]).await
    }

    /// Get bytes (with custom headers). Returns error for non-2xx status.
    pub async fn bytes_get_with_headers(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Bytes, HttpError> {
        self.core.raw_request(url, None, "", headers).await
    }

    /// Post bytes, get bytes. Bring your own content-type. Returns error for non-2xx status.
    pub async fn bytes_bytes_post(
        &self,
        url: &str,
        body: Bytes,
        content_type: &'static str,
    ) -> Result<Bytes, HttpError> {
        self.bytes_bytes_post_with_headers(url, body, content_type, &[])
            .await
    }

    /// Post bytes, get bytes (with custom headers). Returns error for non-2xx status.
    pub async fn bytes_bytes_post_with_headers(
        &self,
        url: &str,
        body: Bytes,
        content_type: &'static str,
        headers: &[(String, String)],
    ) -> Result<Bytes, HttpError> {
        self.core
            .raw_request(url, Some(body), content_type, headers)
            .await
    }
}

impl Default for BaseApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BaseApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseApiClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;
    use crate::test_utils::ApiClientCoreMock;

    #[tokio::test]
    async fn post_passes_content_type_and_body_through() {
        let mock = ApiClientCoreMock::from(
            |url: String,
             body: Option<Bytes>,
             content_type: String,
             _headers: Vec<(String, String)>| {
                async move {
                    assert_eq!(url, "http://gateway.test/relay");
                    assert_eq!(content_type, "message/ohttp-req");
                    Ok::<_, HttpError>(body.expect("post should carry a body"))
                }
                .boxed()
            },
        );
        let client = BaseApiClient::from(mock);

        let echoed = client
            .bytes_bytes_post(
                "http://gateway.test/relay",
                Bytes::from_static(b"sealed"),
                "message/ohttp-req",
            )
            .await
            .unwrap();
        assert_eq!(&echoed[..], b"sealed");
    }

    #[tokio::test]
    async fn get_sends_no_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mock = ApiClientCoreMock::from(
            move |_url: String,
                  body: Option<Bytes>,
                  _content_type: String,
                  _headers: Vec<(String, String)>| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    assert!(body.is_none());
                    Ok::<_, HttpError>(Bytes::from_static(b"keys"))
                }
                .boxed()
            },
        );
        let client = BaseApiClient::from(mock);

        assert_eq!(&client.bytes_get("http://keys.test/").await.unwrap()[..], b"keys");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn get_passes_headers_through() {
        let mock = ApiClientCoreMock::from(
            |_url: String,
             _body: Option<Bytes>,
             _content_type: String,
             headers: Vec<(String, String)>| {
                async move {
                    assert_eq!(headers, [("accept".to_owned(), "application/ohttp-keys".to_owned())]);
                    Ok::<_, HttpError>(Bytes::new())
                }
                .boxed()
            },
        );
        let client = BaseApiClient::from(mock);

        client
            .bytes_get_with_headers(
                "http://keys.test/",
                &[("accept".into(), "application/ohttp-keys".into())],
            )
            .await
            .unwrap();
    }
}
