// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

#[path = "reqwest.rs"]
pub mod implementation;

use bytes::Bytes;

pub use self::implementation::ApiClientCore as ApiClientCoreImpl;
use crate::error::HttpError;

#[async_trait::async_trait]
pub trait ApiClientCore {
    /// GET `url` when `body` is `None`, otherwise POST `body` with `content_type`.
    /// Any non-2xx status is an error.
    async fn raw_request(
        &self,
        url: &str,
        body: Option<Bytes>,
        content_type: &'static str,
        headers: &[(String, String)],
    ) -> Result<Bytes, HttpError>;
}

#[async_trait::async_trait]
impl ApiClientCore for ApiClientCoreImpl {
    async fn raw_request(
        &self,
        url: &str,
        body: Option<Bytes>,
        content_type: &'static str,
        headers: &[(String, String)],
    ) -> Result<Bytes, HttpError> {
        self.raw_request(url, body, content_type, headers).await
    }
}

pub mod test_utils {
    use super::*;

    use std::pin::Pin;

    type ResultFuture = dyn futures::Future<Output = Result<Bytes, HttpError>> + Send;
    type Responder = dyn (Fn(String, Option<Bytes>, String, Vec<(String, String)>) -> Pin<Box<ResultFuture>>)
        + Send
        + Sync;

    /// Mock `ApiClientCore` that holds a closure that can respond to requests with fake responses, or errors.
    ///
    /// ```rust
    /// use futures::FutureExt;
    ///
    /// use http_client::{BaseApiClient, HttpError};
    /// use http_client::test_utils::ApiClientCoreMock;
    ///
    /// let mock = ApiClientCoreMock::from(|url: String,
    ///                                   _body: Option<bytes::Bytes>,
    ///                                   _content_type: String,
    ///                                   _headers: Vec<(String, String)>| {
    ///     // note the `async { ... }.boxed()`!
    ///     async move {
    ///         if url.contains("coffee") {
    ///             Err(HttpError::StatusError {
    ///                 ctx: url,
    ///                 status: 418,
    ///                 body: "i'm a teapot".into(),
    ///             })
    ///         } else {
    ///             Ok("earl grey, hot".into())
    ///         }
    ///     }.boxed()
    /// });
    /// let client = BaseApiClient::from(mock);
    ///
    /// let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    /// rt.block_on(async {
    ///     client.bytes_get("example.com/tea").await.unwrap();
    ///     client.bytes_get("example.com/coffee").await.unwrap_err();
    /// });
    /// ```
    pub struct ApiClientCoreMock {
        responder: Box<Responder>,
    }

    #[async_trait::async_trait]
    impl ApiClientCore for ApiClientCoreMock {
        async fn raw_request(
            &self,
            url: &str,
            body: Option<Bytes>,
            content_type: &'static str,
            headers: &[(String, String)],
        ) -> Result<Bytes, HttpError> {
            (self.responder)(url.into(), body, content_type.into(), headers.into()).await
        }
    }

    impl<
            F: Fn(String, Option<Bytes>, String, Vec<(String, String)>) -> Pin<Box<ResultFuture>>
                + Send
                + Sync
                + 'static,
        > From<F> for ApiClientCoreMock
    {
        fn from(value: F) -> Self {
            Self {
                responder: Box::new(value),
            }
        }
    }
}
