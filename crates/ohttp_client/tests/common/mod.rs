// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use std::sync::Mutex;

use bytes::Bytes;
use futures::FutureExt;
use http::{header, HeaderValue, Method, StatusCode};
use http_client::test_utils::ApiClientCoreMock;
use http_client::{BaseApiClient, HttpError};
use ohttp::hpke::{Aead, Kdf, Kem};
use ohttp::{KeyConfig, Server, SymmetricSuite};

use ohttp_client::bhttp;
use ohttp_client::{RequestDescriptor, ResponseDescriptor};

pub const KEYS_URL: &str = "https://keys.test/ohttp-keys";
pub const GATEWAY_URL: &str = "https://gateway.test/gateway";

/// The gateway half of the protocol: holds the private key and answers
/// sealed requests with a caller-supplied handler.
pub struct TestGateway {
    server: Mutex<Server>,
    key_config: Bytes,
}

impl TestGateway {
    pub fn new(key_id: u8) -> Self {
        let config = KeyConfig::new(
            key_id,
            Kem::X25519Sha256,
            vec![SymmetricSuite::new(Kdf::HkdfSha256, Aead::Aes128Gcm)],
        )
        .unwrap();
        let key_config = Bytes::from(config.encode().unwrap());
        Self {
            server: Mutex::new(Server::new(config).unwrap()),
            key_config,
        }
    }

    /// The public key config, as a single encoded config.
    pub fn key_config(&self) -> Bytes {
        self.key_config.clone()
    }

    /// Open a sealed request, run `handler` on it, and seal the reply.
    pub fn handle(
        &self,
        sealed: &[u8],
        handler: impl FnOnce(RequestDescriptor) -> ResponseDescriptor,
    ) -> Bytes {
        let (plaintext, response_context) = self.server.lock().unwrap().decapsulate(sealed).unwrap();
        let request = bhttp::decode_request(&plaintext).unwrap();
        let response = bhttp::encode_response(&handler(request)).unwrap();
        Bytes::from(response_context.encapsulate(&response).unwrap())
    }
}

/// Stands in for `https://example.com/`: answers `GET /` with `hello`.
pub fn hello_target(request: RequestDescriptor) -> ResponseDescriptor {
    assert_eq!(request.method(), Method::GET);
    assert_eq!(request.url().host(), Some("example.com"));
    assert_eq!(request.url().path(), "/");
    assert_eq!(
        request.headers().get("accept"),
        Some(&HeaderValue::from_static("text/plain"))
    );
    ResponseDescriptor::new(StatusCode::OK)
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .body("hello")
}

pub fn hello_request() -> RequestDescriptor {
    RequestDescriptor::get("https://example.com/".parse().unwrap())
        .header(header::ACCEPT, HeaderValue::from_static("text/plain"))
}

/// A `BaseApiClient` whose every request is answered synchronously by `respond`,
/// given the url, the body (for POSTs) and the content type.
pub fn mock_client<F>(respond: F) -> BaseApiClient
where
    F: Fn(String, Option<Bytes>, String) -> Result<Bytes, HttpError> + Send + Sync + 'static,
{
    BaseApiClient::from(ApiClientCoreMock::from(
        move |url: String,
              body: Option<Bytes>,
              content_type: String,
              _headers: Vec<(String, String)>| {
            let result = respond(url, body, content_type);
            async move { result }.boxed()
        },
    ))
}

pub fn status_error(url: &str, status: u16, body: &'static str) -> HttpError {
    HttpError::StatusError {
        ctx: format!("requesting {url}"),
        status,
        body: Bytes::from_static(body.as_bytes()),
    }
}
