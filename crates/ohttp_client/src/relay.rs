// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use http_client::BaseApiClient;
use tracing::debug;

use crate::encapsulation::{EncapsulatedRequest, EncapsulatedResponse};
use crate::error::{Error, Stage};

pub const OHTTP_REQUEST_CONTENT_TYPE: &str = "message/ohttp-req";
pub const OHTTP_RESPONSE_CONTENT_TYPE: &str = "message/ohttp-res";
pub const OHTTP_KEYS_CONTENT_TYPE: &str = "application/ohttp-keys";

/// POST a sealed request to the gateway and return its sealed reply.
///
/// One attempt only. A non-2xx status surfaces as [`Error::UpstreamStatus`]
/// with the gateway's body attached.
pub async fn relay(
    client: &BaseApiClient,
    gateway_url: &str,
    request: EncapsulatedRequest,
) -> Result<EncapsulatedResponse, Error> {
    let accept = [(
        "accept".to_owned(),
        OHTTP_RESPONSE_CONTENT_TYPE.to_owned(),
    )];
    let response = client
        .bytes_bytes_post_with_headers(
            gateway_url,
            request.into_bytes(),
            OHTTP_REQUEST_CONTENT_TYPE,
            &accept,
        )
        .await
        .map_err(|e| Error::from_http(Stage::Relay, e))?;
    debug!("gateway returned {} bytes", response.len());
    Ok(response.into())
}
