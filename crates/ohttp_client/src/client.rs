// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt;
use std::sync::Arc;

use http_client::BaseApiClient;
use tracing::{debug, info, trace};

use crate::bhttp;
use crate::config::{ConfigError, OrchestrationConfig};
use crate::encapsulation::{Encapsulator, OhttpEncapsulator};
use crate::error::{Error, Stage};
use crate::key_config::fetch_key_config;
use crate::message::{RequestDescriptor, ResponseDescriptor};
use crate::relay::relay;

/// Where a single exchange has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExchangeState {
    Init,
    KeyFetched,
    RequestEncoded,
    RequestEncapsulated,
    Relayed,
    ResponseDecapsulated,
    ResponseDecoded,
    Aborted(Stage),
}

impl ExchangeState {
    fn is_terminal(self) -> bool {
        matches!(self, Self::ResponseDecoded | Self::Aborted(_))
    }
}

struct Exchange {
    state: ExchangeState,
}

impl Exchange {
    fn new() -> Self {
        Self {
            state: ExchangeState::Init,
        }
    }

    fn advance(&mut self, next: ExchangeState) {
        debug_assert!(!self.state.is_terminal());
        trace!("exchange: {:?} -> {next:?}", self.state);
        self.state = next;
    }

    fn abort(&mut self, stage: Stage) {
        self.advance(ExchangeState::Aborted(stage));
    }
}

/// Sends HTTP requests to a target through an OHTTP gateway.
///
/// Holds no per-exchange state, so one client can be shared between tasks;
/// every [`send`](Self::send) fetches its own key config and session.
#[derive(Clone)]
pub struct OhttpClient {
    config: OrchestrationConfig,
    api_client: BaseApiClient,
    encapsulator: Arc<dyn Encapsulator>,
}

impl OhttpClient {
    /// A client using `reqwest` for transport and the `ohttp` crate for HPKE.
    pub fn new(config: OrchestrationConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, BaseApiClient::new(), Arc::new(OhttpEncapsulator))
    }

    pub fn with_parts(
        config: OrchestrationConfig,
        api_client: BaseApiClient,
        encapsulator: Arc<dyn Encapsulator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            api_client,
            encapsulator,
        })
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Run one full exchange. The first stage to fail ends it, and the error
    /// says which stage that was.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, Error> {
        self.exchange(request).await.1
    }

    async fn exchange(
        &self,
        request: &RequestDescriptor,
    ) -> (ExchangeState, Result<ResponseDescriptor, Error>) {
        let mut exchange = Exchange::new();
        let result = self.run(&mut exchange, request).await;
        if let Err(err) = &result {
            debug!("exchange aborted: {err}");
            exchange.abort(err.stage());
        }
        (exchange.state, result)
    }

    async fn run(
        &self,
        exchange: &mut Exchange,
        request: &RequestDescriptor,
    ) -> Result<ResponseDescriptor, Error> {
        self.progress(format_args!("Gateway URL: {}", self.config.gateway_url));
        self.progress(format_args!("Target URL: {}", request.url()));
        self.progress(format_args!("Keys URL: {}", self.config.key_config_url));

        self.progress(format_args!("Downloading OHTTP key config"));
        let key_config = fetch_key_config(&self.api_client, &self.config.key_config_url).await?;
        debug!("using {key_config:?}");
        self.progress(format_args!("Successfully parsed key config."));
        exchange.advance(ExchangeState::KeyFetched);

        let encoded = bhttp::encode_request(request).map_err(|source| Error::Encode { source })?;
        self.progress(format_args!("Created BHTTP inner request."));
        exchange.advance(ExchangeState::RequestEncoded);

        let (sealed, mut session) = self
            .encapsulator
            .open_request(&key_config, &encoded)
            .map_err(|source| Error::Encapsulation { source })?;
        self.progress(format_args!("Successfully encapsulated OHTTP request."));
        exchange.advance(ExchangeState::RequestEncapsulated);

        let sealed_response = relay(&self.api_client, &self.config.gateway_url, sealed).await?;
        exchange.advance(ExchangeState::Relayed);

        let plaintext = session
            .close_response(&sealed_response)
            .map_err(|source| Error::Decapsulation { source })?;
        self.progress(format_args!("Successfully decrypted response!"));
        exchange.advance(ExchangeState::ResponseDecapsulated);

        let response =
            bhttp::decode_response(&plaintext).map_err(|source| Error::Decode { source })?;
        exchange.advance(ExchangeState::ResponseDecoded);
        Ok(response)
    }

    fn progress(&self, message: fmt::Arguments<'_>) {
        if self.config.verbose {
            info!("{message}");
        } else {
            debug!("{message}");
        }
    }
}

impl fmt::Debug for OhttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OhttpClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
