// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use http::Uri;
use serde::{Deserialize, Serialize};

/// Everything an [`OhttpClient`](crate::OhttpClient) needs to know up front.
///
/// Built once by the caller and never mutated while exchanges run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Where sealed requests are POSTed.
    pub gateway_url: String,
    /// Where the gateway's key configuration is downloaded from.
    pub key_config_url: String,
    /// Emit progress at `INFO` instead of `DEBUG`.
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} {url:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },
}

impl OrchestrationConfig {
    pub fn new(gateway_url: impl Into<String>, key_config_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            key_config_url: key_config_url.into(),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Both URLs must be absolute `http`/`https` URLs with a host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("gateway URL", &self.gateway_url)?;
        check_url("key config URL", &self.key_config_url)?;
        Ok(())
    }
}

fn check_url(field: &'static str, url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        url: url.to_owned(),
        reason,
    };
    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        Some(other) => return Err(invalid(format!("unsupported scheme {other:?}"))),
        None => return Err(invalid("missing scheme".into())),
    }
    if uri.authority().map_or(true, |a| a.host().is_empty()) {
        return Err(invalid("missing host".into()));
    }
    Ok(())
}
