use std::env;
use std::fmt::{self, Debug};
use std::time::Duration;

use reqwest::Client;

use crate::{DeepSeekClient, Error};

/// Scheme used when none is configured.
pub const DEFAULT_SCHEME: &str = "https";
/// Host of the public DeepSeek endpoint.
pub const DEFAULT_HOST: &str = "api.deepseek.com";
/// Timeout of the transport created when none is supplied.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`DeepSeekClient`].
#[derive(Clone)]
pub struct ClientBuilder {
    api_key: String,
    scheme: Option<String>,
    host: Option<String>,
    http_client: Option<Client>,
}

impl ClientBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            scheme: None,
            host: None,
            http_client: None,
        }
    }

    /// Creates a builder from `DEEPSEEK_API_KEY` and the optional
    /// `DEEPSEEK_SCHEME` and `DEEPSEEK_HOST` variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let Some(api_key) = lookup("DEEPSEEK_API_KEY") else {
            return Err(Error::InvalidConfig(
                "DEEPSEEK_API_KEY is not set".to_owned(),
            ));
        };
        let mut builder = Self::with_api_key(api_key);
        builder.scheme = lookup("DEEPSEEK_SCHEME").filter(|v| !v.is_empty());
        builder.host = lookup("DEEPSEEK_HOST").filter(|v| !v.is_empty());
        Ok(builder)
    }

    /// Sets the protocol scheme and the host (optionally with a port).
    ///
    /// An empty value keeps the corresponding default.
    #[inline]
    pub fn with_endpoint<S: Into<String>, H: Into<String>>(
        mut self,
        scheme: S,
        host: H,
    ) -> Self {
        self.scheme = Some(scheme.into());
        self.host = Some(host.into());
        self
    }

    /// Sets the transport. Its pool, TLS and timeout settings are used
    /// as is.
    #[inline]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Builds the client.
    ///
    /// Fails if the API key is empty, or if the default transport cannot
    /// be created.
    pub fn build(self) -> Result<DeepSeekClient, Error> {
        if self.api_key.is_empty() {
            return Err(Error::InvalidConfig("API key is empty".to_owned()));
        }
        let http_client = match self.http_client {
            Some(http_client) => http_client,
            None => Client::builder().timeout(DEFAULT_TIMEOUT).build()?,
        };
        Ok(DeepSeekClient::from_parts(
            non_empty_or(self.scheme, DEFAULT_SCHEME),
            non_empty_or(self.host, DEFAULT_HOST),
            self.api_key,
            http_client,
        ))
    }
}

impl Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api_key", &"<redacted>")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

#[inline]
fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}
