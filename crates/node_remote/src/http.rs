//! reqwest-backed client factory.
//!
//! Any [`HttpCapability`] is built from an [`HttpChannel`] bound to the node's
//! base URL and the forwarded credential. One `reqwest::Client` (and its
//! connection pool) is shared by every channel the factory hands out.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use node_registry::Node;

use crate::call::{PendingCall, RemoteResponse, TransportError};
use crate::capability::{BuildError, Capability, ClientFactory};
use crate::credential::Credential;

/// A capability that talks HTTP through a channel.
pub trait HttpCapability: Capability {
    fn from_channel(channel: HttpChannel) -> Self;
}

#[derive(Clone)]
pub struct HttpChannel {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl HttpChannel {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Build a deferred `GET {base_url}{path}` decoding a JSON body.
    pub fn get_json<T>(&self, path: &str) -> PendingCall<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(value) = self.credential.as_header_value() {
            request = request.header(AUTHORIZATION, value);
        }
        PendingCall::new(url, execute_json(request))
    }
}

async fn execute_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<RemoteResponse<T>, TransportError> {
    let resp = request.send().await?;
    let status = resp.status();

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("unknown status").to_string()
        } else {
            body
        };
        return Ok(RemoteResponse::Failure {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = resp.bytes().await?;
    let payload = serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))?;
    Ok(RemoteResponse::Success(payload))
}

pub struct HttpClientFactory {
    client: Client,
}

impl HttpClientFactory {
    /// `timeout` bounds each request end to end; `None` leaves it to the OS.
    pub fn new(timeout: Option<Duration>) -> Result<Self, BuildError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl<C: HttpCapability> ClientFactory<C> for HttpClientFactory {
    fn build(&self, node: &Node, credential: &Credential) -> Result<C, BuildError> {
        let base_url = node.base_url();
        if let Err(e) = reqwest::Url::parse(&base_url) {
            return Err(BuildError::InvalidEndpoint {
                endpoint: base_url,
                reason: e.to_string(),
            });
        }
        Ok(C::from_channel(HttpChannel {
            client: self.client.clone(),
            base_url,
            credential: credential.clone(),
        }))
    }
}
