use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, error};

use super::Gateway;
use crate::config::ClientConfig;
use crate::errors::{ConfigError, FetchError, SendError};
use crate::models::{
    ConversationKey, ConversationSummary, SendAck, SendRequest, Thread, WireThread,
};

/// [`Gateway`] over the REST contract, authenticated with a bearer token.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let base_url = Url::parse(&config.api_base_url).map_err(|_| ConfigError::Invalid {
            name: "MESSAGING_API_BASE_URL",
            value: config.api_base_url.clone(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::Invalid {
                name: "MESSAGING_API_BASE_URL",
                value: config.api_base_url.clone(),
            });
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.auth_token))
            .map_err(|_| ConfigError::Invalid {
                name: "MESSAGING_AUTH_TOKEN",
                value: "<redacted>".to_string(),
            })?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Invalid {
                name: "MESSAGING_API_BASE_URL",
                value: e.to_string(),
            })?;

        Ok(Self { client, base_url })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, FetchError> {
        let url = self.endpoint(&["messages", "conversations"]);
        debug!("GET {url}");
        let resp = self.client.get(url).send().await.map_err(|e| {
            error!("Failed to fetch conversations: {e}");
            FetchError::transport(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        resp.json::<Vec<ConversationSummary>>()
            .await
            .map_err(FetchError::decode)
    }

    async fn fetch_thread(&self, key: &ConversationKey) -> Result<Thread, FetchError> {
        let url = self.endpoint(&["messages", "chat", &key.listing_id, &key.counterpart_id]);
        debug!("GET {url}");
        let resp = self.client.get(url).send().await.map_err(|e| {
            error!("Failed to fetch thread {key}: {e}");
            FetchError::transport(e)
        })?;

        let status = resp.status();
        // No conversation exists yet for this pair.
        if status == StatusCode::NOT_FOUND {
            debug!("No thread on record for {key}; treating as empty");
            return Ok(Thread::default());
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status { status: status.as_u16(), body });
        }

        let wire = resp.json::<WireThread>().await.map_err(FetchError::decode)?;
        Ok(wire.into())
    }

    async fn send_message(&self, request: &SendRequest) -> Result<(), SendError> {
        let url = self.endpoint(&["messages", "send"]);
        debug!("POST {url}");
        let resp = self.client.post(url).json(request).send().await.map_err(|e| {
            error!("Failed to send message to {}: {e}", request.receiver_id);
            SendError::transport(e)
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SendError::Rejected { status: status.as_u16(), body });
        }

        // The acknowledgement body is optional; an unparseable one still counts.
        if let Ok(ack) = resp.json::<SendAck>().await {
            debug!("Send acknowledged: {:?}", ack.status);
        }
        Ok(())
    }
}
