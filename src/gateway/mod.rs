//! The backend seam: everything the sync core needs from the REST API.

mod http;
#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;

pub use http::HttpGateway;

use crate::errors::{FetchError, SendError};
use crate::models::{ConversationKey, ConversationSummary, SendRequest, Thread};

/// Backend gateway used by the directory, thread store and composer.
///
/// Implementations are responsible for eventually resolving every call;
/// the core applies no timeouts of its own.
#[async_trait]
pub trait Gateway: Send + Sync + 'static {
    /// `GET /messages/conversations`, in whatever order the backend returns.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, FetchError>;

    /// `GET /messages/chat/{listingId}/{receiverId}`
    async fn fetch_thread(&self, key: &ConversationKey) -> Result<Thread, FetchError>;

    /// `POST /messages/send`. The acknowledgement carries no message id.
    async fn send_message(&self, request: &SendRequest) -> Result<(), SendError>;
}
