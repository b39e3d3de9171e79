use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::directory::ConversationDirectory;
use crate::errors::SendError;
use crate::gateway::Gateway;
use crate::models::{ConversationKey, DeliveryState, Message, MessageId, SendRequest};
use crate::thread::ThreadStore;

/// Writes outgoing messages: optimistic append first, network second.
pub struct Composer<G> {
    gateway: Arc<G>,
    threads: Arc<ThreadStore<G>>,
    directory: Arc<ConversationDirectory<G>>,
    user_id: String,
}

impl<G: Gateway> Composer<G> {
    pub fn new(
        gateway: Arc<G>,
        threads: Arc<ThreadStore<G>>,
        directory: Arc<ConversationDirectory<G>>,
        user_id: impl Into<String>,
    ) -> Self {
        Self { gateway, threads, directory, user_id: user_id.into() }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Appends a pending message to `key`'s thread and returns the request
    /// still to be issued. The message is visible as soon as this returns.
    pub fn compose(
        &self,
        key: Option<&ConversationKey>,
        body: &str,
    ) -> Result<PendingSend<G>, SendError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(SendError::EmptyBody);
        }
        let key = key.ok_or(SendError::NoActiveConversation)?;

        let message = Message::pending(key, &self.user_id, body.to_string());
        let id = message.id.clone();
        self.threads.append_local(key, message);
        debug!("Appended {id} to {key}");

        Ok(PendingSend {
            id,
            key: key.clone(),
            request: SendRequest::for_key(key, body),
            gateway: self.gateway.clone(),
            threads: self.threads.clone(),
            directory: self.directory.clone(),
        })
    }

    /// Fire-and-forget send. Rejected input is a silent no-op.
    pub fn send(
        &self,
        key: Option<&ConversationKey>,
        body: &str,
    ) -> Option<JoinHandle<Result<(), SendError>>> {
        match self.compose(key, body) {
            Ok(pending) => Some(tokio::spawn(pending.submit())),
            Err(e) => {
                debug!("Ignoring send: {e}");
                None
            }
        }
    }

    /// Sends a failed message's body again as a brand-new pending message.
    /// The failed instance is removed, never revived.
    pub fn retry(&self, id: &MessageId) -> Result<PendingSend<G>, SendError> {
        let failed = self
            .threads
            .take_failed(id)
            .ok_or_else(|| SendError::NotRetriable { id: id.to_string() })?;
        let key = ConversationKey::new(&failed.listing_id, &failed.receiver_id);
        info!("Retrying {id} in {key}");
        self.compose(Some(&key), &failed.body)
    }

    /// Drops a failed message from its thread.
    pub fn discard(&self, id: &MessageId) -> Result<Message, SendError> {
        self.threads
            .take_failed(id)
            .ok_or_else(|| SendError::NotRetriable { id: id.to_string() })
    }
}

/// An optimistically appended message whose request has not gone out yet.
pub struct PendingSend<G> {
    id: MessageId,
    key: ConversationKey,
    request: SendRequest,
    gateway: Arc<G>,
    threads: Arc<ThreadStore<G>>,
    directory: Arc<ConversationDirectory<G>>,
}

impl<G: Gateway> PendingSend<G> {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn key(&self) -> &ConversationKey {
        &self.key
    }

    /// Issues the request and settles the local message.
    ///
    /// The placeholder id stays the message's identity after confirmation
    /// since the acknowledgement carries none. A directory refresh follows a
    /// successful send; its failure is logged and otherwise ignored.
    pub async fn submit(self) -> Result<(), SendError> {
        match self.gateway.send_message(&self.request).await {
            Ok(()) => {
                self.threads.settle(&self.id, DeliveryState::Confirmed);
                info!("Message {} to {} confirmed", self.id, self.key);
                if let Err(e) = self.directory.refresh().await {
                    warn!("Directory refresh after send failed: {e}");
                }
                Ok(())
            }
            Err(e) => {
                error!("Message {} to {} failed: {e}", self.id, self.key);
                self.threads.settle(&self.id, DeliveryState::Failed);
                Err(e)
            }
        }
    }
}
