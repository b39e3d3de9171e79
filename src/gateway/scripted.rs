//! A gateway whose calls are answered by the test, one at a time.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::Gateway;
use crate::errors::{FetchError, SendError};
use crate::models::{ConversationKey, ConversationSummary, SendRequest, Thread};

pub(crate) enum Call {
    Conversations(oneshot::Sender<Result<Vec<ConversationSummary>, FetchError>>),
    Thread(ConversationKey, oneshot::Sender<Result<Thread, FetchError>>),
    Send(SendRequest, oneshot::Sender<Result<(), SendError>>),
}

pub(crate) struct ScriptedGateway {
    calls: mpsc::UnboundedSender<Call>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> (Self, Calls) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { calls: tx }, Calls { rx })
    }
}

fn hung_up() -> String {
    "scripted responder dropped".to_string()
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, FetchError> {
        let (tx, rx) = oneshot::channel();
        let _ = self.calls.send(Call::Conversations(tx));
        rx.await.unwrap_or_else(|_| Err(FetchError::Transport { message: hung_up() }))
    }

    async fn fetch_thread(&self, key: &ConversationKey) -> Result<Thread, FetchError> {
        let (tx, rx) = oneshot::channel();
        let _ = self.calls.send(Call::Thread(key.clone(), tx));
        rx.await.unwrap_or_else(|_| Err(FetchError::Transport { message: hung_up() }))
    }

    async fn send_message(&self, request: &SendRequest) -> Result<(), SendError> {
        let (tx, rx) = oneshot::channel();
        let _ = self.calls.send(Call::Send(request.clone(), tx));
        rx.await.unwrap_or_else(|_| Err(SendError::Transport { message: hung_up() }))
    }
}

/// The test's end: receives calls in the order they were issued.
pub(crate) struct Calls {
    rx: mpsc::UnboundedReceiver<Call>,
}

impl Calls {
    pub(crate) async fn next(&mut self) -> Call {
        self.rx.recv().await.expect("gateway dropped")
    }

    pub(crate) async fn conversations(
        &mut self,
    ) -> oneshot::Sender<Result<Vec<ConversationSummary>, FetchError>> {
        match self.next().await {
            Call::Conversations(reply) => reply,
            _ => panic!("expected a conversations call"),
        }
    }

    pub(crate) async fn thread(
        &mut self,
    ) -> (ConversationKey, oneshot::Sender<Result<Thread, FetchError>>) {
        match self.next().await {
            Call::Thread(key, reply) => (key, reply),
            _ => panic!("expected a thread call"),
        }
    }

    pub(crate) async fn send(&mut self) -> (SendRequest, oneshot::Sender<Result<(), SendError>>) {
        match self.next().await {
            Call::Send(request, reply) => (request, reply),
            _ => panic!("expected a send call"),
        }
    }

    /// True when no call is waiting right now.
    pub(crate) fn is_idle(&mut self) -> bool {
        self.rx.try_recv().is_err()
    }
}
