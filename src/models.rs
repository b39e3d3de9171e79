use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one message thread: a listing plus the other participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub listing_id: String,
    pub counterpart_id: String,
}

impl ConversationKey {
    pub fn new(listing_id: impl Into<String>, counterpart_id: impl Into<String>) -> Self {
        Self { listing_id: listing_id.into(), counterpart_id: counterpart_id.into() }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.listing_id, self.counterpart_id)
    }
}

/// Matches the backend `other_user` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub reg_no: Option<String>,
}

/// One row of `GET /messages/conversations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub listing_id: String,
    pub listing_title: String,
    #[serde(default)]
    pub listing_image: Option<String>,
    pub other_user: CounterpartProfile,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    #[serde(default)]
    pub unread_count: u32,
}

impl ConversationSummary {
    pub fn key(&self) -> ConversationKey {
        ConversationKey::new(&self.listing_id, &self.other_user.id)
    }
}

/// Server-assigned identity, or a placeholder minted by the composer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    Server(String),
    Local(uuid::Uuid),
}

impl MessageId {
    pub fn local() -> Self {
        MessageId::Local(uuid::Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MessageId::Local(_))
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageId::Server(id) => f.write_str(id),
            MessageId::Local(id) => write!(f, "local-{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Confirmed,
    Failed,
}

impl DeliveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryState::Pending => "pending",
            DeliveryState::Confirmed => "confirmed",
            DeliveryState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub listing_id: String,
    pub body: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub timestamp: DateTime<Utc>,
    pub delivery: DeliveryState,
}

impl Message {
    /// A locally composed message, stamped now and awaiting the gateway.
    pub fn pending(key: &ConversationKey, sender_id: &str, body: String) -> Self {
        Self {
            id: MessageId::local(),
            listing_id: key.listing_id.clone(),
            body,
            sender_id: sender_id.to_string(),
            receiver_id: key.counterpart_id.clone(),
            timestamp: Utc::now(),
            delivery: DeliveryState::Pending,
        }
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id == user_id
    }

    /// Same sender, listing and body, stamped within `window` of each other.
    ///
    /// Send acknowledgements carry no canonical id, so this is the only way
    /// to recognise a locally composed message once the backend echoes it.
    pub fn is_duplicate_of(&self, other: &Message, window: Duration) -> bool {
        let gap = self.timestamp - other.timestamp;
        self.sender_id == other.sender_id
            && self.listing_id == other.listing_id
            && self.body == other.body
            && gap <= window
            && -gap <= window
    }
}

/// Messages plus counterpart for one conversation, as fetched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Thread {
    pub messages: Vec<Message>,
    /// Absent for a conversation the backend has no record of yet.
    pub counterpart: Option<CounterpartProfile>,
}

/// Body of `POST /messages/send`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendRequest {
    pub receiver_id: String,
    pub listing_id: String,
    pub message: String,
}

impl SendRequest {
    pub fn for_key(key: &ConversationKey, body: &str) -> Self {
        Self {
            receiver_id: key.counterpart_id.clone(),
            listing_id: key.listing_id.clone(),
            message: body.to_string(),
        }
    }
}

// ── Wire shapes ───────────────────────────────────────────────────────────────

/// One message in `GET /messages/chat/{listingId}/{receiverId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub sender_id: String,
    pub receiver_id: String,
    pub listing_id: String,
}

impl WireMessage {
    /// Fetched messages are confirmed by definition. The contract does not
    /// promise an id, so one is derived from position when it is missing.
    pub fn into_message(self, index: usize) -> Message {
        let id = self.id.unwrap_or_else(|| {
            format!("{}:{}:{}", self.listing_id, self.timestamp.timestamp_millis(), index)
        });
        Message {
            id: MessageId::Server(id),
            listing_id: self.listing_id,
            body: self.message,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            timestamp: self.timestamp,
            delivery: DeliveryState::Confirmed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireThread {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub other_user: Option<CounterpartProfile>,
}

impl From<WireThread> for Thread {
    fn from(wire: WireThread) -> Self {
        Thread {
            messages: wire
                .messages
                .into_iter()
                .enumerate()
                .map(|(i, m)| m.into_message(i))
                .collect(),
            counterpart: wire.other_user,
        }
    }
}

/// Acknowledgement of `POST /messages/send`. Fields are informational only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendAck {
    #[serde(default)]
    pub status: Option<String>,
}
