use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::StubError;
use crate::models::{
    ConversationSummary, CounterpartProfile, SendRequest, WireMessage, WireThread,
};

#[derive(Debug, Clone)]
struct StubListing {
    title: String,
    image: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    listing_id: String,
    sender_id: String,
    receiver_id: String,
    body: String,
    timestamp: DateTime<Utc>,
    read: bool,
}

impl StoredMessage {
    fn involves(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }

    fn to_wire(&self) -> WireMessage {
        WireMessage {
            id: Some(self.id.clone()),
            message: self.body.clone(),
            timestamp: self.timestamp,
            sender_id: self.sender_id.clone(),
            receiver_id: self.receiver_id.clone(),
            listing_id: self.listing_id.clone(),
        }
    }
}

/// Users, listings and messages the development server starts with.
#[derive(Debug, Default)]
pub struct StubSeed {
    users: HashMap<String, CounterpartProfile>,
    listings: HashMap<String, StubListing>,
    messages: Vec<StoredMessage>,
}

impl StubSeed {
    pub fn user(mut self, id: &str, name: &str, reg_no: Option<&str>) -> Self {
        self.users.insert(id.to_string(), CounterpartProfile {
            id: id.to_string(),
            name: name.to_string(),
            avatar: None,
            reg_no: reg_no.map(str::to_string),
        });
        self
    }

    pub fn listing(mut self, id: &str, title: &str, image: Option<&str>) -> Self {
        self.listings.insert(id.to_string(), StubListing {
            title: title.to_string(),
            image: image.map(str::to_string),
        });
        self
    }

    pub fn message(
        mut self,
        listing_id: &str,
        sender_id: &str,
        receiver_id: &str,
        body: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        self.messages.push(StoredMessage {
            id: Uuid::new_v4().to_string(),
            listing_id: listing_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            body: body.to_string(),
            timestamp,
            read: false,
        });
        self
    }
}

/// In-memory backing store for the development gateway server.
#[derive(Clone, Default)]
pub struct StubStore {
    data: Arc<RwLock<StubSeed>>,
}

impl From<StubSeed> for StubStore {
    fn from(seed: StubSeed) -> Self {
        Self { data: Arc::new(RwLock::new(seed)) }
    }
}

impl StubStore {
    /// Two conversations for user `1`, one of them with unread messages.
    pub fn demo() -> Self {
        let ts = |s: &str| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_default()
        };
        StubSeed::default()
            .user("1", "Demo User", Some("RA2111003010001"))
            .user("2", "Priya Sharma", Some("RA2111003010123"))
            .user("3", "Rahul Kumar", Some("RA2111003010456"))
            .listing("101", "iPhone 12", Some("/placeholder.jpg"))
            .listing("102", "Engineering Mathematics textbook", None)
            .message(
                "101",
                "2",
                "1",
                "Hi! I'm interested in your iPhone 12.",
                ts("2024-01-25T10:00:00Z"),
            )
            .message(
                "101",
                "1",
                "2",
                "Hello! Yes, it's still available. Would you like to see it?",
                ts("2024-01-25T10:15:00Z"),
            )
            .message("101", "2", "1", "Is the phone still available?", ts("2024-01-25T10:30:00Z"))
            .message(
                "102",
                "3",
                "1",
                "When can I pick up the textbook?",
                ts("2024-01-24T14:00:00Z"),
            )
            .message(
                "102",
                "1",
                "3",
                "You can pick it up anytime after 3 PM today.",
                ts("2024-01-24T14:30:00Z"),
            )
            .message("102", "3", "1", "Thanks for the quick delivery!", ts("2024-01-24T15:45:00Z"))
            .into()
    }

    /// Every conversation `me` takes part in, unordered.
    pub async fn conversations(&self, me: &str) -> Vec<ConversationSummary> {
        let data = self.data.read().await;

        let mut latest: HashMap<(&str, &str), (&StoredMessage, u32)> = HashMap::new();
        for m in &data.messages {
            let other = if m.sender_id == me {
                m.receiver_id.as_str()
            } else if m.receiver_id == me {
                m.sender_id.as_str()
            } else {
                continue;
            };
            let unread = u32::from(m.receiver_id == me && !m.read);
            latest
                .entry((m.listing_id.as_str(), other))
                .and_modify(|(last, count)| {
                    if m.timestamp >= last.timestamp {
                        *last = m;
                    }
                    *count += unread;
                })
                .or_insert((m, unread));
        }

        latest
            .into_iter()
            .map(|((listing_id, other), (last, unread_count))| {
                let listing = data.listings.get(listing_id);
                ConversationSummary {
                    listing_id: listing_id.to_string(),
                    listing_title: listing
                        .map(|l| l.title.clone())
                        .unwrap_or_else(|| listing_id.to_string()),
                    listing_image: listing.and_then(|l| l.image.clone()),
                    other_user: profile_or_placeholder(&data.users, other),
                    last_message: last.body.clone(),
                    last_message_time: last.timestamp,
                    unread_count,
                }
            })
            .collect()
    }

    /// Messages between `me` and `other` about a listing. Reading the thread
    /// marks the messages `me` received as read.
    pub async fn thread(
        &self,
        me: &str,
        listing_id: &str,
        other: &str,
    ) -> Result<WireThread, StubError> {
        let mut data = self.data.write().await;
        if !data.listings.contains_key(listing_id) {
            return Err(StubError::ListingNotFound { id: listing_id.to_string() });
        }

        let mut messages = Vec::new();
        for m in data.messages.iter_mut() {
            if m.listing_id == listing_id && m.involves(me, other) {
                if m.receiver_id == me {
                    m.read = true;
                }
                messages.push(m.to_wire());
            }
        }
        messages.sort_by_key(|m| m.timestamp);

        Ok(WireThread { messages, other_user: data.users.get(other).cloned() })
    }

    pub async fn send(&self, me: &str, request: SendRequest) -> Result<(), StubError> {
        let body = request.message.trim();
        if body.is_empty() {
            return Err(StubError::EmptyField { field_name: "message".to_string() });
        }
        if request.receiver_id.trim().is_empty() {
            return Err(StubError::EmptyField { field_name: "receiver_id".to_string() });
        }
        if request.receiver_id == me {
            return Err(StubError::SelfMessage);
        }

        let mut data = self.data.write().await;
        if !data.listings.contains_key(&request.listing_id) {
            return Err(StubError::ListingNotFound { id: request.listing_id });
        }
        data.messages.push(StoredMessage {
            id: Uuid::new_v4().to_string(),
            listing_id: request.listing_id.clone(),
            sender_id: me.to_string(),
            receiver_id: request.receiver_id.clone(),
            body: body.to_string(),
            timestamp: Utc::now(),
            read: false,
        });
        info!(
            "Stored message from {me} to {} on listing {}",
            request.receiver_id, request.listing_id
        );
        Ok(())
    }
}

fn profile_or_placeholder(
    users: &HashMap<String, CounterpartProfile>,
    id: &str,
) -> CounterpartProfile {
    users.get(id).cloned().unwrap_or_else(|| CounterpartProfile {
        id: id.to_string(),
        name: id.to_string(),
        avatar: None,
        reg_no: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_conversations_for_seller() {
        let store = StubStore::demo();
        let mut convs = store.conversations("1").await;
        convs.sort_by(|a, b| a.listing_id.cmp(&b.listing_id));

        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].other_user.name, "Priya Sharma");
        assert_eq!(convs[0].last_message, "Is the phone still available?");
        assert_eq!(convs[0].unread_count, 2);
        assert_eq!(convs[0].listing_image.as_deref(), Some("/placeholder.jpg"));
        assert_eq!(convs[1].listing_title, "Engineering Mathematics textbook");
        assert_eq!(convs[1].listing_image, None);
    }

    #[tokio::test]
    async fn reading_a_thread_clears_its_unread_count() {
        let store = StubStore::demo();
        let thread = store.thread("1", "101", "2").await.unwrap();
        assert_eq!(thread.messages.len(), 3);
        assert_eq!(thread.other_user.unwrap().id, "2");

        let convs = store.conversations("1").await;
        let phone = convs.iter().find(|c| c.listing_id == "101").unwrap();
        assert_eq!(phone.unread_count, 0);
    }

    #[tokio::test]
    async fn new_pair_on_known_listing_is_empty() {
        let store = StubStore::demo();
        let thread = store.thread("3", "101", "1").await.unwrap();
        assert!(thread.messages.is_empty());
        assert_eq!(thread.other_user.unwrap().name, "Demo User");
    }

    #[tokio::test]
    async fn send_validates_and_stores() {
        let store = StubStore::demo();
        let request = |to: &str, listing: &str, body: &str| SendRequest {
            receiver_id: to.into(),
            listing_id: listing.into(),
            message: body.into(),
        };
        let blank = request("2", "101", "  ");
        assert!(store.send("1", blank).await.unwrap_err().is_validation());

        let to_self = request("1", "101", "hi");
        assert!(matches!(store.send("1", to_self).await, Err(StubError::SelfMessage)));

        let unknown = request("2", "999", "hi");
        assert!(store.send("1", unknown).await.unwrap_err().is_not_found());

        store.send("1", request("2", "101", "Still there?")).await.unwrap();
        let convs = store.conversations("2").await;
        assert_eq!(convs[0].last_message, "Still there?");
        assert_eq!(convs[0].unread_count, 2);
    }
}
