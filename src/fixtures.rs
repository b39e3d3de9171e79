//! Builders shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{
    ConversationSummary, CounterpartProfile, DeliveryState, Message, MessageId, Thread,
};

pub(crate) fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub(crate) fn profile(id: &str, name: &str) -> CounterpartProfile {
    CounterpartProfile { id: id.into(), name: name.into(), avatar: None, reg_no: None }
}

pub(crate) fn summary(
    listing: &str,
    user: &str,
    name: &str,
    last: &str,
    t: i64,
) -> ConversationSummary {
    ConversationSummary {
        listing_id: listing.into(),
        listing_title: format!("Listing {listing}"),
        listing_image: None,
        other_user: profile(user, name),
        last_message: last.into(),
        last_message_time: at(t),
        unread_count: 0,
    }
}

pub(crate) fn server_message(
    id: &str,
    listing: &str,
    from: &str,
    to: &str,
    body: &str,
    t: DateTime<Utc>,
) -> Message {
    Message {
        id: MessageId::Server(id.into()),
        listing_id: listing.into(),
        body: body.into(),
        sender_id: from.into(),
        receiver_id: to.into(),
        timestamp: t,
        delivery: DeliveryState::Confirmed,
    }
}

pub(crate) fn thread(counterpart: &str, messages: Vec<Message>) -> Thread {
    Thread { messages, counterpart: Some(profile(counterpart, counterpart)) }
}
