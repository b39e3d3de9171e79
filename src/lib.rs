//! Conversation sync core for the marketplace messaging screen.
//!
//! Keeps the conversation directory, decides which thread is active,
//! loads it, and reconciles optimistically sent messages with what the
//! backend confirms.

pub mod composer;
pub mod config;
pub mod directory;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod models;
pub mod selection;
pub mod session;
pub mod stub;
pub mod thread;

#[cfg(test)]
mod fixtures;

pub use composer::{Composer, PendingSend};
pub use config::{ClientConfig, ServerConfig};
pub use directory::{ConversationDirectory, DirectoryView};
pub use errors::{ConfigError, FetchError, SendError};
pub use gateway::{Gateway, HttpGateway};
pub use models::{
    ConversationKey, ConversationSummary, CounterpartProfile, DeliveryState, Message, MessageId,
    Thread,
};
pub use selection::{SelectionController, SelectionState};
pub use session::MessagingSession;
pub use thread::{ThreadStatus, ThreadStore, ThreadView};
