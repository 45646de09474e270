//! Asynchronous events emitted by a backend connector.
//!
//! One unbounded, order-preserving channel of [`BridgeEvent`] exists per
//! backend connection. Delivery is at-most-once; the connector closes the
//! channel on logout or disconnect, which consumers must treat as a clean
//! shutdown signal.

use serde::{Deserialize, Serialize};

use crate::types::{FileInfo, UserInfo};

/// A message posted to a backend channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelMessageEvent {
    pub text: String,
    pub channel_id: String,
    pub sender: UserInfo,
    /// "notice" renders as a frontend notice, anything else as a message.
    pub message_type: String,
    /// Backend channel kind tag ("group" channels get special handling).
    pub channel_type: String,
    pub files: Vec<FileInfo>,
}

/// A direct (person-to-person) message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectMessageEvent {
    pub text: String,
    pub receiver: String,
    pub sender: UserInfo,
    pub files: Vec<FileInfo>,
}

/// A channel topic change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelTopicEvent {
    pub text: String,
    pub channel_id: String,
    /// Nick of the user who set the topic; may be unknown to the session.
    pub sender: String,
}

/// Users added to a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelAddEvent {
    pub adder: UserInfo,
    pub added: Vec<UserInfo>,
    pub channel_id: String,
}

/// Users removed from a channel. `remover` is absent when the backend
/// does not report who performed the removal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRemoveEvent {
    pub remover: Option<UserInfo>,
    pub removed: Vec<UserInfo>,
    pub channel_id: String,
}

/// A channel was created on the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelCreateEvent {
    pub channel_id: String,
}

/// A channel was deleted on the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelDeleteEvent {
    pub channel_id: String,
}

/// Files were shared in a channel or direct conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEvent {
    pub receiver: String,
    pub sender: UserInfo,
    pub channel_id: String,
    /// "D" for direct-message context.
    pub channel_type: String,
    pub files: Vec<FileInfo>,
}

/// Events sent *from* a backend connector to the translation engine.
///
/// Marked non-exhaustive so connectors can grow new variants without
/// breaking consumers; translators ignore variants they do not know.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum BridgeEvent {
    ChannelMessage(ChannelMessageEvent),
    DirectMessage(DirectMessageEvent),
    ChannelTopic(ChannelTopicEvent),
    ChannelAdd(ChannelAddEvent),
    ChannelRemove(ChannelRemoveEvent),
    ChannelCreate(ChannelCreateEvent),
    ChannelDelete(ChannelDeleteEvent),
    FileShare(FileEvent),
}
