// Backend contract shared by the gateway core and every backend connector.

pub mod error;
pub mod event;
pub mod types;

use std::collections::HashMap;

use async_trait::async_trait;

pub use error::BridgeError;
pub use event::{
    BridgeEvent, ChannelAddEvent, ChannelCreateEvent, ChannelDeleteEvent, ChannelMessageEvent,
    ChannelRemoveEvent, ChannelTopicEvent, DirectMessageEvent, FileEvent,
};
pub use types::{ChannelInfo, FileInfo, Post, PostKind, UserInfo};

/// Channel through which a connector delivers its [`BridgeEvent`] stream.
///
/// Unbounded and order-preserving; the connector drops the sender on
/// logout/disconnect, which consumers treat as graceful shutdown.
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<BridgeEvent>;
pub type EventSender = tokio::sync::mpsc::UnboundedSender<BridgeEvent>;

/// The capability every backend connector must provide to the gateway.
///
/// All methods are asynchronous and may block the calling task for the
/// duration of a backend round trip. The connector is responsible for its
/// own authentication, pagination and reconnection policy; the gateway
/// core never retries.
#[async_trait]
pub trait Bridger: Send + Sync {
    // -- channels --

    /// Map of channel name to backend channel id.
    async fn list_channels(&self) -> Result<HashMap<String, String>, BridgeError>;

    /// Join a channel by name, returning `(id, name)`.
    async fn join(&self, channel_name: &str) -> Result<(String, String), BridgeError>;

    async fn part(&self, channel_id: &str) -> Result<(), BridgeError>;

    async fn invite(&self, channel_id: &str, username: &str) -> Result<(), BridgeError>;

    async fn kick(&self, channel_id: &str, username: &str) -> Result<(), BridgeError>;

    async fn set_topic(&self, channel_id: &str, text: &str) -> Result<(), BridgeError>;

    /// Current topic, empty string when unset.
    async fn topic(&self, channel_id: &str) -> String;

    /// Refresh the connector's cached channel list.
    async fn update_channels(&self) -> Result<(), BridgeError>;

    /// Cached channel records, including channels the principal can see
    /// but has not joined on the frontend.
    async fn get_channels(&self) -> Vec<ChannelInfo>;

    /// Display name for a channel id, empty string when unknown.
    async fn get_channel_name(&self, channel_id: &str) -> String;

    /// Current members of a channel.
    async fn get_channel_users(&self, channel_id: &str) -> Result<Vec<UserInfo>, BridgeError>;

    // -- users --

    async fn get_users(&self) -> Vec<UserInfo>;

    async fn get_user(&self, user_id: &str) -> Option<UserInfo>;

    /// The logged-in principal.
    async fn get_me(&self) -> UserInfo;

    async fn get_user_by_username(&self, username: &str) -> Option<UserInfo>;

    // -- messaging --

    async fn msg_user(&self, username: &str, text: &str) -> Result<(), BridgeError>;

    async fn msg_channel(&self, channel_id: &str, text: &str) -> Result<(), BridgeError>;

    // -- presence --

    async fn status_user(&self, name: &str) -> Result<String, BridgeError>;

    async fn set_status(&self, status: &str) -> Result<(), BridgeError>;

    // -- identity / lifecycle --

    /// Backend protocol name, used as the settings namespace and as the
    /// nick of the service user that announces topic changes.
    fn protocol(&self) -> &str;

    async fn get_team_name(&self, team_id: &str) -> String;

    async fn logout(&self) -> Result<(), BridgeError>;

    // -- backfill --

    /// Last-viewed timestamp for a channel, epoch milliseconds.
    /// 0 means unknown or deleted; callers skip replay entirely.
    async fn get_last_viewed_at(&self, channel_id: &str) -> i64;

    /// Posts created since `since`, newest first. `None` means the
    /// channel is not accessible (expected for foreign-team channels).
    async fn get_posts_since(&self, channel_id: &str, since: i64) -> Option<Vec<Post>>;

    /// Mark the channel viewed up to now.
    async fn update_last_viewed(&self, channel_id: &str) -> Result<(), BridgeError>;
}
