//! Outbound actions against the frontend connection.
//!
//! The wire encoding is the frontend codec's business; the engine's
//! obligation is to invoke these with correct, policy-resolved arguments.

use async_trait::async_trait;

use gatewing_bridge::UserInfo;

use crate::registry::ChannelRef;

/// The frontend connection as seen by the engine.
#[async_trait]
pub trait FrontendSink: Send + Sync {
    /// Deliver a message to a channel as the named sender.
    async fn message(&self, channel: &ChannelRef, sender_nick: &str, text: &str);

    /// Deliver a notice to a channel as the named sender.
    async fn notice(&self, channel: &ChannelRef, sender_nick: &str, text: &str);

    /// Deliver a private message from `sender` to the named receiver.
    ///
    /// Implementations split multi-line bodies into one emission per
    /// line and drop blank lines, so callers may pass raw bodies.
    async fn private_message(&self, sender: &UserInfo, receiver: &str, text: &str);

    /// Announce a topic change attributed to the named sender.
    async fn set_topic(&self, channel: &ChannelRef, sender_nick: &str, topic: &str);

    /// Show the given nicks joining a channel (batch).
    async fn join(&self, channel: &ChannelRef, nicks: &[String]);

    /// Show a nick leaving a channel.
    async fn part(&self, channel: &ChannelRef, nick: &str);
}
