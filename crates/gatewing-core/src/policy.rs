//! Inclusion/exclusion policy deciding the effective destination channel.
//!
//! Evaluation order: exclusion list first, then inclusion list; first
//! match wins. An absent or empty inclusion list means "allow everything
//! not excluded". Matches are exact string comparisons against the
//! frontend-visible channel name. Redirected traffic lands in the
//! overflow channel.

use std::sync::Arc;

use tracing::debug;

use crate::registry::{ChannelRef, OVERFLOW_CHANNEL, ROSTER_CHANNEL};
use crate::settings::Settings;

/// Policy filter for one backend protocol namespace.
#[derive(Clone)]
pub struct PolicyFilter {
    settings: Arc<dyn Settings>,
    protocol: String,
}

impl PolicyFilter {
    pub fn new(settings: Arc<dyn Settings>, protocol: &str) -> Self {
        Self {
            settings,
            protocol: protocol.to_string(),
        }
    }

    /// Resolve the effective destination for a channel. Pure with respect
    /// to the configured lists: same channel + same lists = same result.
    pub fn resolve(&self, channel: ChannelRef) -> ChannelRef {
        // Reserved channels are a redirection target, never a source.
        if channel.id == OVERFLOW_CHANNEL || channel.id == ROSTER_CHANNEL {
            return channel;
        }

        let exclude = self
            .settings
            .string_list(&format!("{}.joinexclude", self.protocol));
        if exclude.iter().any(|e| e == &channel.name) {
            debug!(channel = %channel.name, "Channel excluded, redirecting to overflow");
            return self.overflow();
        }

        let include = self
            .settings
            .string_list(&format!("{}.joininclude", self.protocol));
        if !include.is_empty() && !include.iter().any(|e| e == &channel.name) {
            debug!(channel = %channel.name, "Channel not included, redirecting to overflow");
            return self.overflow();
        }

        channel
    }

    /// Whether joining this channel name is excluded outright (used by
    /// resync, which skips the join instead of redirecting).
    pub fn is_join_excluded(&self, channel_name: &str) -> bool {
        self.settings
            .string_list(&format!("{}.joinexclude", self.protocol))
            .iter()
            .any(|e| e == channel_name)
    }

    fn overflow(&self) -> ChannelRef {
        ChannelRef {
            id: OVERFLOW_CHANNEL.to_string(),
            name: OVERFLOW_CHANNEL.to_string(),
        }
    }
}
