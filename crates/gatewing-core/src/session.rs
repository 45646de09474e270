//! Shared per-connection context.
//!
//! A [`Session`] bundles the registry, the backend connector, the
//! frontend sink and the policy filter for one frontend connection. The
//! event translator and the backfill engine each hold an `Arc<Session>`
//! and go through it for every state change, so membership mutations and
//! their frontend emissions stay paired.

use std::sync::Arc;

use tracing::{debug, warn};

use gatewing_bridge::{Bridger, ChannelInfo, UserInfo};

use crate::policy::PolicyFilter;
use crate::registry::{ChannelRef, Registry};
use crate::settings::Settings;
use crate::sink::FrontendSink;

pub struct Session {
    pub registry: Arc<Registry>,
    pub bridger: Arc<dyn Bridger>,
    pub sink: Arc<dyn FrontendSink>,
    pub policy: PolicyFilter,
    pub settings: Arc<dyn Settings>,
}

impl Session {
    /// Assemble a session for a logged-in connection. Registers the
    /// backend protocol's service user, which later announces topic
    /// changes made during resync.
    pub async fn new(
        registry: Arc<Registry>,
        bridger: Arc<dyn Bridger>,
        sink: Arc<dyn FrontendSink>,
        settings: Arc<dyn Settings>,
    ) -> Arc<Self> {
        let policy = PolicyFilter::new(settings.clone(), bridger.protocol());

        registry
            .register_service(bridger.protocol(), "service")
            .await;

        Arc::new(Self {
            registry,
            bridger,
            sink,
            policy,
            settings,
        })
    }

    /// Materialize the ghost for a backend user (no-op when it exists).
    pub async fn ensure_ghost(&self, info: &UserInfo) -> Arc<UserInfo> {
        self.registry.ensure_ghost(info).await
    }

    /// Join one member to a synthetic channel, emitting the frontend
    /// join only when the membership actually changed.
    pub async fn join_member(&self, channel: &ChannelRef, nick: &str) {
        if self.registry.join(&channel.id, nick).await {
            self.sink.join(channel, &[nick.to_string()]).await;
        }
    }

    /// Batch join; the frontend sees a single batched emission covering
    /// only the nicks that were new to the channel.
    pub async fn batch_join_members(&self, channel: &ChannelRef, nicks: &[String]) {
        let added = self.registry.batch_join(&channel.id, nicks).await;
        if !added.is_empty() {
            debug!(channel = %channel.name, count = added.len(), "Batch joining members");
            self.sink.join(channel, &added).await;
        }
    }

    /// Remove a member, emitting the frontend part when it was present.
    pub async fn part_member(&self, channel: &ChannelRef, nick: &str) {
        if self.registry.part(&channel.id, nick).await {
            self.sink.part(channel, nick).await;
        }
    }

    /// Resolve the effective destination channel for a channel message.
    ///
    /// Group channels the principal has not joined yet are joined and
    /// resynced first (the principal only just gained visibility). Any
    /// absent sender is auto-joined, the principal included, so the
    /// frontend never sees a speaker outside the channel. Policy
    /// redirection applies last.
    pub async fn resolve_message_channel(
        &self,
        channel_id: &str,
        channel_type: &str,
        sender: &UserInfo,
    ) -> ChannelRef {
        let channel = self.registry.channel(channel_id).await;

        if channel_type == "group" {
            let me = self.registry.local_nick().await;
            if !self.registry.has_member(channel_id, &me).await {
                self.join_member(&channel, &me).await;
                let name = self.bridger.get_channel_name(channel_id).await;
                self.sync_channel(channel_id, &name).await;
            }
        }

        let sender_nick = if sender.me {
            self.registry.local_nick().await
        } else {
            self.ensure_ghost(sender).await.nick.clone()
        };
        if !self.registry.has_member(channel_id, &sender_nick).await {
            debug!(nick = %sender_nick, channel = %channel.name, "Sender not in channel, joining");
            self.join_member(&channel, &sender_nick).await;
        }

        // Re-read: the resync above may have renamed the channel.
        let channel = self.registry.channel(channel_id).await;
        self.policy.resolve(channel)
    }

    /// Mirror a backend channel's membership and topic into the session.
    ///
    /// A membership lookup failure aborts the resync for this channel
    /// only. The principal is joined when the backend says it is a member
    /// and it is not yet joined locally, unless the channel is excluded;
    /// the topic set is attributed to the protocol's service user.
    pub async fn sync_channel(&self, channel_id: &str, name: &str) {
        let users = match self.bridger.get_channel_users(channel_id).await {
            Ok(users) => users,
            Err(e) => {
                warn!(channel = %channel_id, error = %e, "Cannot fetch channel members, skipping resync");
                return;
            }
        };

        let display = frontend_channel_name(name);
        self.registry.set_channel_name(channel_id, &display).await;
        let channel = self.registry.channel(channel_id).await;

        let mut batch = Vec::new();
        for user in users.iter().filter(|u| !u.me) {
            let ghost = self.ensure_ghost(user).await;
            batch.push(ghost.nick.clone());
        }
        self.batch_join_members(&channel, &batch).await;

        if users.iter().any(|u| u.me) {
            let me = self.registry.local_nick().await;
            if self.registry.has_member(channel_id, &me).await {
                return;
            }
            if self.policy.is_join_excluded(&channel.name) {
                debug!(channel = %channel.name, "Channel excluded, not joining principal");
                return;
            }

            debug!(channel = %channel.name, "Joining principal during resync");
            self.join_member(&channel, &me).await;

            let topic = self.bridger.topic(channel_id).await;
            self.registry.set_topic(channel_id, &topic).await;
            self.sink
                .set_topic(&channel, self.bridger.protocol(), &topic)
                .await;
        }
    }

    /// Frontend display name for a backend channel: prefixed with the
    /// team name when the channel belongs to a foreign team, or always
    /// when `<protocol>.prefixmainteam` is set.
    pub async fn channel_display_name(&self, info: &ChannelInfo) -> String {
        let me = self.bridger.get_me().await;
        let prefix_main = self
            .settings
            .flag(&format!("{}.prefixmainteam", self.bridger.protocol()));

        if info.team_id != me.team_id || prefix_main {
            let team = self.bridger.get_team_name(&info.team_id).await;
            format!("{}/{}", team, info.name)
        } else {
            info.name.clone()
        }
    }
}

/// Channels are frontend-visible with a `#` prefix; reserved channels
/// keep their `&` prefix.
pub fn frontend_channel_name(name: &str) -> String {
    if name.starts_with('#') || name.starts_with('&') {
        name.to_string()
    } else {
        format!("#{name}")
    }
}
