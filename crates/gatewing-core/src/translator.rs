//! Consumes a backend's event stream and translates each event into
//! registry mutations plus frontend emissions.
//!
//! One translator task runs per frontend connection. It terminates when
//! the event channel closes, which is the connector's way of saying the
//! backend session ended; that is a clean shutdown, not a fault.

use std::sync::Arc;

use tracing::{debug, info, warn};

use gatewing_bridge::{
    BridgeEvent, ChannelAddEvent, ChannelCreateEvent, ChannelDeleteEvent, ChannelMessageEvent,
    ChannelRemoveEvent, ChannelTopicEvent, DirectMessageEvent, EventReceiver, FileEvent, UserInfo,
};

use crate::session::Session;

/// Sender nick used for attributing system-originated notices.
pub const SYSTEM_NICK: &str = "system";

pub struct EventTranslator {
    session: Arc<Session>,
}

impl EventTranslator {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Drive the translation loop until the event channel closes.
    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            debug!(event = ?event, "Received bridge event");

            match event {
                BridgeEvent::ChannelMessage(e) => self.handle_channel_message(e).await,
                BridgeEvent::DirectMessage(e) => self.handle_direct_message(e).await,
                BridgeEvent::ChannelTopic(e) => self.handle_channel_topic(e).await,
                BridgeEvent::ChannelAdd(e) => self.handle_channel_add(e).await,
                BridgeEvent::ChannelRemove(e) => self.handle_channel_remove(e).await,
                BridgeEvent::ChannelCreate(e) => self.handle_channel_create(e).await,
                BridgeEvent::ChannelDelete(e) => self.handle_channel_delete(e).await,
                BridgeEvent::FileShare(e) => self.handle_file_share(e).await,
                // Unknown variants from newer connectors are ignored.
                other => {
                    debug!(event = ?other, "Ignoring unhandled bridge event");
                }
            }
        }

        info!("Event stream closed, translator shutting down");
    }

    async fn handle_channel_message(&self, event: ChannelMessageEvent) {
        let channel = self
            .session
            .resolve_message_channel(&event.channel_id, &event.channel_type, &event.sender)
            .await;

        // The principal's own echoes carry its *current* frontend nick,
        // not the nick captured when the backend recorded the message.
        let sender_nick = if event.sender.me {
            self.session.registry.local_nick().await
        } else {
            event.sender.nick.clone()
        };

        match event.message_type.as_str() {
            "notice" => {
                self.session
                    .sink
                    .notice(&channel, &sender_nick, &event.text)
                    .await
            }
            _ => {
                self.session
                    .sink
                    .message(&channel, &sender_nick, &event.text)
                    .await
            }
        }
    }

    async fn handle_direct_message(&self, event: DirectMessageEvent) {
        let sender = self.resolve_dm_sender(&event.sender).await;
        self.session
            .sink
            .private_message(&sender, &event.receiver, &event.text)
            .await;
    }

    async fn handle_channel_topic(&self, event: ChannelTopicEvent) {
        // The topic setter may be unknown to the session; fall back to a
        // system attribution and proceed.
        let sender_nick = match self.session.registry.ghost_by_nick(&event.sender).await {
            Some(ghost) => ghost.nick.clone(),
            None => SYSTEM_NICK.to_string(),
        };

        let channel = self.session.registry.channel(&event.channel_id).await;
        self.session
            .registry
            .set_topic(&event.channel_id, &event.text)
            .await;
        self.session
            .sink
            .set_topic(&channel, &sender_nick, &event.text)
            .await;
    }

    async fn handle_channel_add(&self, event: ChannelAddEvent) {
        let channel = self.session.registry.channel(&event.channel_id).await;

        for added in &event.added {
            if added.me {
                // The principal just gained visibility into membership;
                // a plain join would leave the mirror incomplete.
                let name = self
                    .session
                    .bridger
                    .get_channel_name(&event.channel_id)
                    .await;
                self.session.sync_channel(&event.channel_id, &name).await;
                continue;
            }

            let ghost = self.session.ensure_ghost(added).await;
            self.session.join_member(&channel, &ghost.nick).await;
            self.session
                .sink
                .notice(
                    &channel,
                    SYSTEM_NICK,
                    &format!("added {} to the channel by {}", added.nick, event.adder.nick),
                )
                .await;
        }
    }

    async fn handle_channel_remove(&self, event: ChannelRemoveEvent) {
        let channel = self.session.registry.channel(&event.channel_id).await;

        for removed in &event.removed {
            if removed.me {
                let me = self.session.registry.local_nick().await;
                self.session.part_member(&channel, &me).await;
                continue;
            }

            let ghost = self.session.ensure_ghost(removed).await;
            self.session.part_member(&channel, &ghost.nick).await;

            let text = match &event.remover {
                Some(remover) => format!(
                    "removed {} from the channel by {}",
                    removed.nick, remover.nick
                ),
                None => format!("removed {} from the channel", removed.nick),
            };
            self.session.sink.notice(&channel, SYSTEM_NICK, &text).await;
        }
    }

    async fn handle_channel_create(&self, event: ChannelCreateEvent) {
        if let Err(e) = self.session.bridger.update_channels().await {
            warn!(error = %e, "Channel list refresh failed after channel create");
        }

        let name = self
            .session
            .bridger
            .get_channel_name(&event.channel_id)
            .await;
        debug!(channel = %name, id = %event.channel_id, "Channel created, joining principal");
        self.session.sync_channel(&event.channel_id, &name).await;
    }

    async fn handle_channel_delete(&self, event: ChannelDeleteEvent) {
        let channel = self.session.registry.channel(&event.channel_id).await;
        let me = self.session.registry.local_nick().await;
        debug!(channel = %channel.name, "Channel deleted, removing principal");
        self.session.part_member(&channel, &me).await;
    }

    async fn handle_file_share(&self, event: FileEvent) {
        if event.channel_type == "D" {
            let sender = self.resolve_dm_sender(&event.sender).await;
            for file in &event.files {
                self.session
                    .sink
                    .private_message(
                        &sender,
                        &event.receiver,
                        &format!("download file -{}", file.name),
                    )
                    .await;
            }
            return;
        }

        let channel = self
            .session
            .resolve_message_channel(&event.channel_id, &event.channel_type, &event.sender)
            .await;
        let sender_nick = if event.sender.me {
            self.session.registry.local_nick().await
        } else {
            event.sender.nick.clone()
        };

        for file in &event.files {
            self.session
                .sink
                .message(
                    &channel,
                    &sender_nick,
                    &format!("download file -{}", file.name),
                )
                .await;
        }
    }

    /// Sender identity for direct-message emission: the principal speaks
    /// under its current frontend nick, everyone else as their ghost.
    async fn resolve_dm_sender(&self, sender: &UserInfo) -> UserInfo {
        if sender.me {
            let mut me = self.session.bridger.get_me().await;
            me.nick = self.session.registry.local_nick().await;
            me
        } else {
            (*self.session.ensure_ghost(sender).await).clone()
        }
    }
}
