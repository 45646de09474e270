//! Shared test doubles: a scriptable backend connector and a frontend
//! sink that records every emission.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use gatewing_bridge::{BridgeError, Bridger, ChannelInfo, Post, UserInfo};

use crate::registry::ChannelRef;
use crate::sink::FrontendSink;

pub fn user(nick: &str, id: &str) -> UserInfo {
    UserInfo {
        nick: nick.to_string(),
        user: nick.to_string(),
        host: "backend".to_string(),
        username: id.to_string(),
        ghost: true,
        ..UserInfo::default()
    }
}

pub fn me(nick: &str, id: &str, team_id: &str) -> UserInfo {
    UserInfo {
        nick: nick.to_string(),
        user: nick.to_string(),
        username: id.to_string(),
        team_id: team_id.to_string(),
        me: true,
        ..UserInfo::default()
    }
}

/// Scriptable [`Bridger`] with call counters.
#[derive(Default)]
pub struct MockBridger {
    pub me: UserInfo,
    pub users: Mutex<Vec<UserInfo>>,
    pub channels: Mutex<Vec<ChannelInfo>>,
    pub channel_users: Mutex<HashMap<String, Vec<UserInfo>>>,
    pub channel_names: Mutex<HashMap<String, String>>,
    pub team_names: Mutex<HashMap<String, String>>,
    pub topics: Mutex<HashMap<String, String>>,
    pub last_viewed: Mutex<HashMap<String, i64>>,
    /// Posts per channel, newest first, as the contract specifies.
    pub posts: Mutex<HashMap<String, Vec<Post>>>,

    pub posts_since_calls: AtomicUsize,
    pub update_channels_calls: AtomicUsize,
    pub update_last_viewed_calls: Mutex<Vec<String>>,
}

impl MockBridger {
    pub fn new(me: UserInfo) -> Self {
        Self {
            me,
            ..Self::default()
        }
    }

    pub fn with_channel_users(self, channel_id: &str, users: Vec<UserInfo>) -> Self {
        self.channel_users
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), users);
        self
    }

    pub fn with_channel_name(self, channel_id: &str, name: &str) -> Self {
        self.channel_names
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), name.to_string());
        self
    }

    pub fn with_user(self, info: UserInfo) -> Self {
        self.users.lock().unwrap().push(info);
        self
    }

    pub fn with_backfill_channel(
        self,
        info: ChannelInfo,
        last_viewed: i64,
        posts: Option<Vec<Post>>,
    ) -> Self {
        self.last_viewed
            .lock()
            .unwrap()
            .insert(info.id.clone(), last_viewed);
        if let Some(posts) = posts {
            self.posts.lock().unwrap().insert(info.id.clone(), posts);
        }
        self.channels.lock().unwrap().push(info);
        self
    }
}

#[async_trait]
impl Bridger for MockBridger {
    async fn list_channels(&self) -> Result<HashMap<String, String>, BridgeError> {
        Ok(self
            .channels
            .lock()
            .unwrap()
            .iter()
            .map(|c| (c.name.clone(), c.id.clone()))
            .collect())
    }

    async fn join(&self, channel_name: &str) -> Result<(String, String), BridgeError> {
        Ok((format!("id-{channel_name}"), channel_name.to_string()))
    }

    async fn part(&self, _channel_id: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn invite(&self, _channel_id: &str, _username: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn kick(&self, _channel_id: &str, _username: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn set_topic(&self, channel_id: &str, text: &str) -> Result<(), BridgeError> {
        self.topics
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), text.to_string());
        Ok(())
    }

    async fn topic(&self, channel_id: &str) -> String {
        self.topics
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn update_channels(&self) -> Result<(), BridgeError> {
        self.update_channels_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_channels(&self) -> Vec<ChannelInfo> {
        self.channels.lock().unwrap().clone()
    }

    async fn get_channel_name(&self, channel_id: &str) -> String {
        self.channel_names
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn get_channel_users(&self, channel_id: &str) -> Result<Vec<UserInfo>, BridgeError> {
        self.channel_users
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .ok_or_else(|| BridgeError::ChannelNotAccessible(channel_id.to_string()))
    }

    async fn get_users(&self) -> Vec<UserInfo> {
        self.users.lock().unwrap().clone()
    }

    async fn get_user(&self, user_id: &str) -> Option<UserInfo> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == user_id)
            .cloned()
    }

    async fn get_me(&self) -> UserInfo {
        self.me.clone()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<UserInfo> {
        self.get_user(username).await
    }

    async fn msg_user(&self, _username: &str, _text: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn msg_channel(&self, _channel_id: &str, _text: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn status_user(&self, _name: &str) -> Result<String, BridgeError> {
        Ok("online".to_string())
    }

    async fn set_status(&self, _status: &str) -> Result<(), BridgeError> {
        Ok(())
    }

    fn protocol(&self) -> &str {
        "mattermost"
    }

    async fn get_team_name(&self, team_id: &str) -> String {
        self.team_names
            .lock()
            .unwrap()
            .get(team_id)
            .cloned()
            .unwrap_or_else(|| team_id.to_string())
    }

    async fn logout(&self) -> Result<(), BridgeError> {
        Ok(())
    }

    async fn get_last_viewed_at(&self, channel_id: &str) -> i64 {
        self.last_viewed
            .lock()
            .unwrap()
            .get(channel_id)
            .copied()
            .unwrap_or(0)
    }

    async fn get_posts_since(&self, channel_id: &str, _since: i64) -> Option<Vec<Post>> {
        self.posts_since_calls.fetch_add(1, Ordering::SeqCst);
        self.posts.lock().unwrap().get(channel_id).cloned()
    }

    async fn update_last_viewed(&self, channel_id: &str) -> Result<(), BridgeError> {
        self.update_last_viewed_calls
            .lock()
            .unwrap()
            .push(channel_id.to_string());
        Ok(())
    }
}

/// One recorded frontend emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Message {
        channel_id: String,
        channel_name: String,
        sender: String,
        text: String,
    },
    Notice {
        channel_id: String,
        sender: String,
        text: String,
    },
    Private {
        sender: String,
        receiver: String,
        text: String,
    },
    Topic {
        channel_id: String,
        sender: String,
        topic: String,
    },
    Join {
        channel_id: String,
        nicks: Vec<String>,
    },
    Part {
        channel_id: String,
        nick: String,
    },
}

#[derive(Default)]
pub struct RecordingSink {
    pub emissions: Mutex<Vec<Emission>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn all(&self) -> Vec<Emission> {
        self.emissions.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Emission> {
        self.all()
            .into_iter()
            .filter(|e| matches!(e, Emission::Message { .. }))
            .collect()
    }

    fn record(&self, emission: Emission) {
        self.emissions.lock().unwrap().push(emission);
    }
}

#[async_trait]
impl FrontendSink for RecordingSink {
    async fn message(&self, channel: &ChannelRef, sender_nick: &str, text: &str) {
        self.record(Emission::Message {
            channel_id: channel.id.clone(),
            channel_name: channel.name.clone(),
            sender: sender_nick.to_string(),
            text: text.to_string(),
        });
    }

    async fn notice(&self, channel: &ChannelRef, sender_nick: &str, text: &str) {
        self.record(Emission::Notice {
            channel_id: channel.id.clone(),
            sender: sender_nick.to_string(),
            text: text.to_string(),
        });
    }

    async fn private_message(&self, sender: &UserInfo, receiver: &str, text: &str) {
        // Mirrors real sinks: multi-line bodies split, blanks dropped.
        for line in text.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            self.record(Emission::Private {
                sender: sender.nick.clone(),
                receiver: receiver.to_string(),
                text: line.to_string(),
            });
        }
    }

    async fn set_topic(&self, channel: &ChannelRef, sender_nick: &str, topic: &str) {
        self.record(Emission::Topic {
            channel_id: channel.id.clone(),
            sender: sender_nick.to_string(),
            topic: topic.to_string(),
        });
    }

    async fn join(&self, channel: &ChannelRef, nicks: &[String]) {
        self.record(Emission::Join {
            channel_id: channel.id.clone(),
            nicks: nicks.to_vec(),
        });
    }

    async fn part(&self, channel: &ChannelRef, nick: &str) {
        self.record(Emission::Part {
            channel_id: channel.id.clone(),
            nick: nick.to_string(),
        });
    }
}
