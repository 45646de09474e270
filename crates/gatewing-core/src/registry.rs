//! Per-connection directory of synthetic frontend entities.
//!
//! The registry is the single shared state between the event translator
//! and the backfill workers. All maps live behind one async mutex so
//! ghost creation is a compare-and-insert: concurrent creators of the
//! same nick converge on one `Arc<UserInfo>` instance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use gatewing_bridge::UserInfo;

/// Reserved channel holding every known backend user after login.
pub const ROSTER_CHANNEL: &str = "&users";
/// Reserved catch-all channel receiving policy-filtered traffic.
pub const OVERFLOW_CHANNEL: &str = "&messages";

/// Snapshot handle to a synthetic channel, safe to pass across tasks.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: String,
    /// Frontend-visible display name.
    pub name: String,
}

#[derive(Debug)]
struct GhostEntry {
    info: Arc<UserInfo>,
    /// IDs of synthetic channels this ghost currently occupies.
    channels: HashSet<String>,
}

#[derive(Debug, Default)]
struct ChannelState {
    name: String,
    topic: String,
    members: HashSet<String>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Ghosts keyed by nick, the identity key.
    ghosts: HashMap<String, GhostEntry>,
    /// Alias map so backend user ids resolve to the same ghost.
    nick_by_user_id: HashMap<String, String>,
    /// Synthetic channels keyed by backend channel id (or a reserved
    /// literal for the roster/overflow channels).
    channels: HashMap<String, ChannelState>,
    /// The principal's *current* frontend nick; may change at any time.
    local_nick: String,
}

/// Session-scoped entity directory. Owned by the connection lifecycle
/// and shared as `Arc<Registry>`; all state is rebuilt on reconnect.
#[derive(Debug)]
pub struct Registry {
    inner: Mutex<Inner>,
}

impl Registry {
    /// Create a registry for a freshly logged-in principal. The reserved
    /// roster and overflow channels exist from the start.
    pub fn new(local_nick: &str) -> Self {
        let mut inner = Inner {
            local_nick: local_nick.to_string(),
            ..Inner::default()
        };

        for reserved in [ROSTER_CHANNEL, OVERFLOW_CHANNEL] {
            inner.channels.insert(
                reserved.to_string(),
                ChannelState {
                    name: reserved.to_string(),
                    ..ChannelState::default()
                },
            );
        }

        Self {
            inner: Mutex::new(inner),
        }
    }

    pub async fn local_nick(&self) -> String {
        self.inner.lock().await.local_nick.clone()
    }

    pub async fn set_local_nick(&self, nick: &str) {
        self.inner.lock().await.local_nick = nick.to_string();
    }

    /// Upsert a ghost for a backend user. Returns the one ghost instance
    /// for that nick; callers racing on the same nick all observe the
    /// same `Arc`. The backend user id is registered as an alias key.
    pub async fn ensure_ghost(&self, info: &UserInfo) -> Arc<UserInfo> {
        let mut inner = self.inner.lock().await;

        if !info.username.is_empty() {
            inner
                .nick_by_user_id
                .entry(info.username.clone())
                .or_insert_with(|| info.nick.clone());
        }

        if let Some(entry) = inner.ghosts.get(&info.nick) {
            return entry.info.clone();
        }

        let ghost = Arc::new(info.clone());
        inner.ghosts.insert(
            info.nick.clone(),
            GhostEntry {
                info: ghost.clone(),
                channels: HashSet::new(),
            },
        );

        ghost
    }

    pub async fn ghost_by_nick(&self, nick: &str) -> Option<Arc<UserInfo>> {
        self.inner
            .lock()
            .await
            .ghosts
            .get(nick)
            .map(|e| e.info.clone())
    }

    pub async fn ghost_by_id(&self, user_id: &str) -> Option<Arc<UserInfo>> {
        let inner = self.inner.lock().await;
        let nick = inner.nick_by_user_id.get(user_id)?;
        inner.ghosts.get(nick).map(|e| e.info.clone())
    }

    /// Look up a synthetic channel, creating it on demand. A channel
    /// created this way starts with its id as display name until
    /// [`set_channel_name`](Self::set_channel_name) is called.
    pub async fn channel(&self, id: &str) -> ChannelRef {
        let mut inner = self.inner.lock().await;
        let state = inner.channels.entry(id.to_string()).or_insert_with(|| {
            ChannelState {
                name: id.to_string(),
                ..ChannelState::default()
            }
        });
        ChannelRef {
            id: id.to_string(),
            name: state.name.clone(),
        }
    }

    pub async fn set_channel_name(&self, id: &str, name: &str) {
        let mut inner = self.inner.lock().await;
        let state = inner
            .channels
            .entry(id.to_string())
            .or_insert_with(ChannelState::default);
        state.name = name.to_string();
    }

    /// Add a member to a channel. Returns false when already present
    /// (duplicate joins are no-ops).
    pub async fn join(&self, channel_id: &str, nick: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let inner = &mut *inner;
        let state = inner
            .channels
            .entry(channel_id.to_string())
            .or_insert_with(|| ChannelState {
                name: channel_id.to_string(),
                ..ChannelState::default()
            });
        let joined = state.members.insert(nick.to_string());
        if joined {
            if let Some(entry) = inner.ghosts.get_mut(nick) {
                entry.channels.insert(channel_id.to_string());
            }
        }
        joined
    }

    /// Batch variant of [`join`](Self::join); returns the nicks that were
    /// actually new to the channel.
    pub async fn batch_join(&self, channel_id: &str, nicks: &[String]) -> Vec<String> {
        let mut added = Vec::new();
        for nick in nicks {
            if self.join(channel_id, nick).await {
                added.push(nick.clone());
            }
        }
        added
    }

    pub async fn part(&self, channel_id: &str, nick: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let inner = &mut *inner;
        let Some(state) = inner.channels.get_mut(channel_id) else {
            return false;
        };
        let removed = state.members.remove(nick);
        if removed {
            if let Some(entry) = inner.ghosts.get_mut(nick) {
                entry.channels.remove(channel_id);
            }
        }
        removed
    }

    pub async fn has_member(&self, channel_id: &str, nick: &str) -> bool {
        self.inner
            .lock()
            .await
            .channels
            .get(channel_id)
            .map(|c| c.members.contains(nick))
            .unwrap_or(false)
    }

    pub async fn members(&self, channel_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .await
            .channels
            .get(channel_id)
            .map(|c| c.members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn set_topic(&self, channel_id: &str, topic: &str) {
        let mut inner = self.inner.lock().await;
        let state = inner
            .channels
            .entry(channel_id.to_string())
            .or_insert_with(|| ChannelState {
                name: channel_id.to_string(),
                ..ChannelState::default()
            });
        state.topic = topic.to_string();
    }

    pub async fn topic(&self, channel_id: &str) -> String {
        self.inner
            .lock()
            .await
            .channels
            .get(channel_id)
            .map(|c| c.topic.clone())
            .unwrap_or_default()
    }

    /// IDs of the synthetic channels a ghost currently occupies.
    pub async fn occupied_channels(&self, nick: &str) -> Vec<String> {
        self.inner
            .lock()
            .await
            .ghosts
            .get(nick)
            .map(|e| e.channels.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Register a service pseudo-user (login service, protocol service).
    pub async fn register_service(&self, nick: &str, what: &str) -> Arc<UserInfo> {
        self.ensure_ghost(&UserInfo {
            nick: nick.to_string(),
            user: nick.to_string(),
            real: what.to_string(),
            host: "service".to_string(),
            ghost: true,
            ..UserInfo::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(nick: &str, id: &str) -> UserInfo {
        UserInfo {
            nick: nick.to_string(),
            username: id.to_string(),
            ghost: true,
            ..UserInfo::default()
        }
    }

    #[tokio::test]
    async fn test_reserved_channels_exist() {
        let registry = Registry::new("alice");
        assert_eq!(registry.channel(ROSTER_CHANNEL).await.name, "&users");
        assert_eq!(registry.channel(OVERFLOW_CHANNEL).await.name, "&messages");
    }

    #[tokio::test]
    async fn test_ghost_upsert_converges_on_one_instance() {
        let registry = Arc::new(Registry::new("alice"));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                registry.ensure_ghost(&user("bob", "uid-bob")).await
            }));
        }

        let first = handles.remove(0).await.unwrap();
        for handle in handles {
            let ghost = handle.await.unwrap();
            assert!(Arc::ptr_eq(&first, &ghost));
        }
    }

    #[tokio::test]
    async fn test_ghost_resolves_by_nick_and_id() {
        let registry = Registry::new("alice");
        let created = registry.ensure_ghost(&user("bob", "uid-bob")).await;

        let by_nick = registry.ghost_by_nick("bob").await.unwrap();
        let by_id = registry.ghost_by_id("uid-bob").await.unwrap();
        assert!(Arc::ptr_eq(&created, &by_nick));
        assert!(Arc::ptr_eq(&created, &by_id));
    }

    #[tokio::test]
    async fn test_duplicate_join_is_noop() {
        let registry = Registry::new("alice");
        registry.ensure_ghost(&user("bob", "uid-bob")).await;

        assert!(registry.join("ch1", "bob").await);
        assert!(!registry.join("ch1", "bob").await);
        assert_eq!(registry.members("ch1").await, vec!["bob".to_string()]);
        assert_eq!(registry.occupied_channels("bob").await, vec!["ch1".to_string()]);

        assert!(registry.part("ch1", "bob").await);
        assert!(!registry.part("ch1", "bob").await);
        assert!(registry.occupied_channels("bob").await.is_empty());
    }

    #[tokio::test]
    async fn test_local_nick_is_mutable() {
        let registry = Registry::new("alice");
        assert_eq!(registry.local_nick().await, "alice");
        registry.set_local_nick("alice_away").await;
        assert_eq!(registry.local_nick().await, "alice_away");
    }
}
