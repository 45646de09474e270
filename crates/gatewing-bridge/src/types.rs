use serde::{Deserialize, Serialize};

/// Snapshot of a backend user as seen by the gateway.
///
/// `nick` is the identity key: at most one user per nick exists inside a
/// session. `me` is true only for the logged-in principal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    /// Frontend-visible nickname.
    pub nick: String,
    /// Frontend protocol username.
    pub user: String,
    /// Real name / gecos field.
    pub real: String,
    /// Host label shown in frontend prefixes.
    pub host: String,
    /// Backend role string (admin, member, ...).
    pub roles: String,
    /// Backend display name, may differ from `nick`.
    pub display_name: String,
    /// True for any mirrored (non-local) user.
    pub ghost: bool,
    /// True only for the logged-in principal.
    pub me: bool,
    /// Backend login name.
    pub username: String,
    /// Backend team the user primarily belongs to.
    pub team_id: String,
}

/// Backend channel record.
///
/// `id` is unique within a backend connection; `name` is not guaranteed
/// unique across teams.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelInfo {
    pub name: String,
    pub id: String,
    pub team_id: String,
}

/// Kind tag carried by historical posts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PostKind {
    /// Ordinary user message.
    Regular,
    /// Join/leave system post, skipped during replay.
    JoinLeave,
}

/// A historical backend post, as returned by `get_posts_since`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Backend user id of the author.
    pub user_id: String,
    /// Raw message body, may contain newlines.
    pub message: String,
    /// Creation time, epoch milliseconds.
    pub create_at: i64,
    /// Deletion time, epoch milliseconds. A post is deleted iff
    /// `delete_at > create_at`; 0 means never deleted.
    pub delete_at: i64,
    pub kind: PostKind,
}

impl Post {
    pub fn is_deleted(&self) -> bool {
        self.delete_at > self.create_at
    }
}

/// A shared file attached to a message event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
}
