//! One-shot post-login synchronization: bulk roster import, per-channel
//! membership mirroring and throttled history replay.
//!
//! The engine runs as a background task fed by a bounded channel queue.
//! A fixed pool of workers processes channels concurrently, but every
//! worker serializes on one shared interval gate before touching the
//! backend, so the aggregate call rate stays bounded regardless of pool
//! width. Failures degrade per channel: log, skip, continue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use gatewing_bridge::{ChannelInfo, Post, PostKind};

use crate::error::CoreError;
use crate::registry::{ChannelRef, OVERFLOW_CHANNEL, ROSTER_CHANNEL};
use crate::session::Session;

/// Nick under which the gateway itself speaks (replay day markers).
pub const GATEWAY_NICK: &str = "gatewing";

/// Delimiter marking direct-message pseudo-channels in backend names.
const DM_CHANNEL_DELIMITER: &str = "__";

#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Fixed worker pool width.
    pub workers: usize,
    /// Bounded depth of the channel work queue; the driver blocks when
    /// full, giving natural backpressure.
    pub queue_depth: usize,
    /// Shared minimum spacing between backend calls across all workers.
    pub throttle: Duration,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_depth: 5,
            throttle: Duration::from_millis(50),
        }
    }
}

/// Where replayed lines for one channel go.
enum ReplayTarget {
    /// Ordinary channel, lines spoken into the synthetic channel.
    Channel(ChannelRef),
    /// Direct-message pseudo-channel, lines spoofed as private messages
    /// from the principal to the speaker's nick, which is how the
    /// frontend threads them into the right conversation window.
    Direct,
}

pub struct BackfillEngine {
    session: Arc<Session>,
    config: BackfillConfig,
}

impl BackfillEngine {
    pub fn new(session: Arc<Session>, config: BackfillConfig) -> Self {
        Self { session, config }
    }

    /// Run the full backfill. Idempotent: duplicate membership joins are
    /// no-ops and replay is bounded by the backend's last-viewed marker.
    pub async fn run(&self) -> Result<(), CoreError> {
        info!("Backfill starting");

        self.populate_roster().await;

        let (tx, rx) = mpsc::channel::<ChannelInfo>(self.config.queue_depth);
        let rx = Arc::new(Mutex::new(rx));

        let mut gate = interval(self.config.throttle);
        gate.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let gate = Arc::new(Mutex::new(gate));

        let mut workers = Vec::with_capacity(self.config.workers);
        for _ in 0..self.config.workers {
            let session = self.session.clone();
            let rx = rx.clone();
            let gate = gate.clone();
            workers.push(tokio::spawn(async move {
                channel_worker(session, rx, gate).await;
            }));
        }

        for channel in self.session.bridger.get_channels().await {
            debug!(channel = %channel.name, id = %channel.id, "Queueing channel for backfill");
            if tx.send(channel).await.is_err() {
                break;
            }
        }
        drop(tx);

        for worker in workers {
            worker
                .await
                .map_err(|e| CoreError::Backfill(e.to_string()))?;
        }

        info!("Backfill complete");
        Ok(())
    }

    /// Mirror every backend user except the principal into the roster
    /// channel, then join the principal to the roster and the overflow
    /// channel.
    async fn populate_roster(&self) {
        let mut batch = Vec::new();
        for user in self.session.bridger.get_users().await {
            if user.me {
                continue;
            }
            let ghost = self.session.ensure_ghost(&user).await;
            batch.push(ghost.nick.clone());
        }

        let roster = self.session.registry.channel(ROSTER_CHANNEL).await;
        self.session.batch_join_members(&roster, &batch).await;

        let me = self.session.registry.local_nick().await;
        self.session.join_member(&roster, &me).await;

        let overflow = self.session.registry.channel(OVERFLOW_CHANNEL).await;
        self.session.join_member(&overflow, &me).await;

        info!(users = batch.len(), "Roster populated");
    }
}

/// Worker loop: pull channels off the shared queue until it closes.
async fn channel_worker(
    session: Arc<Session>,
    rx: Arc<Mutex<mpsc::Receiver<ChannelInfo>>>,
    gate: Arc<Mutex<Interval>>,
) {
    loop {
        let channel = { rx.lock().await.recv().await };
        let Some(channel) = channel else {
            break;
        };

        // One backend call budget per tick, shared across the pool.
        gate.lock().await.tick().await;

        process_channel(&session, &channel).await;
    }
}

/// Materialize one channel and replay its unseen history.
async fn process_channel(session: &Arc<Session>, info: &ChannelInfo) {
    debug!(channel = %info.name, id = %info.id, "Processing channel");

    let target = match resolve_replay_target(session, info).await {
        Some(target) => target,
        None => return,
    };

    let since = session.bridger.get_last_viewed_at(&info.id).await;
    // 0 means unknown or deleted channel: nothing to replay.
    if since == 0 {
        return;
    }

    let Some(posts) = session.bridger.get_posts_since(&info.id, since).await else {
        // Foreign-team channels are expected to be inaccessible.
        let me = session.bridger.get_me().await;
        if info.team_id == me.team_id {
            error!(channel = %info.name, id = %info.id, "History fetch failed for own-team channel");
        }
        return;
    };

    replay_posts(session, &target, &posts).await;

    let autoview_off = session
        .settings
        .flag(&format!("{}.disableautoview", session.bridger.protocol()));
    if !autoview_off {
        if let Err(e) = session.bridger.update_last_viewed(&info.id).await {
            warn!(channel = %info.name, error = %e, "Failed to mark channel viewed");
        }
    }
}

/// Decide how replayed lines are emitted for this channel. DM-style
/// pseudo-channels skip channel materialization entirely; real channels
/// are resynced first.
async fn resolve_replay_target(session: &Arc<Session>, info: &ChannelInfo) -> Option<ReplayTarget> {
    if info.name.contains(DM_CHANNEL_DELIMITER) {
        let user_id = info
            .name
            .split(DM_CHANNEL_DELIMITER)
            .next()
            .unwrap_or_default();
        match session.bridger.get_user(user_id).await {
            Some(peer) => {
                session.ensure_ghost(&peer).await;
            }
            None => debug!(user = %user_id, "Unknown peer in direct-message channel name"),
        }
        return Some(ReplayTarget::Direct);
    }

    let name = session.channel_display_name(info).await;
    session.sync_channel(&info.id, &name).await;
    Some(ReplayTarget::Channel(session.registry.channel(&info.id).await))
}

/// Replay posts oldest-to-newest, dropping join/leave system posts and
/// deleted posts, splitting multi-line bodies, and inserting a day
/// marker before the first line of each new calendar day.
async fn replay_posts(session: &Arc<Session>, target: &ReplayTarget, posts: &[Post]) {
    let mut prev_date = String::new();

    // The backend hands us posts newest first.
    for post in posts.iter().rev() {
        if matches!(post.kind, PostKind::JoinLeave) {
            continue;
        }
        if post.is_deleted() {
            continue;
        }

        let Some(ts) = Utc.timestamp_millis_opt(post.create_at).single() else {
            warn!(create_at = post.create_at, "Post carries invalid timestamp, skipping");
            continue;
        };

        let nick = match session.bridger.get_user(&post.user_id).await {
            Some(user) => user.nick,
            None => post.user_id.clone(),
        };

        for line in post.message.split('\n') {
            let date = ts.format("%Y-%m-%d").to_string();
            if date != prev_date {
                spoof(
                    session,
                    target,
                    GATEWAY_NICK,
                    &format!("Replaying since {date}"),
                )
                .await;
                prev_date = date;
            }

            spoof(
                session,
                target,
                &nick,
                &format!("[{}] {}", ts.format("%H:%M"), line),
            )
            .await;
        }
    }
}

/// Emit one replayed line to the frontend. `spoof_nick` is the nick the
/// line is attributed to; in a channel it speaks the line, in a direct
/// conversation it is the private-message target.
async fn spoof(session: &Arc<Session>, target: &ReplayTarget, spoof_nick: &str, text: &str) {
    match target {
        ReplayTarget::Channel(channel) => {
            session.sink.message(channel, spoof_nick, text).await;
        }
        ReplayTarget::Direct => {
            let mut sender = session.bridger.get_me().await;
            sender.nick = session.registry.local_nick().await;
            session.sink.private_message(&sender, spoof_nick, text).await;
        }
    }
}
