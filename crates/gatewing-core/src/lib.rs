// Session synchronization and event translation between a frontend chat
// protocol and an event-sourced team-chat backend.

pub mod backfill;
pub mod error;
pub mod policy;
pub mod registry;
pub mod session;
pub mod settings;
pub mod sink;
pub mod translator;

#[cfg(test)]
mod testutil;

pub use backfill::{BackfillConfig, BackfillEngine, GATEWAY_NICK};
pub use error::CoreError;
pub use policy::PolicyFilter;
pub use registry::{ChannelRef, Registry, OVERFLOW_CHANNEL, ROSTER_CHANNEL};
pub use session::{frontend_channel_name, Session};
pub use settings::{is_allowed_server, Settings, StaticSettings};
pub use sink::FrontendSink;
pub use translator::{EventTranslator, SYSTEM_NICK};
