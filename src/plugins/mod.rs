//! Operations built on the core store: publishing and retracting records,
//! client discovery, the bot lifecycle, and administrative cleanup.

pub mod default_team;
pub mod keys;
pub mod lifecycle;
pub mod loader;
pub mod publisher;
pub mod service;
pub mod wipe;
