//! Core modules shared by the bot and client sides.
//!
//! Store access, record schemas, configuration, logging and the fan-out
//! barrier live here; the operations built on them live in `plugins`.

pub mod barrier;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod record;
pub mod store;
