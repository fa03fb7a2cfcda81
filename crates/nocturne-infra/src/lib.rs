//! Infrastructure layer for Nocturne.
//!
//! Contains implementations of the ports defined in `nocturne-core`: the JSON
//! credential file reader, tokio process spawning, the CLI-backed sleep
//! lookup, the HTTP notification sink, and the local filesystem. Also holds
//! the webhook signature verifier, the TOML config loader, and the
//! heartbeat/watchdog monitor.

pub mod config;
pub mod credentials;
pub mod filesystem;
pub mod lookup;
pub mod monitor;
pub mod notify;
pub mod process;
pub mod signature;
