//! Shared domain types for Nocturne.
//!
//! This crate contains the domain types used across the service:
//! credentials, webhook payloads, exploration session states, configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, secrecy, thiserror.

pub mod config;
pub mod credentials;
pub mod error;
pub mod session;
pub mod webhook;
