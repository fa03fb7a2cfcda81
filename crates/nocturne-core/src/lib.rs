//! Business logic and port trait definitions for Nocturne.
//!
//! This crate defines the "ports" (credential store, sleep lookup, task
//! spawner, notification sink, filesystem) that the infrastructure layer
//! implements, and the dispatch and notification logic built on them. It
//! depends only on `nocturne-types` -- never on `nocturne-infra` or any
//! HTTP/process crate.

pub mod credentials;
pub mod dispatch;
pub mod fs;
pub mod lookup;
pub mod notify;
pub mod task;
