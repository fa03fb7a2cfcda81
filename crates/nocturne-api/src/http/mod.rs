//! HTTP layer: `/health` and the signed `/webhook` receiver.

pub mod error;
pub mod handlers;
pub mod router;
