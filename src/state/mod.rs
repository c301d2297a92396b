//! Shared state: the live client registry and the broadcaster.

mod client;
mod registry;

pub use client::{Client, ClientId, ClientInfo};
pub use registry::Registry;
