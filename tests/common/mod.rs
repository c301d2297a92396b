//! Shared helpers for integration tests.

// Each test binary uses a different subset of the helpers.
#[allow(dead_code)]
pub mod client;
#[allow(dead_code)]
pub mod server;

pub use client::TestClient;
pub use server::TestServer;
