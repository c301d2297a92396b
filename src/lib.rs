//! scrawld - relay daemon for a shared-canvas drawing and chat application.
//!
//! The relay accepts concurrent client connections, performs the NICK
//! handshake, decodes the brace-framed JSON stream from each client, and
//! fans messages out to every other connected client. All drawing and chat
//! rendering lives in the GUI clients; the relay only moves framed bytes.
//!
//! The crate exposes its modules as a library so integration tests can run
//! the server in-process; the `scrawld` binary is a thin wrapper around
//! [`network::Gateway`].

pub mod config;
pub mod network;
pub mod state;
