//! # IPC Layer
//!
//! JSON payloads exchanged with the API gateway.

pub mod payloads;

pub use payloads::*;
