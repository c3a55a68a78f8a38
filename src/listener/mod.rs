// src/listener/mod.rs

//! Host-side receiving end of the protocol.
//!
//! One [`ResultsListener`] per watch session. It accepts any number of
//! short-lived connections, decodes one batch per connection, and hands each
//! batch to a single registered callback. A connection that fails to decode
//! is logged and dropped without affecting the others.

pub mod server;

pub use server::{MAX_BATCH_BYTES, MessagesCallback, ResultsListener};
