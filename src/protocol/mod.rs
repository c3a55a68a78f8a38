// src/protocol/mod.rs

//! Wire protocol shared by the runner-side logger and the host-side listener.
//!
//! Each TCP connection carries exactly one JSON array of [`Message`]s. The
//! peer closing its write half is the only framing; there is no length
//! prefix.

pub mod identity;
pub mod message;

pub use identity::{DISPLAY_NAME_PROPERTY, TestCase};
pub use message::{Batch, Message, ResultMessage, TestOutcome, decode_batch, encode_batch};
