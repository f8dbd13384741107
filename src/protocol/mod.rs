//! Protocol Module
//!
//! Wire types shared by the HTTP and push channels.
//!
//! # Modules
//!
//! - `message` - Event payloads, inbound `{state, changes}` updates, push frames

mod message;

pub use message::{
    ChangeSet, EventPayload, EventType, InboundMessage, PushFrame, RESERVED_KEYS, ROOT_BODY,
    StateSnapshot,
};
