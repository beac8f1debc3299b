//! palaver-api: chat backend client
//!
//! This crate wraps the chat backend's REST endpoints and implements the
//! two reply delivery strategies: direct chunked streaming and
//! trigger/listen over a push hub.

pub mod client;
pub mod error;
pub mod frame;
pub mod strategies;
pub mod stream;
pub mod types;

pub use client::{ChatsClient, ClientConfig};
pub use error::{Error, Result};
pub use strategies::{ReplyStrategy, StreamMode};
pub use stream::{ReplyEvent, ReplyEventStream};
pub use types::*;
