//! palaver-engine: conversation loop for the chat widget
//!
//! This crate drives one conversation against a reply strategy from
//! `palaver-api`, pushing every visible effect through the host-supplied
//! [`Presenter`] boundary.

pub mod conversation;
pub mod engine;
pub mod handle;
pub mod labels;
pub mod presenter;

pub use conversation::{ConversationState, TranscriptEntry};
pub use engine::{ChatEngine, EngineConfig, LoopState};
pub use handle::EngineHandle;
pub use labels::ChatLabels;
pub use presenter::{MessageIndex, MessageKind, Presenter, Role, SharedPresenter};
