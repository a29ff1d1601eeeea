//! # palaver-core
//!
//! Core session and streaming logic for Palaver, a conversational client
//! for generative models.
//!
//! This crate is framework-agnostic: a desktop shell, web server, or TUI
//! drives [`ChatManager`] and renders its read surface. Rendering,
//! file-picking, and the concrete network client stay outside; the client
//! plugs in through the [`client::GenerationClient`] trait.
//!
//! ## Key Concepts
//!
//! - **Session**: one conversation; the session list is ordered newest
//!   first
//! - **In-flight message**: the single streamed reply currently being
//!   merged; one per application at a time
//! - **Conversation context**: the client-held model context, rebuilt
//!   wholesale on startup, new chat, session switch, and model switch

pub mod attachment;
pub mod client;
pub mod history;
pub mod manager;
pub mod merge;
pub mod persistence;
pub mod session;

// Re-export commonly used types
pub use client::{GenerationClient, ResponseFragment};
pub use manager::{ChatError, ChatManager};
pub use persistence::SessionArchive;
pub use session::{ChatSession, Message, Role, SessionId};
