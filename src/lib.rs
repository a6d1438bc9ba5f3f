//! Conversation linking for the marketplace chat backend: maps a pair of
//! users plus the listing, auction or search request they are talking about
//! to exactly one conversation id, creating the record on first contact.

pub mod api;
pub mod auth;
pub mod config;
pub mod conversation;
pub mod entity;
pub mod error;
pub mod linker;
pub mod store;

pub use auth::{FixedIdentity, IdentityProvider, UserIdentity};
pub use conversation::Conversation;
pub use entity::{EntityKind, EntityRef};
pub use error::LinkError;
pub use linker::ConversationLinker;
pub use store::Store;
