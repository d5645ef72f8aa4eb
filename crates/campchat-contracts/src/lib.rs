//! CampChat Contracts - wire types shared by the relay and its clients.
//!
//! This crate provides:
//! - Chat roles and messages as they travel between browser, relay and gateway
//! - The relay request payload and its JSON error body
//! - The camp catalog and the assistant system prompt rendered from it

pub mod catalog;
pub mod message;
pub mod prompt;

pub use catalog::{Camp, CatalogProvider, StaticCatalog};
pub use message::{ChatMessage, ErrorBody, RelayRequest, Role};
pub use prompt::{format_inr, render_system_prompt};
