//! Chat with a catalog of expert agents.
//!
//! [`chat::ChatController`] runs request/response turns against a
//! [`gateway::CompletionGateway`], [`render`] turns replies into trusted HTML
//! fragments, and [`db::Database`] keeps agents, conversations and settings.

pub mod agents;
pub mod app;
pub mod chat;
pub mod config;
pub mod db;
pub mod gateway;
pub mod llm;
pub mod render;

#[cfg(test)]
mod test_support;

pub use app::{init_tracing, App, AppError};
