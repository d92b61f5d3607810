//! Webhook-driven chat bot: inbound messages are matched against regex
//! triggers and the selected reply is posted back to the chat service.

pub mod audit;
pub mod config;
pub mod dispatch;
pub mod message;
pub mod outbound;
pub mod triggers;
pub mod webhook;
