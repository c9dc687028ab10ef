mod client;

pub use client::{LlmClient, Message, Role};
