pub mod api;
pub mod calendar;
pub mod chat;
pub mod cli;
pub mod core;
pub mod gateway;
pub mod google;
pub mod llm;
