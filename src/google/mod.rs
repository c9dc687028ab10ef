pub mod gcal;
pub mod gmail;
pub mod oauth;

mod gateway;
pub use gateway::GoogleGateway;
