pub mod config;
pub mod message;
pub mod scheduler;
pub mod session;
