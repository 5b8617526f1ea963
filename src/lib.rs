pub mod agent;
pub mod config;
pub mod errors;
pub mod jira;
pub mod marker;
pub mod process;
pub mod repo;
pub mod server;
pub mod ticket;
