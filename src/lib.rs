pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod tests;

// Main exports for external use
pub use application::services::ScheduleService;
pub use config::AppConfig;
pub use infrastructure::contracts::{ActiveConnection, Connection, ContractError};
