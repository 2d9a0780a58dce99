pub mod analytics;
mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod reports;
pub mod repository;
pub mod tracker;
mod utils;

pub use app::App;

// Always expose testing module (integration tests need it)
pub mod testing;
