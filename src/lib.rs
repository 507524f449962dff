pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod scrape;
pub mod services;
pub mod upstream;

pub use config::Config;
pub use error::{AppError, Result};
