pub mod browser;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod error;
pub mod export;
pub mod models;
pub mod scrape;
pub mod session;
