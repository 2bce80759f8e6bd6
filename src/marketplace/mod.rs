pub mod client;
pub mod config;
pub mod models;

pub use client::{MarketplaceClient, MarketplaceError};
pub use config::MarketplaceConfig;
