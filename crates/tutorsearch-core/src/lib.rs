pub mod config;
pub mod error;
pub mod filter;
pub mod traits;
pub mod types;
