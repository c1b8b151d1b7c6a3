pub mod error;
pub mod config;
pub mod types;
pub mod repository;
