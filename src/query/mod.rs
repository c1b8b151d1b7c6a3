pub mod types;
pub mod engine;
