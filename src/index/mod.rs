pub mod inverted;
pub mod store;
