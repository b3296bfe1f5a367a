pub mod complaints;
pub mod config;
pub mod demographics;
pub mod fetch;
pub mod store;
