pub mod adapter;
pub mod client;
pub mod model;
pub mod store;
