pub mod bluetooth;
pub mod config;
pub mod devices;
pub mod display;
pub mod metrics;
pub mod models;
pub mod push;
pub mod reconciler;
pub mod store;
