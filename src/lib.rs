pub mod classifier;
pub mod config;
pub mod error;
pub mod pose;
pub mod state;
pub mod transport;
