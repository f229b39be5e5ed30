// src/core/mod.rs
pub mod classifier;
pub mod detector;
pub mod error;
pub mod monitor;
pub mod store;
pub mod types;
