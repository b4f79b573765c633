// src/lib.rs
pub mod api;
pub mod banner;
pub mod compile;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod stats;
pub mod token_refresh;
