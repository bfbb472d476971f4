// src/lib.rs

pub mod config;
pub mod error;
pub mod http_server;
pub mod platforms;
pub mod services;

pub use config::BotConfig;
pub use error::Error;
