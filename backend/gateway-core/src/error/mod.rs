pub mod client;
pub mod config;
pub mod engine;
pub mod server;

pub use client::ClientError;
pub use config::ConfigError;
pub use engine::EngineError;
pub use server::ServerError;
