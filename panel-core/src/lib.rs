//! Core library for the WiFi provisioning panel.
//! This crate defines the wire types and the seams (device API, view),
//! the HTTP client for the device-local backend, and the panel controller
//! that drives credential submission, status polling and disconnects.
//!
//! 配网面板核心库：设备 HTTP 接口的数据结构、客户端以及面板控制器。

pub mod client;
pub mod config;
pub mod panel;
pub mod structs;
pub mod traits;

#[cfg(feature = "mock_device")]
pub mod mock_device;

#[cfg(test)]
mod testing;

use thiserror::Error;

// 整个 crate 共用的 Error 和 Result 类型。

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Device answered {path} with HTTP {status}")]
    UnexpectedStatus { path: &'static str, status: u16 },

    #[error("Invalid JSON from device: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid device URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

/// A specialized `Result` type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;
