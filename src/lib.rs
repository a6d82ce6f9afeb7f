// ABOUTME: Library root for charm-client: SSH identity and account operations.
// ABOUTME: The `charm` binary in main.rs is a thin shell over `Client`.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod keys;
pub mod output;
pub mod protocol;
pub mod ssh;
pub mod types;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
