//! A blocking DNS client over UDP and TCP.
//!
//! A [`Client`] sends a single question to one server through a
//! [`Resolver`] and checks that the response answers it.

mod client;
mod config;
mod error;
pub mod resolver;

pub use client::Client;
pub use config::{ClientConfig, Transport, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use error::ResolveError;
pub use resolver::{NullResolver, Resolver, TcpResolver, UdpResolver};

pub type Result<T> = std::result::Result<T, ResolveError>;
