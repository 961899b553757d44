//! Error types for the Proctor service binary.
//!
//! [`ServiceError`] is the top-level error type that wraps all possible
//! failure modes during startup and shutdown.

/// Top-level error for the service binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// Redis connection failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: proctor_core::ports::StoreError,
    },

    /// NATS connection or subscription failed.
    #[error("bus error: {source}")]
    Bus {
        /// The underlying bus error.
        #[from]
        source: proctor_core::ports::BusError,
    },

    /// Gateway server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: proctor_gateway::server::ServerError,
    },
}
