use routex_core::{ConfigError, RouterError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The route table failed to build; raised before any worker starts.
    #[error("route table rejected: {0}")]
    Routes(#[from] RouterError),

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}
