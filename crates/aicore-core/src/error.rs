//! Error types for AI-Core

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// An adapter was asked to call its vendor without a credential.
    #[error("{vendor} API key not configured")]
    NotConfigured { vendor: String },

    #[error("Unknown model: {0}. Unable to determine provider.")]
    UnknownModel(String),

    #[error("Provider {0} not initialized")]
    ProviderNotInitialised(String),

    #[error("Provider {0} not configured. Please add API key in settings.")]
    ProviderNotConfigured(String),

    #[error("Provider {0} not found")]
    ProviderNotFound(String),

    /// Non-2xx response. `message` is the vendor's own error text when the
    /// body carried one, otherwise "<Vendor> API request failed".
    #[error("{message}")]
    VendorHttp {
        vendor: String,
        status: u16,
        message: String,
    },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] by triggering condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing credential, raised before any network call
    Configuration,
    /// Model id could not be mapped to a provider
    Resolution,
    /// Vendor answered with a non-success status
    VendorHttp,
    /// Network or decoding failure
    Transport,
    /// Persistence failure
    Storage,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConfigured { .. } | Error::ProviderNotConfigured(_) => {
                ErrorKind::Configuration
            }
            Error::UnknownModel(_)
            | Error::ProviderNotInitialised(_)
            | Error::ProviderNotFound(_) => ErrorKind::Resolution,
            Error::VendorHttp { .. } => ErrorKind::VendorHttp,
            Error::Transport(_) | Error::Serialization(_) => ErrorKind::Transport,
            Error::Storage(_) | Error::Io(_) => ErrorKind::Storage,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
